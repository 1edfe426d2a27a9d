//! This crate provides the core logic for IAM policy equivalence checking:
//! - Policy text parsing and normalization
//! - Statement matching and equivalence decisions
//! - Diagnostics explaining why two policies differ
//! - Expected-policy templating and provider-backed assertions
//!

mod assertion;
mod comparison;
mod error;
mod options;
mod parsing;
mod template;
mod types;

// Re-exports for a small, focused public API
pub use assertion::{PolicyAssertion, PolicyProvider, StaticPolicyProvider};
pub use comparison::{
    policies_are_equivalent, ClosestCandidate, Comparison, Diagnostics, Difference,
    EquivalenceChecker, Side, StatementField,
};
pub use error::{PolicyEquivalenceError, PolicyEquivalenceResult};
pub use options::{EquivalenceOptions, SidMatching};
pub use parsing::{parse_policy, parse_policy_with};
pub use template::{partition_for_region, TemplateContext};
pub use types::{ConditionMap, Effect, PolicyDocument, PrincipalSet, Statement, StringSet};
