//! Normalized policy model
//!
//! These types hold a policy after parsing: every string-or-list field has
//! already been collapsed into a sorted set, so equality on them is set
//! equality. Statement order is kept as written for diagnostics only.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unordered, de-duplicated collection of policy strings
pub type StringSet = BTreeSet<String>;

/// Condition block: operator -> condition key -> values
pub type ConditionMap = BTreeMap<String, BTreeMap<String, StringSet>>;

/// Effect of a policy statement
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Principal block of a statement
///
/// `Wildcard` is the bare `"*"` form and never equals `Typed({"AWS": {"*"}})`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalSet {
    Wildcard,
    Typed(BTreeMap<String, StringSet>),
}

impl PrincipalSet {
    /// Identifiers for one principal type, if present
    #[must_use]
    pub fn identifiers(&self, principal_type: &str) -> Option<&StringSet> {
        match self {
            Self::Wildcard => None,
            Self::Typed(map) => map.get(principal_type),
        }
    }
}

/// A single normalized policy statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sid: Option<String>,
    pub effect: Effect,
    pub principal: Option<PrincipalSet>,
    pub not_principal: Option<PrincipalSet>,
    pub action: StringSet,
    pub not_action: StringSet,
    pub resource: StringSet,
    pub not_resource: StringSet,
    pub condition: ConditionMap,
}

impl Statement {
    /// Create a statement with the given effect and no other fields set
    #[must_use]
    pub fn new(effect: Effect) -> Self {
        Self {
            sid: None,
            effect,
            principal: None,
            not_principal: None,
            action: StringSet::new(),
            not_action: StringSet::new(),
            resource: StringSet::new(),
            not_resource: StringSet::new(),
            condition: ConditionMap::new(),
        }
    }
}

/// Parsed policy document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    /// Policy language version; empty when the document omits it
    pub version: String,
    pub id: Option<String>,
    pub statements: Vec<Statement>,
}
