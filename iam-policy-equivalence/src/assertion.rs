//! Checking a live resource policy against an expected template
//!
//! The policy text itself comes from an external collaborator (a wrapper
//! around an API such as S3 `GetBucketPolicy`) behind the `PolicyProvider`
//! trait. The assertion renders the expected template with an explicit
//! `TemplateContext`, compares, and turns a mismatch into an error carrying
//! both documents and the diagnostics.

use std::collections::HashMap;

use crate::comparison::{Comparison, EquivalenceChecker};
use crate::error::{PolicyEquivalenceError, PolicyEquivalenceResult};
use crate::template::TemplateContext;

/// Source of the policy text currently attached to a resource
pub trait PolicyProvider {
    /// Fetch the raw JSON policy attached to `resource_id`
    fn fetch_policy(&self, resource_id: &str) -> PolicyEquivalenceResult<String>;
}

impl<P: PolicyProvider + ?Sized> PolicyProvider for &P {
    fn fetch_policy(&self, resource_id: &str) -> PolicyEquivalenceResult<String> {
        (**self).fetch_policy(resource_id)
    }
}

/// In-memory provider keyed by resource id
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyProvider {
    policies: HashMap<String, String>,
}

impl StaticPolicyProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(mut self, resource_id: impl Into<String>, policy: impl Into<String>) -> Self {
        self.insert(resource_id, policy);
        self
    }

    pub fn insert(&mut self, resource_id: impl Into<String>, policy: impl Into<String>) {
        self.policies.insert(resource_id.into(), policy.into());
    }
}

impl PolicyProvider for StaticPolicyProvider {
    fn fetch_policy(&self, resource_id: &str) -> PolicyEquivalenceResult<String> {
        self.policies.get(resource_id).cloned().ok_or_else(|| {
            PolicyEquivalenceError::provider(format!("no policy attached to {resource_id}"))
        })
    }
}

/// Asserts that a resource's policy is equivalent to an expected template
#[derive(Debug, Clone, Default)]
pub struct PolicyAssertion {
    checker: EquivalenceChecker,
}

impl PolicyAssertion {
    #[must_use]
    pub fn new(checker: EquivalenceChecker) -> Self {
        Self { checker }
    }

    /// Fetch the policy for `resource_id` and compare it to the rendered template
    ///
    /// # Errors
    ///
    /// - `Assertion` when `resource_id` is empty
    /// - whatever error the provider returns, unchanged
    /// - `Template` when the expected template cannot be rendered
    /// - `Parse` when either policy is malformed
    /// - `NotEquivalent` when the policies differ
    pub fn check<P: PolicyProvider + ?Sized>(
        &self,
        provider: &P,
        resource_id: &str,
        expected_template: &str,
        context: &TemplateContext,
    ) -> PolicyEquivalenceResult<Comparison> {
        if resource_id.is_empty() {
            return Err(PolicyEquivalenceError::assertion("no resource ID is set"));
        }

        let actual = provider.fetch_policy(resource_id)?;
        log::trace!("Fetched policy for {resource_id}: {actual}");

        let expected = context.render(expected_template)?;

        let comparison = self.checker.compare_text(&actual, &expected)?;
        match comparison.diagnostics {
            Some(diagnostics) => {
                log::debug!("Policy for {resource_id} is not equivalent to the expected template");
                Err(PolicyEquivalenceError::NotEquivalent {
                    expected,
                    actual,
                    diagnostics,
                })
            }
            None => Ok(comparison),
        }
    }
}
