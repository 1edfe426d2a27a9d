//! Error types for IAM policy equivalence

use crate::comparison::Diagnostics;
use thiserror::Error;

/// Main error type for policy equivalence operations
#[derive(Error, Debug)]
pub enum PolicyEquivalenceError {
    #[error("Policy parsing failed: {0}")]
    Parse(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Policy provider error: {0}")]
    Provider(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Non-equivalent policy error:\n\nexpected: {expected}\n\n     got: {actual}\n\n{diagnostics}")]
    NotEquivalent {
        expected: String,
        actual: String,
        diagnostics: Diagnostics,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type PolicyEquivalenceResult<T> = Result<T, PolicyEquivalenceError>;

impl PolicyEquivalenceError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }
}
