//! CLI-specific type definitions.
//!
//! This module contains types that are specific to the CLI binary and should
//! not be part of the core library.

/// Exit codes for the CLI application.
///
/// - 0 the policies are equivalent
/// - 1 the policies are not equivalent
/// - 2 the comparison could not be carried out (I/O, parse, template or usage error)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Policies are equivalent
    Equivalent,

    /// Policies were compared and differ
    NotEquivalent,

    /// Error before a verdict could be reached
    Error,
}

impl ExitCode {
    /// Convert to the integer exit code for `process::exit()`
    pub const fn code(self) -> i32 {
        match self {
            Self::Equivalent => 0,
            Self::NotEquivalent => 1,
            Self::Error => 2,
        }
    }

    pub const fn from_verdict(equivalent: bool) -> Self {
        if equivalent {
            Self::Equivalent
        } else {
            Self::NotEquivalent
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(exit_code: ExitCode) -> Self {
        exit_code.code()
    }
}
