//! Report formatting for the compare command

use anyhow::{Context, Result};
use iam_policy_equivalence::Comparison;

/// How a comparison is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json { pretty: bool },
}

impl OutputFormat {
    pub const fn new(json: bool, pretty: bool) -> Self {
        if json {
            Self::Json { pretty }
        } else {
            Self::Text
        }
    }
}

pub fn format_comparison(comparison: &Comparison, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json { pretty: true } => serde_json::to_string_pretty(comparison)
            .context("Failed to serialize comparison to JSON"),
        OutputFormat::Json { pretty: false } => {
            serde_json::to_string(comparison).context("Failed to serialize comparison to JSON")
        }
        OutputFormat::Text => Ok(match &comparison.diagnostics {
            Some(diagnostics) if !comparison.equivalent => diagnostics.to_string(),
            _ => "policies are equivalent".to_string(),
        }),
    }
}

pub fn print_comparison(comparison: &Comparison, format: OutputFormat) -> Result<()> {
    let report = format_comparison(comparison, format)?;
    println!("{report}");
    Ok(())
}
