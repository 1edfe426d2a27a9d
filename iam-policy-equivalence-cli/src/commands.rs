//! Compare command implementation

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use iam_policy_equivalence::{
    partition_for_region, EquivalenceChecker, EquivalenceOptions, SidMatching, TemplateContext,
};
use log::{debug, info};

use crate::output::{print_comparison, OutputFormat};

/// Where a policy document is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    Stdin,
    File(PathBuf),
}

impl PolicySource {
    /// `-` selects stdin, anything else is a file path
    pub fn from_arg(path: PathBuf) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(path)
        }
    }

    fn read(&self) -> Result<String> {
        match self {
            Self::Stdin => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read policy from stdin")?;
                Ok(buffer)
            }
            Self::File(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read policy file: {}", path.display())),
        }
    }

    fn validate(&self) -> Result<()> {
        if let Self::File(path) = self {
            if !path.exists() {
                anyhow::bail!("Policy file does not exist: {}", path.display());
            }
            if !path.is_file() {
                anyhow::bail!("Path is not a file: {}", path.display());
            }
        }
        Ok(())
    }
}

/// Template values supplied on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateArgs {
    pub partition: Option<String>,
    pub region: Option<String>,
    pub account: Option<String>,
    pub variables: Vec<(String, String)>,
}

impl TemplateArgs {
    fn is_empty(&self) -> bool {
        self.partition.is_none()
            && self.region.is_none()
            && self.account.is_none()
            && self.variables.is_empty()
    }

    /// An explicit partition wins over the one derived from the region
    pub fn into_context(self) -> TemplateContext {
        let mut context = TemplateContext::default();
        if let Some(region) = self.region {
            context.partition = partition_for_region(&region).to_string();
            context.region = Some(region);
        }
        if let Some(partition) = self.partition {
            context = context.with_partition(partition);
        }
        if let Some(account) = self.account {
            context = context.with_account(account);
        }
        for (name, value) in self.variables {
            context = context.with_variable(name, value);
        }
        context
    }
}

/// Validated configuration for the compare command
#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub left: PolicySource,
    pub right: PolicySource,
    pub sid: SidMatching,
    pub normalize_account_principals: bool,
    /// Render RIGHT as a template before comparing
    pub render_right: bool,
    pub template: TemplateArgs,
    pub format: OutputFormat,
}

impl CompareConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.left == PolicySource::Stdin && self.right == PolicySource::Stdin {
            anyhow::bail!("Only one of LEFT and RIGHT can be read from stdin");
        }
        if !self.render_right && !self.template.is_empty() {
            anyhow::bail!(
                "--partition, --region, --account and --var require --render-right"
            );
        }
        self.left.validate()?;
        self.right.validate()
    }

    fn options(&self) -> EquivalenceOptions {
        EquivalenceOptions::default()
            .with_sid_matching(self.sid)
            .with_account_normalization(self.normalize_account_principals)
    }
}

/// Parse a `KEY=VALUE` template variable
pub fn parse_key_val(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some(("", _)) => Err(format!("invalid KEY=VALUE: empty key in `{arg}`")),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("invalid KEY=VALUE: no `=` found in `{arg}`")),
    }
}

/// Run the compare command; returns whether the policies are equivalent
pub fn compare(config: CompareConfig) -> Result<bool> {
    info!("Running compare command");
    config.validate().context("Invalid compare configuration")?;

    let left = config.left.read()?;
    let mut right = config.right.read()?;
    debug!(
        "Read policies: left {} bytes, right {} bytes",
        left.len(),
        right.len()
    );

    if config.render_right {
        let context = config.template.clone().into_context();
        right = context
            .render(&right)
            .with_context(|| format!("Failed to render {}", describe(&config.right)))?;
    }

    let checker = EquivalenceChecker::new(config.options());
    let comparison = checker
        .compare_text(&left, &right)
        .context("Failed to compare policies")?;

    print_comparison(&comparison, config.format)?;
    Ok(comparison.equivalent)
}

fn describe(source: &PolicySource) -> String {
    match source {
        PolicySource::Stdin => "policy template from stdin".to_string(),
        PolicySource::File(path) => format!("policy template {}", path.display()),
    }
}
