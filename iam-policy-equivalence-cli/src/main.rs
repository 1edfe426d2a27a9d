//! IAM Policy Equivalence CLI
//!
//! This is the main entry point for the iam-policy-equivalence command-line tool.
//!
//! # Exit Codes
//!
//! - `ExitCode::Equivalent` (0): The policies are equivalent
//! - `ExitCode::NotEquivalent` (1): The policies were compared and differ
//! - `ExitCode::Error` (2): I/O, parse, template or usage error
//!
//! See `types::ExitCode` for the enum definition.

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use iam_policy_equivalence::SidMatching;

mod commands;
mod output;
mod types;

use commands::{parse_key_val, CompareConfig, PolicySource, TemplateArgs};
use output::OutputFormat;
use types::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "iam-policy-equivalence",
    author,
    version,
    about = "Check whether two IAM policy documents are semantically equivalent",
    long_about = "Compares IAM policy documents while ignoring key order, list order, \
whitespace and single-value versus list representation. Statements are paired one to one; \
any statement without an equivalent counterpart is reported with its closest candidate.\n\n\
iam-policy-equivalence compare expected.json actual.json\n  \
aws s3api get-bucket-policy --bucket my-bucket --query Policy --output text | \
iam-policy-equivalence compare - expected.json --render-right --region us-west-2 \
--account 123456789012 --var BucketName=my-bucket"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare two policy documents
    #[command(
        long_about = "Compares LEFT and RIGHT and prints either a confirmation or the list of \
differences. Exits with 0 when the policies are equivalent, 1 when they differ and 2 on error."
    )]
    Compare {
        /// Left policy file, or `-` for stdin
        left: PathBuf,

        /// Right policy file, or `-` for stdin
        right: PathBuf,

        /// Treat an absent Sid and an empty Sid as different
        #[arg(long = "strict-sid", conflicts_with = "ignore_sid")]
        strict_sid: bool,

        /// Ignore Sid values entirely when pairing statements
        #[arg(long = "ignore-sid")]
        ignore_sid: bool,

        /// Compare `arn:<partition>:iam::<account>:root` and bare account ids literally
        #[arg(long = "no-account-normalization")]
        no_account_normalization: bool,

        /// Render RIGHT as a template, substituting ${Partition}, ${Region}, ${Account} and --var values
        #[arg(long = "render-right")]
        render_right: bool,

        /// Partition for ${Partition}; derived from --region when omitted
        #[arg(long = "partition")]
        partition: Option<String>,

        /// Region for ${Region}
        #[arg(long = "region")]
        region: Option<String>,

        /// Account id for ${Account}
        #[arg(long = "account")]
        account: Option<String>,

        /// Additional template variable, may be repeated
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        variables: Vec<(String, String)>,

        /// Print the comparison as JSON
        #[arg(long = "json")]
        json: bool,

        /// Format JSON output with indentation for readability
        #[arg(short = 'p', long = "pretty", requires = "json")]
        pretty: bool,

        /// Enable debug logging output to stderr
        #[arg(short = 'd', long = "debug")]
        debug: bool,
    },
}

/// Initialize logging based on configuration
fn init_logging(debug: bool) -> Result<()> {
    // Default: only ERROR messages; RUST_LOG overrides, --debug overrides both
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Error);
    builder.parse_default_env();
    if debug {
        builder.filter_level(log::LevelFilter::Trace);
    }

    builder
        .format_target(false)
        .format_timestamp_secs()
        .try_init()?;

    Ok(())
}

const fn sid_matching(strict_sid: bool, ignore_sid: bool) -> SidMatching {
    if strict_sid {
        SidMatching::Strict
    } else if ignore_sid {
        SidMatching::Ignore
    } else {
        SidMatching::AbsentEqualsEmpty
    }
}

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Compare {
            left,
            right,
            strict_sid,
            ignore_sid,
            no_account_normalization,
            render_right,
            partition,
            region,
            account,
            variables,
            json,
            pretty,
            debug,
        } => {
            if let Err(e) = init_logging(debug) {
                eprintln!("iam-policy-equivalence: Failed to initialize logging: {e}");
                process::exit(ExitCode::Error.into());
            }

            let config = CompareConfig {
                left: PolicySource::from_arg(left),
                right: PolicySource::from_arg(right),
                sid: sid_matching(strict_sid, ignore_sid),
                normalize_account_principals: !no_account_normalization,
                render_right,
                template: TemplateArgs {
                    partition,
                    region,
                    account,
                    variables,
                },
                format: OutputFormat::new(json, pretty),
            };

            match commands::compare(config) {
                Ok(equivalent) => ExitCode::from_verdict(equivalent),
                Err(e) => {
                    print_cli_command_error(&e);
                    ExitCode::Error
                }
            }
        }
    };

    process::exit(code.into());
}

fn print_cli_command_error(e: &anyhow::Error) {
    eprintln!("Error: {e}");
    let mut source = e.source();
    while let Some(err) = source {
        eprintln!("  Caused by: {err}");
        source = err.source();
    }
}
