//! CLI argument parsing for regwatch

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    Text,
    /// Full report as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "regwatch")]
#[command(version)]
#[command(about = "CI job health reports with variant-aware triage", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate raw job runs into a health report
    Report(ReportArgs),
    /// Convert parsed suite trees into raw job runs (JSON on stdout)
    Ingest(IngestArgs),
    /// Print the canonical triage key of a test under a set of variants
    Canonicalize(CanonicalizeArgs),
    /// Validate an accepted regressions file
    CheckRegressions {
        /// Accepted regressions TOML file
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Raw job runs (JSON)
    #[arg(long, value_name = "FILE")]
    pub runs: PathBuf,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Accepted regressions (TOML)
    #[arg(long, value_name = "FILE")]
    pub regressions: Option<PathBuf>,

    /// Triaged incidents (JSON)
    #[arg(long, value_name = "FILE")]
    pub triage: Option<PathBuf>,

    /// Tracked issues by test (JSON)
    #[arg(long, value_name = "FILE")]
    pub issues: Option<PathBuf>,

    /// Override the release named in the configuration
    #[arg(long)]
    pub release: Option<String>,

    /// Report time (RFC 3339); defaults to the current time
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_timestamp)]
    pub now: Option<DateTime<Utc>>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Ingestion batch (JSON)
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CanonicalizeArgs {
    /// Test identifier
    #[arg(long = "test-id", value_name = "ID")]
    pub test_id: String,

    /// Variant dimensions (e.g. Platform=metal-ipi Variant=fips)
    #[arg(value_name = "DIM=VALUE", value_parser = parse_dimension)]
    pub variants: Vec<(String, String)>,
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", s, e))
}

fn parse_dimension(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((dim, value)) if !dim.trim().is_empty() => {
            Ok((dim.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected DIM=VALUE, got '{}'", s)),
    }
}
