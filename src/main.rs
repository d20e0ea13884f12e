use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use regwatch::cli::{CanonicalizeArgs, Cli, Command, IngestArgs, OutputFormat, ReportArgs};
use regwatch::config::AppConfig;
use regwatch::ingest::{ingest_batch, IngestBatch};
use regwatch::issues::StaticIssueIndex;
use regwatch::model::RawData;
use regwatch::regression::IntentionalRegressionRegistry;
use regwatch::report::{render_text, Aggregator};
use regwatch::triage::TriageRegistry;
use regwatch::variant::{canonicalize, PatternClassifier, VariantSet};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` raises everything to TRACE
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {}", what, path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} file: {}", what, path.display()))
}

fn run_report(args: ReportArgs) -> Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;
    let release = args.release.unwrap_or(config.release);
    let raw: RawData = read_json(&args.runs, "job runs")?;

    let classifier =
        PatternClassifier::new(&config.classifier).context("Invalid [classifier] section")?;
    let triage = match &args.triage {
        Some(path) => TriageRegistry::from_json(path)?,
        None => TriageRegistry::new(),
    };
    let intentional = match &args.regressions {
        Some(path) => IntentionalRegressionRegistry::from_toml(path)?,
        None => IntentionalRegressionRegistry::empty(),
    };
    let issues = match &args.issues {
        Some(path) => StaticIssueIndex::from_json(path)?,
        None => StaticIssueIndex::new(),
    };

    let aggregator = Aggregator {
        release: &release,
        config: &config.report,
        classifier: &classifier,
        triage: &triage,
        intentional: &intentional,
        issues: &issues,
    };
    let report = aggregator
        .aggregate(&raw, args.now.unwrap_or_else(Utc::now))
        .with_context(|| format!("Failed to build report from {}", args.runs.display()))?;

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn run_ingest(args: IngestArgs) -> Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;
    let batch: IngestBatch = read_json(&args.input, "ingestion batch")?;
    let classifier =
        PatternClassifier::new(&config.classifier).context("Invalid [classifier] section")?;

    let raw = ingest_batch(&batch, &config.release, &config.ingest, &classifier)
        .with_context(|| format!("Failed to ingest {}", args.input.display()))?;
    println!("{}", serde_json::to_string_pretty(&raw)?);
    Ok(())
}

fn run_canonicalize(args: CanonicalizeArgs) -> Result<()> {
    let variants: VariantSet = args.variants.into_iter().collect();
    println!("{}", canonicalize(&args.test_id, &variants));
    Ok(())
}

fn run_check_regressions(path: &Path) -> Result<()> {
    let registry = IntentionalRegressionRegistry::from_toml(path)?;
    println!(
        "{}: {} accepted regressions across {} releases",
        path.display(),
        registry.len(),
        registry.releases().count()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.debug);

    match cli.command {
        Command::Report(args) => run_report(args),
        Command::Ingest(args) => run_ingest(args),
        Command::Canonicalize(args) => run_canonicalize(args),
        Command::CheckRegressions { path } => run_check_regressions(&path),
    }
}
