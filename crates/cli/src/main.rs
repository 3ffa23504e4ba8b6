//! Insider holdings ledger.
//!
//! Rebuilds per-person holdings from downloaded ownership-change filing pages
//! and writes the forward-filled wide table.
//!
//! Usage:
//!   insider-holdings --batch-dir ./cvna_filings --prefix cvna_filings --total 1000 --output people.csv

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Parser, ValueEnum};
use insider_core::config::ErrorMode;
use insider_core::Config;
use insider_export::{write_csv, write_csv_file, write_json, write_json_file};
use insider_ingestion::load_dir;
use insider_ledger::transform;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "insider-holdings")]
#[command(about = "Rebuild insider holdings from filing pages into a wide time-series table")]
struct Args {
    /// Directory containing `{prefix}_{from}_{to}.json` filing pages
    #[arg(long)]
    batch_dir: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page file name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Filings per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Total number of filings expected across all pages
    #[arg(long)]
    total: Option<usize>,

    /// Skip malformed records instead of failing the batch
    #[arg(long)]
    best_effort: bool,

    /// Ignore filings filed at or after this RFC 3339 timestamp
    #[arg(long, value_parser = parse_timestamp)]
    filed_before: Option<DateTime<FixedOffset>>,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,

    /// Output file (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_timestamp(s: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("invalid RFC 3339 timestamp {s:?}: {e}"))
}

/// Resolve the effective configuration: file values, then CLI overrides.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(prefix) = &args.prefix {
        config.ingestion.prefix = prefix.clone();
    }
    if let Some(page_size) = args.page_size {
        config.ingestion.page_size = page_size;
    }
    if args.total.is_some() {
        config.ingestion.expected_total = args.total;
    }
    if args.best_effort {
        config.ledger.error_mode = ErrorMode::BestEffort;
    }
    if args.filed_before.is_some() {
        config.ledger.filed_before = args.filed_before;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;

    let raw = load_dir(&args.batch_dir, &config.ingestion)
        .and_then(|set| set.assemble(config.ingestion.expected_total))
        .with_context(|| format!("loading filing pages from {}", args.batch_dir.display()))?;
    info!(filings = raw.len(), "loaded filings");

    let out = transform(&raw, &config.ledger).context("building holdings ledger")?;
    for issue in &out.issues {
        warn!(
            person = %issue.person,
            period = %issue.period,
            accession = %issue.accession,
            field = %issue.field,
            "record skipped"
        );
    }

    match (&args.output, args.format) {
        (Some(path), Format::Csv) => write_csv_file(&out.table, path, &config.export)?,
        (Some(path), Format::Json) => write_json_file(&out.table, path)?,
        (None, Format::Csv) => write_csv(&out.table, io::stdout().lock(), &config.export)?,
        (None, Format::Json) => write_json(&out.table, io::stdout().lock())?,
    }

    info!(
        rows = out.table.num_rows(),
        columns = out.table.num_columns(),
        skipped = out.issues.len(),
        "done"
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::level_filters::LevelFilter::INFO.into()),
        )
        .init();

    let args = Args::parse();
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::Path;

    fn write_page(dir: &Path, name: &str, filings: serde_json::Value) {
        let body = json!({ "transactions": filings });
        fs::write(dir.join(name), body.to_string()).unwrap();
    }

    fn filing(owner: &str, period: &str, filed_at: &str, shares: serde_json::Value) -> serde_json::Value {
        json!({
            "filedAt": filed_at,
            "periodOfReport": period,
            "reportingOwner": { "name": owner },
            "nonDerivativeTable": { "transactions": [{
                "securityTitle": "Common Stock",
                "ownershipNature": { "directOrIndirectOwnership": "D" },
                "postTransactionAmounts": { "sharesOwnedFollowingTransaction": shares }
            }] }
        })
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["insider-holdings"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_end_to_end_csv() {
        let dir = tempfile::tempdir().unwrap();
        write_page(
            dir.path(),
            "filings_0_2.json",
            json!([
                filing("A", "2021-01-01", "2021-01-04T10:00:00-04:00", json!(100)),
                filing("A", "2021-06-01", "2021-06-03T10:00:00-04:00", json!(150)),
            ]),
        );
        write_page(
            dir.path(),
            "filings_2_4.json",
            json!([filing("B", "2022-01-01", "2022-01-04T10:00:00-04:00", json!(7))]),
        );
        let out = dir.path().join("people.csv");
        let batch_dir = dir.path().to_str().unwrap();
        let out_str = out.to_str().unwrap();

        run(&args(&[
            "--batch-dir", batch_dir, "--page-size", "2", "--total", "4", "--output", out_str,
        ]))
        .unwrap();

        let text = fs::read_to_string(&out).unwrap();
        assert_eq!(
            text,
            "Date,A_personally_owned_Common Stock,B_personally_owned_Common Stock\n\
             2021-01-01,100,0\n\
             2021-06-01,150,0\n\
             2022-01-01,150,7\n"
        );
    }

    #[test]
    fn test_missing_page_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_page(
            dir.path(),
            "filings_0_2.json",
            json!([filing("A", "2021-01-01", "2021-01-04T10:00:00-04:00", json!(100))]),
        );
        let batch_dir = dir.path().to_str().unwrap();

        let err = run(&args(&["--batch-dir", batch_dir, "--page-size", "2", "--total", "4"]))
            .unwrap_err();
        let root = err.root_cause().to_string();
        assert!(root.contains("2..4"), "unexpected error: {root}");
    }

    #[test]
    fn test_best_effort_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(
            &config_path,
            json!({ "ingestion": { "prefix": "cvna", "page_size": 10 } }).to_string(),
        )
        .unwrap();
        let batch_dir = dir.path().to_str().unwrap();
        let config_str = config_path.to_str().unwrap();

        let config = resolve_config(&args(&[
            "--batch-dir", batch_dir, "--config", config_str, "--best-effort",
            "--filed-before", "2022-07-03T18:37:53-04:00",
        ]))
        .unwrap();
        assert_eq!(config.ingestion.prefix, "cvna");
        assert_eq!(config.ingestion.page_size, 10);
        assert_eq!(config.ledger.error_mode, ErrorMode::BestEffort);
        assert!(config.ledger.filed_before.is_some());
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        let parsed = Args::try_parse_from(["insider-holdings", "--batch-dir", ".", "--filed-before", "yesterday"]);
        assert!(parsed.is_err());
    }
}
