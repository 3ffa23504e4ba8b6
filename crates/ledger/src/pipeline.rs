//! End-to-end transform: raw filings to wide table.
//!
//! Pure and synchronous; reading pages and writing output belong to the callers.

use crate::builder::{LedgerBuilder, LedgerStats};
use crate::materializer::materialize;
use crate::timeline::merge_histories;
use insider_core::config::LedgerConfig;
use insider_core::{NormalizedFiling, RecordIssue, Result, WideTable};
use insider_ingestion::{NormalizationStats, RawFiling, RecordNormalizer};
use tracing::info;

/// Output of [`transform`].
#[derive(Debug, Clone)]
pub struct Transform {
    /// Forward-filled holdings table.
    pub table: WideTable,
    /// Records skipped in best-effort mode.
    pub issues: Vec<RecordIssue>,
    /// Normalization statistics.
    pub normalization: NormalizationStats,
    /// Ledger build statistics.
    pub ledger: LedgerStats,
}

/// Build the wide table from normalized filings in filing order.
pub fn build_wide_table(filings: &[NormalizedFiling], config: &LedgerConfig) -> Result<WideTable> {
    build(filings, config).map(|(table, _)| table)
}

fn build(filings: &[NormalizedFiling], config: &LedgerConfig) -> Result<(WideTable, LedgerStats)> {
    let mut builder = LedgerBuilder::new(config);
    builder.apply_all(filings)?;
    let ledgers = builder.finish();

    let universe = ledgers.column_universe();
    let periods = merge_histories(ledgers.people());
    let table = materialize(&periods, &universe);

    Ok((table, ledgers.stats().clone()))
}

/// Normalize raw filings and build the wide table.
///
/// Fail-fast mode aborts on the first malformed record. Best-effort mode
/// skips it and lists it in [`Transform::issues`].
pub fn transform(raw: &[RawFiling], config: &LedgerConfig) -> Result<Transform> {
    let mut normalizer = RecordNormalizer::new(config);
    let filings = normalizer.normalize_all(raw)?;
    let (table, ledger) = build(&filings, config)?;

    info!(
        filings = filings.len(),
        rows = table.num_rows(),
        columns = table.num_columns(),
        skipped = normalizer.issues().len(),
        "transform complete"
    );

    Ok(Transform {
        table,
        issues: normalizer.take_issues(),
        normalization: normalizer.stats().clone(),
        ledger,
    })
}
