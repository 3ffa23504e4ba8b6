//! Record normalization.
//!
//! Turns raw filings into [`NormalizedFiling`]s: resolves the ownership
//! nature, extracts the share count following each transaction, and applies
//! the configured malformed-record policy.

use crate::wire::{RawFiling, RawTable, RawTransaction};
use chrono::{DateTime, FixedOffset};
use insider_core::config::{ErrorMode, LedgerConfig};
use insider_core::{
    Error, NormalizedFiling, OwnershipCategory, OwnershipNature, RecordIssue, ReportPeriod,
    Result, Shares, TransactionRecord,
};
use serde_json::Value;
use tracing::{debug, warn};

const UNKNOWN: &str = "<unknown>";

/// Statistics about normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    /// Filings seen.
    pub filings_seen: u64,
    /// Filings returned.
    pub filings_normalized: u64,
    /// Filings dropped by the `filed_before` cutoff.
    pub filings_after_cutoff: u64,
    /// Filings dropped as malformed (best-effort only).
    pub filings_skipped: u64,
    /// Direct-holding records returned.
    pub direct_records: u64,
    /// Derivative-holding records returned.
    pub derivative_records: u64,
    /// Entries dropped as malformed (best-effort only).
    pub records_skipped: u64,
}

impl NormalizationStats {
    /// Total records returned.
    pub fn total_records(&self) -> u64 {
        self.direct_records + self.derivative_records
    }

    /// Reset statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Filing-level context carried into entry errors.
struct FilingContext<'a> {
    owner: &'a str,
    period: &'a str,
    accession: &'a str,
}

/// Record normalizer applying the malformed-record policy.
pub struct RecordNormalizer {
    /// Malformed record policy.
    mode: ErrorMode,
    /// Reject periods that are not real calendar dates.
    strict_calendar_dates: bool,
    /// Filing cutoff.
    filed_before: Option<DateTime<FixedOffset>>,
    /// Issues collected in best-effort mode.
    issues: Vec<RecordIssue>,
    /// Normalization statistics.
    stats: NormalizationStats,
}

impl RecordNormalizer {
    /// Create a normalizer from the ledger configuration.
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            mode: config.error_mode,
            strict_calendar_dates: config.strict_calendar_dates,
            filed_before: config.filed_before,
            issues: Vec::new(),
            stats: NormalizationStats::default(),
        }
    }

    /// Normalize one filing.
    ///
    /// Returns `Ok(None)` when the filing is dropped, either by the cutoff or
    /// because it is malformed in best-effort mode.
    pub fn normalize(&mut self, raw: &RawFiling) -> Result<Option<NormalizedFiling>> {
        self.stats.filings_seen += 1;

        match self.normalize_inner(raw) {
            Ok(Some(filing)) => {
                self.stats.filings_normalized += 1;
                Ok(Some(filing))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                self.absorb(err, None)?;
                self.stats.filings_skipped += 1;
                Ok(None)
            }
        }
    }

    /// Normalize a sequence of filings, preserving order.
    pub fn normalize_all<'a>(
        &mut self,
        raws: impl IntoIterator<Item = &'a RawFiling>,
    ) -> Result<Vec<NormalizedFiling>> {
        let mut out = Vec::new();
        for raw in raws {
            if let Some(filing) = self.normalize(raw)? {
                out.push(filing);
            }
        }
        Ok(out)
    }

    /// Get normalization statistics.
    pub fn stats(&self) -> &NormalizationStats {
        &self.stats
    }

    /// Issues collected so far (best-effort mode).
    pub fn issues(&self) -> &[RecordIssue] {
        &self.issues
    }

    /// Take the collected issues, leaving the list empty.
    pub fn take_issues(&mut self) -> Vec<RecordIssue> {
        std::mem::take(&mut self.issues)
    }

    fn normalize_inner(&mut self, raw: &RawFiling) -> Result<Option<NormalizedFiling>> {
        let accession = raw.accession_no.as_deref().unwrap_or(UNKNOWN);
        let owner_hint = raw
            .reporting_owner
            .as_ref()
            .and_then(|o| o.name.as_deref())
            .unwrap_or(UNKNOWN);
        let period_hint = raw.period_of_report.as_deref().unwrap_or(UNKNOWN);

        let filed_at = match raw.filed_at.as_deref() {
            Some(text) => Some(
                DateTime::parse_from_rfc3339(text.trim())
                    .map_err(|_| Error::malformed(owner_hint, period_hint, accession, "filedAt"))?,
            ),
            None => None,
        };

        if let (Some(cutoff), Some(ts)) = (self.filed_before, filed_at) {
            if ts >= cutoff {
                debug!(accession, filed_at = %ts, "filing after cutoff, dropped");
                self.stats.filings_after_cutoff += 1;
                return Ok(None);
            }
        }

        let owner = non_empty(raw.reporting_owner.as_ref().and_then(|o| o.name.as_deref()))
            .ok_or_else(|| Error::malformed(UNKNOWN, period_hint, accession, "reportingOwner.name"))?;

        let period_label = non_empty(raw.period_of_report.as_deref())
            .ok_or_else(|| Error::malformed(owner, UNKNOWN, accession, "periodOfReport"))?;
        let period = ReportPeriod::parse(period_label)
            .map_err(|_| Error::malformed(owner, period_label, accession, "periodOfReport"))?;
        if self.strict_calendar_dates && period.to_naive_date().is_none() {
            return Err(Error::malformed(owner, period_label, accession, "periodOfReport"));
        }

        let ctx = FilingContext {
            owner,
            period: period_label,
            accession,
        };

        let mut records = Vec::new();
        self.normalize_table(
            &ctx,
            period,
            raw.non_derivative_table.as_ref(),
            OwnershipCategory::DirectHolding,
            &mut records,
        )?;
        self.normalize_table(
            &ctx,
            period,
            raw.derivative_table.as_ref(),
            OwnershipCategory::DerivativeHolding,
            &mut records,
        )?;

        Ok(Some(NormalizedFiling {
            owner: owner.to_string(),
            period,
            period_label: period_label.to_string(),
            filed_at,
            accession_no: raw.accession_no.clone(),
            records,
        }))
    }

    /// Normalize one table. A missing table or transaction list contributes nothing.
    fn normalize_table(
        &mut self,
        ctx: &FilingContext<'_>,
        period: ReportPeriod,
        table: Option<&RawTable>,
        category: OwnershipCategory,
        out: &mut Vec<TransactionRecord>,
    ) -> Result<()> {
        let Some(transactions) = table.and_then(|t| t.transactions.as_ref()) else {
            return Ok(());
        };

        for (idx, tx) in transactions.iter().enumerate() {
            match normalize_entry(ctx, period, tx, category, idx) {
                Ok(record) => {
                    match category {
                        OwnershipCategory::DirectHolding => self.stats.direct_records += 1,
                        OwnershipCategory::DerivativeHolding => self.stats.derivative_records += 1,
                    }
                    out.push(record);
                }
                Err(err) => {
                    self.absorb(err, Some(category))?;
                    self.stats.records_skipped += 1;
                }
            }
        }
        Ok(())
    }

    /// Fail-fast: propagate. Best-effort: log and record recoverable errors.
    fn absorb(&mut self, err: Error, category: Option<OwnershipCategory>) -> Result<()> {
        if self.mode == ErrorMode::FailFast {
            return Err(err);
        }
        match err {
            Error::MalformedRecord {
                person,
                period,
                accession,
                field,
            } => {
                warn!(%person, %period, %accession, %field, "skipping malformed record");
                self.issues.push(RecordIssue {
                    person,
                    period,
                    accession,
                    field,
                    category,
                });
                Ok(())
            }
            other => Err(other),
        }
    }
}

fn normalize_entry(
    ctx: &FilingContext<'_>,
    period: ReportPeriod,
    tx: &RawTransaction,
    category: OwnershipCategory,
    idx: usize,
) -> Result<TransactionRecord> {
    let table = match category {
        OwnershipCategory::DirectHolding => "nonDerivativeTable",
        OwnershipCategory::DerivativeHolding => "derivativeTable",
    };
    let malformed = |field: &str| {
        Error::malformed(
            ctx.owner,
            ctx.period,
            ctx.accession,
            format!("{table}.transactions[{idx}].{field}"),
        )
    };

    let security_title =
        non_empty(tx.security_title.as_deref()).ok_or_else(|| malformed("securityTitle"))?;

    let nature = tx
        .ownership_nature
        .as_ref()
        .ok_or_else(|| malformed("ownershipNature"))?;
    let flag = non_empty(nature.direct_or_indirect_ownership.as_deref())
        .ok_or_else(|| malformed("ownershipNature.directOrIndirectOwnership"))?;
    let nature = if flag.trim() == "D" {
        OwnershipNature::PersonallyOwned
    } else {
        let holder = non_empty(nature.nature_of_ownership.as_deref())
            .ok_or_else(|| malformed("ownershipNature.natureOfOwnership"))?;
        OwnershipNature::Indirect(holder.to_string())
    };

    let underlying_title = if category.is_derivative() {
        non_empty(tx.underlying_security.as_ref().and_then(|u| u.title.as_deref()))
            .ok_or_else(|| malformed("underlyingSecurity.title"))?
            .to_string()
    } else {
        String::new()
    };

    let field = "postTransactionAmounts.sharesOwnedFollowingTransaction";
    let shares = tx
        .post_transaction_amounts
        .as_ref()
        .and_then(|p| p.shares_owned_following_transaction.as_ref())
        .ok_or_else(|| malformed(field))
        .and_then(|v| parse_shares(v).ok_or_else(|| malformed(field)))?;

    Ok(TransactionRecord {
        owner: ctx.owner.to_string(),
        period,
        category,
        security_title: security_title.to_string(),
        nature,
        underlying_title,
        shares_following: shares,
    })
}

/// Accept a JSON number or a numeric string; reject anything non-finite.
fn parse_shares(value: &Value) -> Option<Shares> {
    let shares = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    shares.is_finite().then_some(shares)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
