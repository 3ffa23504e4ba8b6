//! Per-person ledger reconstruction.
//!
//! Applies normalized filings in filing order. Each person keeps a live
//! key -> share count state (last write wins) and an append-only history of
//! frozen snapshots, one per filing.

use chrono::{DateTime, FixedOffset};
use insider_core::config::LedgerConfig;
use insider_core::{
    Error, NormalizedFiling, OwnershipCategory, OwnershipKey, ReportPeriod, Result, Shares,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// A frozen copy of one person's holdings after one filing.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Reporting period of the filing.
    pub period: ReportPeriod,
    /// Reporting period text as filed.
    pub period_label: String,
    /// Global filing sequence number (processing order across all people).
    pub seq: u64,
    /// Every holding of the person, in first-appearance order.
    pub holdings: Vec<(OwnershipKey, Shares)>,
}

/// Holdings and history of one reporting person.
#[derive(Debug, Clone)]
pub struct PersonLedger {
    name: String,
    /// Keys in first-appearance order.
    order: Vec<OwnershipKey>,
    /// Live share counts.
    current: HashMap<OwnershipKey, Shares>,
    /// Append-only snapshots.
    history: Vec<Snapshot>,
}

impl PersonLedger {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Vec::new(),
            current: HashMap::new(),
            history: Vec::new(),
        }
    }

    /// Reporting person's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current share count for a key.
    pub fn get(&self, key: &OwnershipKey) -> Option<Shares> {
        self.current.get(key).copied()
    }

    /// Keys in first-appearance order.
    pub fn keys(&self) -> &[OwnershipKey] {
        &self.order
    }

    /// Live holdings in first-appearance order.
    pub fn holdings(&self) -> impl Iterator<Item = (&OwnershipKey, Shares)> + '_ {
        self.order
            .iter()
            .map(move |k| (k, self.current.get(k).copied().unwrap_or_default()))
    }

    /// Snapshots in filing order.
    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    /// Overwrite the count for `key`. Returns true when the key is new.
    fn set(&mut self, key: OwnershipKey, shares: Shares) -> bool {
        match self.current.get_mut(&key) {
            Some(slot) => {
                *slot = shares;
                false
            }
            None => {
                self.order.push(key.clone());
                self.current.insert(key, shares);
                true
            }
        }
    }

    /// Deep copy of the live state.
    fn snapshot(&self, period: ReportPeriod, period_label: &str, seq: u64) -> Snapshot {
        Snapshot {
            period,
            period_label: period_label.to_string(),
            seq,
            holdings: self.holdings().map(|(k, v)| (k.clone(), v)).collect(),
        }
    }
}

/// Statistics about ledger reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Filings applied.
    pub filings_applied: u64,
    /// Records applied.
    pub records_applied: u64,
    /// Distinct people.
    pub people: u64,
    /// Distinct ownership keys.
    pub keys: u64,
    /// Snapshots appended.
    pub snapshots: u64,
}

/// Builds per-person ledgers from filings in filing order.
pub struct LedgerBuilder {
    /// Ledgers in first-appearance order.
    people: Vec<PersonLedger>,
    /// Person name -> position in `people`.
    index: HashMap<String, usize>,
    /// Reject filings older than the previous one.
    enforce_filing_order: bool,
    /// Timestamp of the last timestamped filing applied.
    last_filed_at: Option<DateTime<FixedOffset>>,
    /// Next filing sequence number.
    next_seq: u64,
    /// Build statistics.
    stats: LedgerStats,
}

impl LedgerBuilder {
    /// Create a new builder.
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            people: Vec::new(),
            index: HashMap::new(),
            enforce_filing_order: config.enforce_filing_order,
            last_filed_at: None,
            next_seq: 0,
            stats: LedgerStats::default(),
        }
    }

    /// Apply one filing: overwrite each record's holding, then snapshot the person.
    ///
    /// Filings must arrive in ascending filing order; an out-of-order filing is
    /// rejected before any state changes.
    pub fn apply(&mut self, filing: &NormalizedFiling) -> Result<()> {
        self.check_order(filing)?;

        let slot = match self.index.get(&filing.owner) {
            Some(&i) => i,
            None => {
                self.people.push(PersonLedger::new(filing.owner.clone()));
                self.index.insert(filing.owner.clone(), self.people.len() - 1);
                self.stats.people += 1;
                self.people.len() - 1
            }
        };
        let ledger = &mut self.people[slot];

        for record in &filing.records {
            if ledger.set(record.key(), record.shares_following) {
                self.stats.keys += 1;
            }
            self.stats.records_applied += 1;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let snapshot = ledger.snapshot(filing.period, &filing.period_label, seq);
        ledger.history.push(snapshot);

        if filing.filed_at.is_some() {
            self.last_filed_at = filing.filed_at;
        }
        self.stats.filings_applied += 1;
        self.stats.snapshots += 1;

        debug!(
            person = %filing.owner,
            period = %filing.period,
            records = filing.records.len(),
            seq,
            "applied filing"
        );
        Ok(())
    }

    /// Apply filings in order.
    pub fn apply_all<'a>(
        &mut self,
        filings: impl IntoIterator<Item = &'a NormalizedFiling>,
    ) -> Result<()> {
        for filing in filings {
            self.apply(filing)?;
        }
        Ok(())
    }

    fn check_order(&self, filing: &NormalizedFiling) -> Result<()> {
        if !self.enforce_filing_order {
            return Ok(());
        }
        if let (Some(prev), Some(ts)) = (self.last_filed_at, filing.filed_at) {
            if ts < prev {
                return Err(Error::OutOfOrder {
                    person: filing.owner.clone(),
                    period: filing.period_label.clone(),
                    filed_at: ts.to_rfc3339(),
                    previous: prev.to_rfc3339(),
                });
            }
        }
        Ok(())
    }

    /// Look up a person's ledger.
    pub fn person(&self, name: &str) -> Option<&PersonLedger> {
        self.index.get(name).map(|&i| &self.people[i])
    }

    /// Get build statistics.
    pub fn stats(&self) -> &LedgerStats {
        &self.stats
    }

    /// Freeze the ledgers.
    pub fn finish(self) -> Ledgers {
        info!(
            filings = self.stats.filings_applied,
            records = self.stats.records_applied,
            people = self.stats.people,
            keys = self.stats.keys,
            "ledger build finished"
        );
        Ledgers {
            people: self.people,
            stats: self.stats,
        }
    }
}

/// Read-only ledgers after a build.
#[derive(Debug, Clone)]
pub struct Ledgers {
    people: Vec<PersonLedger>,
    stats: LedgerStats,
}

impl Ledgers {
    /// Ledgers in first-appearance order.
    pub fn people(&self) -> &[PersonLedger] {
        &self.people
    }

    /// Look up a person's ledger.
    pub fn person(&self, name: &str) -> Option<&PersonLedger> {
        self.people.iter().find(|p| p.name == name)
    }

    /// Build statistics.
    pub fn stats(&self) -> &LedgerStats {
        &self.stats
    }

    /// Every tracked key: direct holdings first, then derivatives. Within a
    /// category, people and their keys are in first-appearance order.
    pub fn column_universe(&self) -> Vec<OwnershipKey> {
        let by_category = |category: OwnershipCategory| {
            self.people
                .iter()
                .flat_map(|p| p.keys().iter())
                .filter(move |k| k.category == category)
                .cloned()
        };
        by_category(OwnershipCategory::DirectHolding)
            .chain(by_category(OwnershipCategory::DerivativeHolding))
            .collect()
    }
}
