//! Timeline merging.
//!
//! Combines every person's snapshot history into one sequence of period
//! snapshots, one per distinct reporting period, in ascending period order.

use crate::builder::{PersonLedger, Snapshot};
use insider_core::{OwnershipKey, ReportPeriod, Shares};
use std::collections::{BTreeMap, HashMap};

/// Merged holdings of all people at one reporting period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSnapshot {
    /// Reporting period.
    pub period: ReportPeriod,
    /// Period text from the earliest-processed filing for this period.
    pub label: String,
    /// (person, key) -> share count. The person is part of the key.
    pub holdings: HashMap<OwnershipKey, Shares>,
}

impl PeriodSnapshot {
    fn new(period: ReportPeriod, label: &str) -> Self {
        Self {
            period,
            label: label.to_string(),
            holdings: HashMap::new(),
        }
    }

    /// Share count reported for a key at this period.
    pub fn get(&self, key: &OwnershipKey) -> Option<Shares> {
        self.holdings.get(key).copied()
    }

    /// Number of (person, key) entries.
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Whether no entry was reported.
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    fn absorb(&mut self, snapshot: &Snapshot) {
        for (key, shares) in &snapshot.holdings {
            self.holdings.insert(key.clone(), *shares);
        }
    }
}

/// Merge person histories into ascending period snapshots.
///
/// Snapshots sharing a period are unioned. If one (person, key) appears in
/// several snapshots for the same period, the one processed last wins.
pub fn merge_histories<'a>(
    ledgers: impl IntoIterator<Item = &'a PersonLedger>,
) -> Vec<PeriodSnapshot> {
    let mut snapshots: Vec<&Snapshot> = ledgers
        .into_iter()
        .flat_map(|ledger| ledger.history().iter())
        .collect();
    snapshots.sort_by_key(|s| (s.period, s.seq));

    let mut merged: BTreeMap<ReportPeriod, PeriodSnapshot> = BTreeMap::new();
    for snapshot in snapshots {
        merged
            .entry(snapshot.period)
            .or_insert_with(|| PeriodSnapshot::new(snapshot.period, &snapshot.period_label))
            .absorb(snapshot);
    }

    merged.into_values().collect()
}
