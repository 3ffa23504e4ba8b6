//! Core data types for the insider-ledger system.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Share count reported after a transaction.
pub type Shares = f64;

/// Rendered ownership nature for shares the person holds directly.
pub const PERSONALLY_OWNED: &str = "personally_owned";

/// Which table of a filing an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OwnershipCategory {
    /// Non-derivative security held outright or through an indirect holder.
    DirectHolding,
    /// Derivative security referencing an underlying security.
    DerivativeHolding,
}

impl OwnershipCategory {
    /// Is this the derivative table?
    #[inline]
    pub fn is_derivative(self) -> bool {
        matches!(self, OwnershipCategory::DerivativeHolding)
    }

    /// Name used in logs and issue reports.
    pub fn as_str(self) -> &'static str {
        match self {
            OwnershipCategory::DirectHolding => "direct-holding",
            OwnershipCategory::DerivativeHolding => "derivative-holding",
        }
    }
}

impl fmt::Display for OwnershipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the person holds the security.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OwnershipNature {
    /// Held directly by the reporting person.
    PersonallyOwned,
    /// Held through a named entity (trust, spouse, LLC...).
    Indirect(String),
}

impl OwnershipNature {
    /// Rendered form used in column labels.
    pub fn as_str(&self) -> &str {
        match self {
            OwnershipNature::PersonallyOwned => PERSONALLY_OWNED,
            OwnershipNature::Indirect(holder) => holder,
        }
    }
}

impl fmt::Display for OwnershipNature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite identity of one tracked holding line.
///
/// Equality is structural over every component, so names containing the
/// label separator can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnershipKey {
    /// Reporting owner.
    pub person: String,
    /// Direct or derivative table.
    pub category: OwnershipCategory,
    /// Ownership nature.
    pub nature: OwnershipNature,
    /// Security title as reported.
    pub security_title: String,
    /// Underlying security title (empty for direct holdings).
    pub underlying_title: String,
}

impl OwnershipKey {
    /// Column label: `{person}_{nature}_{security title}`.
    ///
    /// Labels are presentation only and may repeat across categories.
    pub fn label(&self) -> String {
        format!("{}_{}_{}", self.person, self.nature, self.security_title)
    }
}

/// Reporting period of a filing, compared as an integer (year, month, day) tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl ReportPeriod {
    /// Create a period from components.
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Parse `YYYY-MM-DD` into integer components.
    ///
    /// Components only need to be in range (month 1-12, day 1-31); use
    /// [`ReportPeriod::to_naive_date`] to check that the day exists.
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.trim().split('-').collect();
        let [y, m, d] = parts.as_slice() else {
            return Err(Error::invalid_period(text));
        };

        let year: i32 = y.trim().parse().map_err(|_| Error::invalid_period(text))?;
        let month: u32 = m.trim().parse().map_err(|_| Error::invalid_period(text))?;
        let day: u32 = d.trim().parse().map_err(|_| Error::invalid_period(text))?;

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(Error::invalid_period(text));
        }

        Ok(Self { year, month, day })
    }

    /// Convert to a calendar date, if the components name a real day.
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl FromStr for ReportPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// One normalized transaction entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Reporting owner.
    pub owner: String,
    /// Reporting period of the enclosing filing.
    pub period: ReportPeriod,
    /// Direct or derivative table.
    pub category: OwnershipCategory,
    /// Security title.
    pub security_title: String,
    /// Ownership nature.
    pub nature: OwnershipNature,
    /// Underlying security title (empty for direct holdings).
    pub underlying_title: String,
    /// Shares owned following the transaction.
    pub shares_following: Shares,
}

impl TransactionRecord {
    /// Identity of the holding this record updates.
    pub fn key(&self) -> OwnershipKey {
        OwnershipKey {
            person: self.owner.clone(),
            category: self.category,
            nature: self.nature.clone(),
            security_title: self.security_title.clone(),
            underlying_title: self.underlying_title.clone(),
        }
    }
}

/// A filing after normalization: every record is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFiling {
    /// Reporting owner.
    pub owner: String,
    /// Parsed reporting period.
    pub period: ReportPeriod,
    /// Reporting period text as it appeared in the filing.
    pub period_label: String,
    /// Filing timestamp, when supplied.
    pub filed_at: Option<DateTime<FixedOffset>>,
    /// Accession number, when supplied.
    pub accession_no: Option<String>,
    /// Direct records first, then derivative records, in filing order.
    pub records: Vec<TransactionRecord>,
}

impl NormalizedFiling {
    /// Accession number or a placeholder for messages.
    pub fn accession_or_unknown(&self) -> &str {
        self.accession_no.as_deref().unwrap_or("<unknown>")
    }
}

/// A record or filing dropped in best-effort mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIssue {
    /// Reporting owner, or `<unknown>`.
    pub person: String,
    /// Reporting period text, or `<unknown>`.
    pub period: String,
    /// Accession number, or `<unknown>`.
    pub accession: String,
    /// Offending field path.
    pub field: String,
    /// Table the entry came from; `None` when the whole filing was dropped.
    pub category: Option<OwnershipCategory>,
}

/// One column of the wide table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideColumn {
    /// Holding identity.
    pub key: OwnershipKey,
    /// Rendered header label.
    pub label: String,
}

/// One row of the wide table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    /// Parsed period.
    pub period: ReportPeriod,
    /// Period text as first seen in the input.
    pub label: String,
    /// One value per column, in column order.
    pub values: Vec<Shares>,
}

/// Forward-filled holdings: one row per period, one column per holding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WideTable {
    pub columns: Vec<WideColumn>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Number of columns (excluding the date column).
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Position of a key among the columns.
    pub fn column_index(&self, key: &OwnershipKey) -> Option<usize> {
        self.columns.iter().position(|c| &c.key == key)
    }

    /// Value of `key` at `period`, if both exist.
    pub fn value_at(&self, period: ReportPeriod, key: &OwnershipKey) -> Option<Shares> {
        let col = self.column_index(key)?;
        let row = self.rows.iter().find(|r| r.period == period)?;
        row.values.get(col).copied()
    }

    /// Header labels in column order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.label.as_str())
    }
}
