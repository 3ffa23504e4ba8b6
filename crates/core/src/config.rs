//! Configuration structures for the insider-ledger system.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the ledger pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Batch loading configuration.
    pub ingestion: IngestionConfig,
    /// Ledger reconstruction configuration.
    pub ledger: LedgerConfig,
    /// Output rendering configuration.
    pub export: ExportConfig,
}

impl Config {
    /// Load a configuration from a JSON file. Missing sections take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.ingestion.page_size == 0 {
            return Err(Error::config("ingestion.page_size must be positive"));
        }
        if self.ingestion.prefix.trim().is_empty() {
            return Err(Error::config("ingestion.prefix must not be empty"));
        }
        if !self.export.delimiter.is_ascii() {
            return Err(Error::config("export.delimiter must be an ASCII character"));
        }
        if self.export.date_header.is_empty() {
            return Err(Error::config("export.date_header must not be empty"));
        }
        Ok(())
    }
}

/// Filing page configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// File name prefix of the pages (`{prefix}_{from}_{to}.json`).
    pub prefix: String,
    /// Number of filings per page.
    pub page_size: usize,
    /// Total number of filings expected across all pages.
    /// `None` accepts whatever contiguous pages are present.
    pub expected_total: Option<usize>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            prefix: "filings".to_string(),
            page_size: 50,
            expected_total: None,
        }
    }
}

/// What to do with a malformed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Abort the build on the first malformed record.
    #[default]
    FailFast,
    /// Skip the record, log it and report it.
    BestEffort,
}

/// Ledger reconstruction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Malformed record policy.
    pub error_mode: ErrorMode,
    /// Reject filings whose `filedAt` precedes the previous filing.
    pub enforce_filing_order: bool,
    /// Reject reporting periods that are not real calendar dates.
    pub strict_calendar_dates: bool,
    /// Ignore filings filed at or after this instant.
    pub filed_before: Option<DateTime<FixedOffset>>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::FailFast,
            enforce_filing_order: true,
            strict_calendar_dates: false,
            filed_before: None,
        }
    }
}

/// Output rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Field delimiter.
    pub delimiter: char,
    /// Header of the leading date column.
    pub date_header: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            date_header: "Date".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ingestion.page_size, 50);
        assert_eq!(config.ledger.error_mode, ErrorMode::FailFast);
        assert!(config.ledger.enforce_filing_order);
        assert_eq!(config.export.delimiter, ',');
        assert_eq!(config.export.date_header, "Date");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "ledger": { "error_mode": "best_effort", "filed_before": "2022-07-03T18:37:53-04:00" } }"#,
        )
        .unwrap();
        assert_eq!(config.ledger.error_mode, ErrorMode::BestEffort);
        assert!(config.ledger.enforce_filing_order);
        assert!(config.ledger.filed_before.is_some());
        assert_eq!(config.ingestion.prefix, "filings");
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.ingestion.page_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
