//! Error types for the insider-ledger system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the insider-ledger system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or inconsistent input).
    #[error("Data error: {0}")]
    Data(String),

    /// A filing entry is missing a required field or carries an unusable value.
    #[error("Malformed record in filing {accession} for {person} at {period}: {field}")]
    MalformedRecord {
        /// Reporting owner, or `<unknown>` when the owner itself is missing.
        person: String,
        /// Literal reporting period text, or `<unknown>`.
        period: String,
        /// Accession number of the filing, or `<unknown>`.
        accession: String,
        /// Offending field path.
        field: String,
    },

    /// An expected filing page was not supplied.
    #[error("Missing input batch covering offsets {from}..{to}")]
    MissingBatch {
        /// First missing offset.
        from: usize,
        /// End of the missing range (exclusive).
        to: usize,
    },

    /// Filings were supplied out of filing order.
    #[error("Filing for {person} at {period} filed at {filed_at} precedes previous filing at {previous}")]
    OutOfOrder {
        /// Reporting owner of the offending filing.
        person: String,
        /// Reporting period of the offending filing.
        period: String,
        /// Filing timestamp of the offending filing.
        filed_at: String,
        /// Filing timestamp of the filing applied before it.
        previous: String,
    },

    /// A reporting period could not be parsed.
    #[error("Invalid reporting period: {0}")]
    InvalidPeriod(String),

    /// Serialization of the output table failed.
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a malformed record error.
    pub fn malformed(
        person: impl Into<String>,
        period: impl Into<String>,
        accession: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Error::MalformedRecord {
            person: person.into(),
            period: period.into(),
            accession: accession.into(),
            field: field.into(),
        }
    }

    /// Create an invalid period error.
    pub fn invalid_period(msg: impl Into<String>) -> Self {
        Error::InvalidPeriod(msg.into())
    }

    /// Create an export error.
    pub fn export(msg: impl Into<String>) -> Self {
        Error::Export(msg.into())
    }

    /// Whether this error is fatal regardless of the configured error mode.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::MalformedRecord { .. } | Error::InvalidPeriod(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_names_context() {
        let err = Error::malformed("DOE JANE", "2021-01-01", "0001-21-000001", "postTransactionAmounts");
        let msg = err.to_string();
        assert!(msg.contains("DOE JANE"));
        assert!(msg.contains("2021-01-01"));
        assert!(msg.contains("0001-21-000001"));
        assert!(msg.contains("postTransactionAmounts"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::MissingBatch { from: 50, to: 100 }.is_fatal());
        assert!(!Error::malformed("a", "b", "c", "d").is_fatal());
        assert!(!Error::invalid_period("2021-xx-01").is_fatal());
    }
}
