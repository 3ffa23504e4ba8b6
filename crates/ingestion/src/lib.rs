//! Filing ingestion and normalization for the insider-ledger system.
//!
//! This crate handles:
//! - Raw filing wire format (SEC insider-trading JSON pages)
//! - Batch page assembly and gap detection
//! - Record normalization (identity keys and share counts)

pub mod batch;
pub mod normalizer;
pub mod wire;

pub use batch::{load_dir, page_file_name, BatchSet};
pub use normalizer::{NormalizationStats, RecordNormalizer};
pub use wire::{FilingPage, RawFiling};
