//! Ledger reconstruction and timeline materialization.
//!
//! This crate handles:
//! - Per-person ledger building (last-write-wins holdings, frozen snapshots)
//! - Merging person histories into one period timeline
//! - Forward-filling the timeline into a wide table
//! - The end-to-end `transform` from raw filings to a wide table

pub mod builder;
pub mod materializer;
pub mod pipeline;
pub mod timeline;

pub use builder::{LedgerBuilder, LedgerStats, Ledgers, PersonLedger, Snapshot};
pub use materializer::{materialize, FillState};
pub use pipeline::{build_wide_table, transform, Transform};
pub use timeline::{merge_histories, PeriodSnapshot};
