//! Wide table rendering for the insider-ledger system.
//!
//! This crate handles:
//! - Delimited text (CSV) output with a leading date column
//! - JSON output of the full table structure

pub mod csv_writer;
pub mod json_writer;

pub use csv_writer::{format_shares, to_csv_string, write_csv, write_csv_file};
pub use json_writer::{write_json, write_json_file};
