//! Core types and configuration for the insider-ledger system.
//!
//! This crate provides shared types used across all other crates:
//! - Ownership identity types (keys, categories, natures, periods)
//! - Normalized filing records and the wide output table
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
