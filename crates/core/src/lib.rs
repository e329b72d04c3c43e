//! Core types and configuration for the weekly trade aggregation pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Trade records at each pipeline stage (raw, normalized, enriched)
//! - The weekly aggregate output row and week bucketing
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{check_table_name, Config};
pub use error::{Error, Result};
pub use types::*;
