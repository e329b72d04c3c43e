//! Data ingestion and normalization for the trade aggregation pipeline.
//!
//! This crate handles:
//! - Reading the trade CSV and validating its header
//! - Day-first timestamp parsing
//! - Per-field normalization and row filtering

pub mod extract;
pub mod normalizer;
pub mod timestamp;

pub use extract::{extract, read_table, validate_columns, RawTable};
pub use normalizer::{clean, drop_reason, is_usable, normalize, parse_number, DropReason, DropReasons};
pub use timestamp::parse_timestamp;
