//! Downstream consumers of the weekly aggregate table.
//!
//! This crate provides:
//! - Top-N client ranking
//! - CSV, SQLite and spreadsheet sinks
//! - Plotly chart pages
//! - The exploratory report over the raw input

pub mod charts;
pub mod eda;
pub mod ranking;
pub mod sinks;

pub use charts::Figure;
pub use eda::{run_eda, EdaReport, EdaStats};
pub use ranking::top_clients;
pub use sinks::{load_sqlite, write_aggregates_csv, write_rankings_csv, write_rankings_xlsx};
