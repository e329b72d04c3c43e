//! Metric derivation and weekly aggregation.
//!
//! This crate handles:
//! - Week bucketing and per-trade volume / signed PnL
//! - Grouping by (week, client type, user, symbol)
//! - The end-to-end `transform` from a raw table to aggregate rows

pub mod aggregator;
pub mod metrics;
pub mod transform;

pub use aggregator::WeeklyAggregator;
pub use metrics::{enrich, pnl_sign};
pub use transform::{transform, TransformStats};
