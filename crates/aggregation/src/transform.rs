//! Raw table to weekly aggregates.

use tradeagg_core::{Result, WeeklyAggregate};
use tradeagg_ingestion::{clean, DropReasons, RawTable};
use tracing::info;

use crate::aggregator::WeeklyAggregator;
use crate::metrics::enrich;

/// Row accounting for one transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Rows in the input table.
    pub rows_in: u64,
    /// Rows that reached aggregation.
    pub rows_kept: u64,
    /// Excluded rows by reason.
    pub dropped: DropReasons,
    /// Aggregate rows produced.
    pub groups: u64,
}

impl TransformStats {
    /// Fraction of input rows that were excluded.
    pub fn dropped_frac(&self) -> f64 {
        if self.rows_in > 0 {
            self.dropped.total() as f64 / self.rows_in as f64
        } else {
            0.0
        }
    }
}

/// Normalize, filter, enrich and aggregate a validated table.
///
/// Only a table without the required columns fails; dirty rows are dropped
/// and the result may be empty.
pub fn transform(table: &RawTable) -> Result<(Vec<WeeklyAggregate>, TransformStats)> {
    let raw = table.trades()?;
    let (kept, dropped) = clean(&raw);

    let mut stats = TransformStats {
        rows_in: raw.len() as u64,
        rows_kept: kept.len() as u64,
        dropped,
        groups: 0,
    };

    let mut aggregator = WeeklyAggregator::new();
    for trade in kept {
        aggregator.add_trade(&enrich(trade));
    }
    let rows = aggregator.finish();
    stats.groups = rows.len() as u64;

    info!(
        rows_in = stats.rows_in,
        rows_kept = stats.rows_kept,
        dropped = stats.dropped.total(),
        groups = stats.groups,
        "aggregated weekly trades"
    );

    Ok((rows, stats))
}
