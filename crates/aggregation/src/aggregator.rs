//! Weekly aggregation of enriched trades.
//!
//! Groups by (week_start_date, client_type, user_id, symbol) and reduces each
//! group to summed volume, summed signed PnL and a trade count.

use std::collections::BTreeMap;

use tradeagg_core::{AggregateKey, EnrichedTrade, WeeklyAggregate};

/// Neumaier-compensated running sum.
///
/// Keeps the rounding error of every addition so a group's total does not
/// depend on the order its rows arrive in. Once the sum leaves the finite
/// range it is carried as is: an infinite term gives an infinite total, and
/// opposite infinities give NaN.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if !t.is_finite() {
            self.sum = t;
            return;
        }
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        if self.sum.is_finite() {
            self.sum + self.compensation
        } else {
            self.sum
        }
    }
}

/// A group that is still receiving rows.
#[derive(Debug, Clone, Default)]
struct GroupInProgress {
    volume: CompensatedSum,
    pnl: CompensatedSum,
    trade_count: u64,
}

impl GroupInProgress {
    fn add_trade(&mut self, trade: &EnrichedTrade) {
        self.volume.add(trade.total_volume);
        self.pnl.add(trade.total_pnl);
        self.trade_count += 1;
    }

    fn to_aggregate(&self, key: AggregateKey) -> WeeklyAggregate {
        WeeklyAggregate {
            week_start_date: key.week_start_date,
            client_type: key.client_type,
            user_id: key.user_id,
            symbol: key.symbol,
            total_volume: self.volume.value(),
            total_pnl: self.pnl.value(),
            trade_count: self.trade_count,
        }
    }
}

/// Accumulates enriched trades into weekly groups.
#[derive(Debug, Default)]
pub struct WeeklyAggregator {
    groups: BTreeMap<AggregateKey, GroupInProgress>,
}

impl WeeklyAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one enriched trade.
    pub fn add_trade(&mut self, trade: &EnrichedTrade) {
        self.groups
            .entry(AggregateKey::of(trade))
            .or_default()
            .add_trade(trade);
    }

    /// Add multiple enriched trades.
    pub fn add_trades(&mut self, trades: &[EnrichedTrade]) {
        for trade in trades {
            self.add_trade(trade);
        }
    }

    /// Number of distinct keys seen so far.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Consume the aggregator and emit one row per key, ordered by key.
    pub fn finish(self) -> Vec<WeeklyAggregate> {
        self.groups
            .into_iter()
            .map(|(key, group)| group.to_aggregate(key))
            .collect()
    }
}
