//! Core data types for the trade aggregation pipeline.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Columns every input file must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "timestamp",
    "user_id",
    "client_type",
    "symbol",
    "side",
    "quantity",
    "price",
];

/// Map a timestamp to the Monday that starts its Monday-Sunday week.
///
/// Both the aggregation path and the exploratory report bucket through this
/// function, so weekly charts and weekly aggregates always agree.
#[inline]
pub fn week_start(ts: NaiveDateTime) -> NaiveDate {
    let date = ts.date();
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// A trade row exactly as read from the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTrade {
    pub timestamp: String,
    pub user_id: String,
    pub client_type: String,
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    pub price: String,
}

/// A trade after per-field cleaning.
///
/// `None` marks a value that was present in the input but failed to parse.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTrade {
    /// Resolved timestamp (naive, day-first reading).
    pub timestamp: Option<NaiveDateTime>,
    /// Trimmed identifier; empty cells are absent.
    pub user_id: Option<String>,
    /// Trimmed, case preserved.
    pub client_type: String,
    /// Trimmed, case preserved.
    pub symbol: String,
    /// Trimmed and lower-cased.
    pub side: String,
    /// Numeric quantity.
    pub quantity: Option<f64>,
    /// Numeric price.
    pub price: Option<f64>,
}

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Parse a normalized (lower-case, trimmed) side label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "buy" => Some(TradeSide::Buy),
            "sell" => Some(TradeSide::Sell),
            _ => None,
        }
    }

    /// Sign of the realized PnL proxy: +1 for sells, -1 for buys.
    #[inline]
    pub fn pnl_sign(self) -> f64 {
        match self {
            TradeSide::Sell => 1.0,
            TradeSide::Buy => -1.0,
        }
    }
}

/// A trade that passed filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTrade {
    pub timestamp: NaiveDateTime,
    pub user_id: String,
    pub client_type: String,
    pub symbol: String,
    /// Normalized side label; always "buy" or "sell" after filtering.
    pub side: String,
    pub quantity: f64,
    pub price: f64,
}

/// A clean trade with its week bucket and derived metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTrade {
    pub trade: CleanTrade,
    /// Monday of the week containing the timestamp.
    pub week_start_date: NaiveDate,
    /// quantity * price.
    pub total_volume: f64,
    /// quantity * price * side sign.
    pub total_pnl: f64,
}

/// Grouping key of an aggregate row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregateKey {
    pub week_start_date: NaiveDate,
    pub client_type: String,
    pub user_id: String,
    pub symbol: String,
}

impl AggregateKey {
    /// Build the key for an enriched trade.
    pub fn of(trade: &EnrichedTrade) -> Self {
        Self {
            week_start_date: trade.week_start_date,
            client_type: trade.trade.client_type.clone(),
            user_id: trade.trade.user_id.clone(),
            symbol: trade.trade.symbol.clone(),
        }
    }
}

/// One output row: per week, client type, user and symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    pub week_start_date: NaiveDate,
    pub client_type: String,
    pub user_id: String,
    pub symbol: String,
    /// Sum of traded value.
    pub total_volume: f64,
    /// Sum of signed value (sells positive, buys negative).
    pub total_pnl: f64,
    /// Number of contributing trades.
    pub trade_count: u64,
}

/// Per-user totals for the ranking extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRanking {
    pub user_id: String,
    pub total_volume: f64,
    pub total_pnl: f64,
    pub trade_count: u64,
}
