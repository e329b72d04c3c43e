//! Per-trade metric derivation.

use tradeagg_core::{week_start, CleanTrade, EnrichedTrade, TradeSide};

/// PnL sign for a normalized side label. Unknown labels contribute zero.
#[inline]
pub fn pnl_sign(side: &str) -> f64 {
    TradeSide::from_label(side).map_or(0.0, TradeSide::pnl_sign)
}

/// Attach the week bucket, traded value and signed value to a trade.
///
/// Negative prices are not special-cased and flow through both metrics.
pub fn enrich(trade: CleanTrade) -> EnrichedTrade {
    let value = trade.quantity * trade.price;
    EnrichedTrade {
        week_start_date: week_start(trade.timestamp),
        total_volume: value,
        total_pnl: value * pnl_sign(&trade.side),
        trade,
    }
}
