//! Per-field cleaning and row filtering.
//!
//! Normalization runs in two phases. [`normalize`] never fails: a cell that
//! cannot be parsed becomes `None`. [`clean`] then applies one predicate and
//! drops every row that is unusable. Dropped rows are counted, not reported
//! as errors.

use tradeagg_core::{CleanTrade, NormalizedTrade, RawTrade, TradeSide};
use tracing::debug;

use crate::timestamp::parse_timestamp;

/// Coerce a cell to a number. Non-numeric text and NaN become `None`.
///
/// Infinities (`inf`, `-infinity`, ...) are numbers and are kept.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Clean every field of a raw row independently.
pub fn normalize(raw: &RawTrade) -> NormalizedTrade {
    let user_id = raw.user_id.trim();
    NormalizedTrade {
        timestamp: parse_timestamp(&raw.timestamp),
        user_id: (!user_id.is_empty()).then(|| user_id.to_string()),
        client_type: raw.client_type.trim().to_string(),
        symbol: raw.symbol.trim().to_string(),
        side: raw.side.trim().to_lowercase(),
        quantity: parse_number(&raw.quantity),
        price: parse_number(&raw.price),
    }
}

/// Why a normalized row was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Timestamp,
    UserId,
    Quantity,
    Price,
    Symbol,
    Side,
}

/// First reason a row is unusable, if any.
pub fn drop_reason(trade: &NormalizedTrade) -> Option<DropReason> {
    if trade.timestamp.is_none() {
        Some(DropReason::Timestamp)
    } else if trade.user_id.is_none() {
        Some(DropReason::UserId)
    } else if trade.quantity.is_none() {
        Some(DropReason::Quantity)
    } else if trade.price.is_none() {
        Some(DropReason::Price)
    } else if trade.symbol.is_empty() {
        Some(DropReason::Symbol)
    } else if TradeSide::from_label(&trade.side).is_none() {
        Some(DropReason::Side)
    } else {
        None
    }
}

/// Whether a normalized row may reach aggregation.
pub fn is_usable(trade: &NormalizedTrade) -> bool {
    drop_reason(trade).is_none()
}

/// Counts of excluded rows by first failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropReasons {
    pub timestamp: u64,
    pub user_id: u64,
    pub quantity: u64,
    pub price: u64,
    pub symbol: u64,
    pub side: u64,
}

impl DropReasons {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::Timestamp => self.timestamp += 1,
            DropReason::UserId => self.user_id += 1,
            DropReason::Quantity => self.quantity += 1,
            DropReason::Price => self.price += 1,
            DropReason::Symbol => self.symbol += 1,
            DropReason::Side => self.side += 1,
        }
    }

    /// Total rows dropped.
    pub fn total(&self) -> u64 {
        self.timestamp + self.user_id + self.quantity + self.price + self.symbol + self.side
    }
}

fn into_clean(trade: NormalizedTrade) -> Option<CleanTrade> {
    if !is_usable(&trade) {
        return None;
    }
    Some(CleanTrade {
        timestamp: trade.timestamp?,
        user_id: trade.user_id?,
        client_type: trade.client_type,
        symbol: trade.symbol,
        side: trade.side,
        quantity: trade.quantity?,
        price: trade.price?,
    })
}

/// Normalize and filter a batch of raw rows.
pub fn clean(raw: &[RawTrade]) -> (Vec<CleanTrade>, DropReasons) {
    let mut kept = Vec::with_capacity(raw.len());
    let mut dropped = DropReasons::default();

    for row in raw {
        let normalized = normalize(row);
        match drop_reason(&normalized) {
            Some(reason) => dropped.record(reason),
            None => kept.extend(into_clean(normalized)),
        }
    }

    debug!(kept = kept.len(), dropped = dropped.total(), "normalized trades");
    (kept, dropped)
}
