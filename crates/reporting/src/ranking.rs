//! Top-N client ranking over the weekly aggregates.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use tradeagg_core::{ClientRanking, WeeklyAggregate};

/// Rank users of one client type by total traded volume.
///
/// Rows are filtered by `client_type` (case-insensitive), summed per user
/// across weeks and symbols, sorted by volume descending (ties by user id)
/// and truncated to `n`.
pub fn top_clients(aggs: &[WeeklyAggregate], client_type: &str, n: usize) -> Vec<ClientRanking> {
    let wanted = client_type.to_lowercase();
    let mut per_user: BTreeMap<&str, ClientRanking> = BTreeMap::new();

    for agg in aggs.iter().filter(|a| a.client_type.to_lowercase() == wanted) {
        let entry = per_user
            .entry(agg.user_id.as_str())
            .or_insert_with(|| ClientRanking {
                user_id: agg.user_id.clone(),
                total_volume: 0.0,
                total_pnl: 0.0,
                trade_count: 0,
            });
        entry.total_volume += agg.total_volume;
        entry.total_pnl += agg.total_pnl;
        entry.trade_count += agg.trade_count;
    }

    let mut ranked: Vec<ClientRanking> = per_user.into_values().collect();
    // BTreeMap order makes the stable sort break volume ties by user id.
    ranked.sort_by_key(|r| Reverse(OrderedFloat(r.total_volume)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_agg(week_day: u32, client_type: &str, user: &str, volume: f64) -> WeeklyAggregate {
        WeeklyAggregate {
            week_start_date: NaiveDate::from_ymd_opt(2024, 4, week_day).unwrap(),
            client_type: client_type.to_string(),
            user_id: user.to_string(),
            symbol: "AAPL".to_string(),
            total_volume: volume,
            total_pnl: -volume / 2.0,
            trade_count: 1,
        }
    }

    #[test]
    fn test_top_three_descending() {
        let aggs = vec![
            make_agg(1, "bronze", "u70", 70.0),
            make_agg(1, "bronze", "u100", 100.0),
            make_agg(1, "bronze", "u80", 80.0),
            make_agg(1, "bronze", "u90", 90.0),
        ];
        let top = top_clients(&aggs, "bronze", 3);
        let volumes: Vec<f64> = top.iter().map(|r| r.total_volume).collect();
        assert_eq!(volumes, vec![100.0, 90.0, 80.0]);
        assert!(top.iter().all(|r| r.user_id != "u70"));
    }

    #[test]
    fn test_sums_across_weeks_and_filters_client_type() {
        let aggs = vec![
            make_agg(1, "bronze", "a", 10.0),
            make_agg(8, "Bronze", "a", 15.0),
            make_agg(1, "gold", "b", 1000.0),
            make_agg(1, "bronze", "c", 20.0),
        ];
        let top = top_clients(&aggs, "bronze", 3);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].user_id, "a");
        assert_relative_eq!(top[0].total_volume, 25.0);
        assert_relative_eq!(top[0].total_pnl, -12.5);
        assert_eq!(top[0].trade_count, 2);
        assert_eq!(top[1].user_id, "c");
    }

    #[test]
    fn test_ties_broken_by_user_id() {
        let aggs = vec![make_agg(1, "bronze", "z", 5.0), make_agg(1, "bronze", "m", 5.0)];
        let top = top_clients(&aggs, "bronze", 3);
        assert_eq!(top[0].user_id, "m");
        assert_eq!(top[1].user_id, "z");
    }

    #[test]
    fn test_no_matching_clients() {
        let aggs = vec![make_agg(1, "gold", "a", 10.0)];
        assert!(top_clients(&aggs, "bronze", 3).is_empty());
    }
}
