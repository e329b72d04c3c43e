//! Tabular and relational sinks.
//!
//! Every sink fully replaces what a previous run wrote. Sinks are independent:
//! a failure in one leaves the others as they are.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection};
use serde::Serialize;
use tradeagg_core::{check_table_name, ClientRanking, Error, Result, WeeklyAggregate};
use tracing::{debug, info};

const AGGREGATE_COLUMNS: [&str; 7] = [
    "week_start_date",
    "client_type",
    "user_id",
    "symbol",
    "total_volume",
    "total_pnl",
    "trade_count",
];

const RANKING_COLUMNS: [&str; 4] = ["user_id", "total_volume", "total_pnl", "trade_count"];

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

/// Write rows under an explicit header, so an empty table still has one.
fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

/// Write the weekly aggregate table verbatim.
pub fn write_aggregates_csv(aggs: &[WeeklyAggregate], path: impl AsRef<Path>) -> Result<()> {
    write_table(path.as_ref(), &AGGREGATE_COLUMNS, aggs)
}

/// Write the ranking extract.
pub fn write_rankings_csv(rows: &[ClientRanking], path: impl AsRef<Path>) -> Result<()> {
    write_table(path.as_ref(), &RANKING_COLUMNS, rows)
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

/// Replace `table` in the SQLite database with the aggregate rows.
///
/// The drop, create and inserts run in one transaction. Returns the number of
/// rows inserted. Infinite metrics are stored as SQLite infinities; a NaN
/// metric is stored as NULL, so the metric columns are nullable.
pub fn load_sqlite(
    aggs: &[WeeklyAggregate],
    db_path: impl AsRef<Path>,
    table: &str,
) -> Result<usize> {
    let db_path = db_path.as_ref();
    check_table_name(table)?;
    ensure_parent(db_path)?;

    let mut conn = Connection::open(db_path).map_err(db_err)?;
    let tx = conn.transaction().map_err(db_err)?;

    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
             week_start_date TEXT NOT NULL,
             client_type TEXT NOT NULL,
             user_id TEXT NOT NULL,
             symbol TEXT NOT NULL,
             total_volume REAL,
             total_pnl REAL,
             trade_count INTEGER NOT NULL
         );"
    ))
    .map_err(db_err)?;

    {
        let mut stmt = tx
            .prepare(&format!(
                "INSERT INTO {table} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                AGGREGATE_COLUMNS.join(", ")
            ))
            .map_err(db_err)?;

        for agg in aggs {
            stmt.execute(params![
                agg.week_start_date.to_string(),
                agg.client_type,
                agg.user_id,
                agg.symbol,
                agg.total_volume,
                agg.total_pnl,
                agg.trade_count as i64,
            ])
            .map_err(db_err)?;
        }
    }

    tx.commit().map_err(db_err)?;
    info!(db = %db_path.display(), table, rows = aggs.len(), "loaded sqlite table");
    Ok(aggs.len())
}

/// Write the ranking extract as a spreadsheet.
#[cfg(feature = "xlsx")]
pub fn write_rankings_xlsx(rows: &[ClientRanking], path: impl AsRef<Path>) -> Result<()> {
    use rust_xlsxwriter::Workbook;

    let path = path.as_ref();
    ensure_parent(path)?;
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| Error::export(e.to_string());

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in RANKING_COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name).map_err(xlsx_err)?;
    }
    for (i, r) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, &r.user_id).map_err(xlsx_err)?;
        sheet.write_number(row, 1, r.total_volume).map_err(xlsx_err)?;
        sheet.write_number(row, 2, r.total_pnl).map_err(xlsx_err)?;
        sheet.write_number(row, 3, r.trade_count as f64).map_err(xlsx_err)?;
    }
    workbook.save(path).map_err(xlsx_err)?;
    debug!(path = %path.display(), rows = rows.len(), "wrote xlsx");
    Ok(())
}

/// Write the ranking extract as a spreadsheet.
///
/// Built without the `xlsx` feature: always fails with [`Error::Export`].
#[cfg(not(feature = "xlsx"))]
pub fn write_rankings_xlsx(_rows: &[ClientRanking], _path: impl AsRef<Path>) -> Result<()> {
    Err(Error::export(
        "spreadsheet writer not available (build with the `xlsx` feature)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_agg(user: &str, volume: f64) -> WeeklyAggregate {
        WeeklyAggregate {
            week_start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            client_type: "bronze".to_string(),
            user_id: user.to_string(),
            symbol: "AAPL".to_string(),
            total_volume: volume,
            total_pnl: -volume,
            trade_count: 2,
        }
    }

    #[test]
    fn test_aggregate_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/agg.csv");
        write_aggregates_csv(&[make_agg("7", 80.0)], &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("week_start_date,client_type,user_id,symbol,total_volume,total_pnl,trade_count")
        );
        assert_eq!(lines.next(), Some("2024-04-01,bronze,7,AAPL,80.0,-80.0,2"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_csv_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.csv");
        write_rankings_csv(&[], &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap().trim_end(),
            "user_id,total_volume,total_pnl,trade_count"
        );
    }

    #[test]
    fn test_sqlite_full_replace() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("agg.db");

        load_sqlite(&[make_agg("1", 1.0), make_agg("2", 2.0)], &db, "agg_trades_weekly").unwrap();
        let n = load_sqlite(&[make_agg("3", 3.0)], &db, "agg_trades_weekly").unwrap();
        assert_eq!(n, 1);

        let conn = Connection::open(&db).unwrap();
        let (count, user, volume, trades): (i64, String, f64, i64) = conn
            .query_row(
                "SELECT COUNT(*), MAX(user_id), SUM(total_volume), SUM(trade_count) FROM agg_trades_weekly",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(user, "3");
        assert_eq!(volume, 3.0);
        assert_eq!(trades, 2);
    }

    #[test]
    fn test_sqlite_accepts_non_finite_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("agg.db");
        let mut nan = make_agg("2", 1.0);
        nan.total_pnl = f64::NAN;
        load_sqlite(&[make_agg("1", f64::INFINITY), nan], &db, "agg_trades_weekly").unwrap();

        let conn = Connection::open(&db).unwrap();
        let rows: Vec<(f64, Option<f64>)> = conn
            .prepare("SELECT total_volume, total_pnl FROM agg_trades_weekly ORDER BY user_id")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(rows[0], (f64::INFINITY, Some(f64::NEG_INFINITY)));
        assert_eq!(rows[1], (1.0, None));
    }

    #[test]
    fn test_sqlite_empty_table_created() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("agg.db");
        load_sqlite(&[], &db, "weekly").unwrap();

        let conn = Connection::open(&db).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM weekly", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_sqlite_rejects_bad_table_name() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sqlite(&[], dir.path().join("a.db"), "x; DROP").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(not(feature = "xlsx"))]
    #[test]
    fn test_xlsx_unavailable_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_rankings_xlsx(&[], dir.path().join("top.xlsx")).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_xlsx_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.xlsx");
        let rows = vec![ClientRanking {
            user_id: "1".to_string(),
            total_volume: 10.0,
            total_pnl: -10.0,
            trade_count: 1,
        }];
        write_rankings_xlsx(&rows, &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }
}
