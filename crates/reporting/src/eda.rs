//! Exploratory report over the raw trade file.
//!
//! Runs independently of the aggregation path: it re-reads the input without
//! column validation, keeps every row with a timestamp, symbol, quantity and
//! price (side is not filtered), and charts that subset. Charts that need a
//! `client_type` or `side` column are left out when the column is absent.
//! Weekly charts bucket through [`tradeagg_core::week_start`], the same
//! function the aggregates use.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;
use tradeagg_core::{week_start, Result};
use tradeagg_ingestion::{normalize, parse_number, parse_timestamp, read_table, RawTable};
use tracing::info;

use crate::charts::{escape_html, Figure, PLOTLY_CDN};

/// Summary statistics of the raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct EdaStats {
    /// Data rows in the file.
    pub rows: usize,
    /// Rows whose timestamp parsed.
    pub rows_valid_ts: usize,
    /// Empty or uncoercible cells per column, in header order.
    pub nulls_per_column: Vec<(String, usize)>,
    /// Distinct non-empty symbols.
    pub unique_symbols: usize,
    /// Earliest parsed timestamp.
    pub date_min: Option<NaiveDateTime>,
    /// Latest parsed timestamp.
    pub date_max: Option<NaiveDateTime>,
    /// Mean of quantity * price over the charted subset.
    pub value_mean: Option<f64>,
    /// Sample standard deviation of quantity * price over the charted subset.
    pub value_std: Option<f64>,
}

impl EdaStats {
    /// Compute statistics for a raw table.
    pub fn from_table(table: &RawTable) -> Self {
        let timestamps: Vec<Option<NaiveDateTime>> = table
            .column("timestamp")
            .map(|col| col.map(parse_timestamp).collect())
            .unwrap_or_default();
        let valid: Vec<NaiveDateTime> = timestamps.iter().flatten().copied().collect();

        let nulls_per_column = table
            .headers()
            .iter()
            .map(|name| {
                let nulls = table
                    .column(name)
                    .map(|col| col.filter(|cell| is_null(name, cell)).count())
                    .unwrap_or(0);
                (name.clone(), nulls)
            })
            .collect();

        let unique_symbols = table
            .column("symbol")
            .map(|col| col.filter(|s| !s.is_empty()).collect::<BTreeSet<_>>().len())
            .unwrap_or(0);

        Self {
            rows: table.len(),
            rows_valid_ts: valid.len(),
            nulls_per_column,
            unique_symbols,
            date_min: valid.iter().min().copied(),
            date_max: valid.iter().max().copied(),
            value_mean: None,
            value_std: None,
        }
    }

    fn with_values(mut self, values: &[f64]) -> Self {
        use statrs::statistics::Statistics;

        if !values.is_empty() {
            self.value_mean = Some(values.iter().mean());
        }
        if values.len() > 1 {
            self.value_std = Some(values.iter().std_dev());
        }
        self
    }

    /// Key/value rows as written to `eda_report.csv`.
    pub fn to_rows(&self) -> Vec<(String, String)> {
        let opt_ts = |t: Option<NaiveDateTime>| t.map_or_else(|| "NaT".to_string(), |t| t.to_string());
        let opt_num = |v: Option<f64>| v.map_or_else(String::new, |v| v.to_string());

        let mut rows = vec![
            ("rows".to_string(), self.rows.to_string()),
            ("rows_valid_ts".to_string(), self.rows_valid_ts.to_string()),
        ];
        for (column, nulls) in &self.nulls_per_column {
            rows.push((format!("nulls.{column}"), nulls.to_string()));
        }
        rows.extend([
            ("unique_symbols".to_string(), self.unique_symbols.to_string()),
            ("date_min".to_string(), opt_ts(self.date_min)),
            ("date_max".to_string(), opt_ts(self.date_max)),
            ("value_mean".to_string(), opt_num(self.value_mean)),
            ("value_std".to_string(), opt_num(self.value_std)),
        ]);
        rows
    }
}

/// Coerced columns count failed parses as null; others count empty cells.
fn is_null(column: &str, cell: &str) -> bool {
    match column {
        "timestamp" => parse_timestamp(cell).is_none(),
        "quantity" | "price" => parse_number(cell).is_none(),
        _ => cell.trim().is_empty(),
    }
}

/// A row kept for charting.
#[derive(Debug, Clone)]
struct ChartRow {
    week: NaiveDate,
    client_type: String,
    symbol: String,
    side: String,
    value: f64,
}

fn chart_rows(table: &RawTable) -> Vec<ChartRow> {
    table
        .project()
        .iter()
        .map(normalize)
        .filter_map(|n| {
            let (ts, qty, px) = (n.timestamp?, n.quantity?, n.price?);
            if n.symbol.is_empty() {
                return None;
            }
            Some(ChartRow {
                week: week_start(ts),
                client_type: n.client_type,
                symbol: n.symbol,
                side: n.side,
                value: qty * px,
            })
        })
        .collect()
}

/// Optional columns some charts depend on.
#[derive(Debug, Clone, Copy)]
struct ChartColumns {
    client_type: bool,
    side: bool,
}

impl ChartColumns {
    fn of(table: &RawTable) -> Self {
        Self {
            client_type: table.column_index("client_type").is_some(),
            side: table.column_index("side").is_some(),
        }
    }
}

fn build_figures(rows: &[ChartRow], columns: ChartColumns) -> Vec<Figure> {
    let mut figures = Vec::new();

    if columns.client_type {
        figures.push(client_type_figure(rows));
    }
    figures.push(symbol_figure(rows));
    if columns.client_type {
        if let Some(fig) = weekly_figure(rows) {
            figures.push(fig);
        }
    }
    if columns.side {
        figures.push(side_figure(rows));
    }
    figures
}

fn client_type_figure(rows: &[ChartRow]) -> Figure {
    let mut by_client: BTreeMap<&str, usize> = BTreeMap::new();
    for r in rows {
        *by_client.entry(r.client_type.as_str()).or_default() += 1;
    }
    Figure::bar(
        "Trades by Client Type",
        by_client.keys().map(|k| k.to_string()).collect(),
        by_client.values().map(|&v| v as f64).collect(),
    )
    .with_axis_titles("client_type", "count")
}

fn symbol_figure(rows: &[ChartRow]) -> Figure {
    let mut by_symbol: BTreeMap<&str, f64> = BTreeMap::new();
    for r in rows {
        *by_symbol.entry(r.symbol.as_str()).or_default() += r.value;
    }
    let mut by_symbol: Vec<(&str, f64)> = by_symbol.into_iter().collect();
    by_symbol.sort_by_key(|&(_, v)| Reverse(OrderedFloat(v)));
    Figure::bar(
        "Total Traded Value by Symbol",
        by_symbol.iter().map(|(s, _)| s.to_string()).collect(),
        by_symbol.iter().map(|&(_, v)| v).collect(),
    )
    .with_axis_titles("symbol", "total_value")
}

fn weekly_figure(rows: &[ChartRow]) -> Option<Figure> {
    let mut weekly: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for r in rows {
        *weekly
            .entry(r.client_type.clone())
            .or_default()
            .entry(r.week)
            .or_insert(0.0) += r.value;
    }
    (!weekly.is_empty()).then(|| {
        Figure::lines("Weekly Total Value by Client Type", &weekly)
            .with_axis_titles("week_start_date", "total_value")
    })
}

fn side_figure(rows: &[ChartRow]) -> Figure {
    let mut by_side: BTreeMap<&str, f64> = BTreeMap::new();
    for r in rows {
        *by_side.entry(r.side.as_str()).or_default() += r.value;
    }
    Figure::bar(
        "Buy vs Sell: Total Value",
        by_side.keys().map(|k| k.to_string()).collect(),
        by_side.values().copied().collect(),
    )
    .with_axis_titles("side", "total_value")
}

fn render_report(stats: &EdaStats, figures: &[Figure]) -> String {
    let mut html = String::new();
    let _ = writeln!(
        html,
        "<html><head><meta charset='utf-8'><title>EDA Report</title>\
         <script src=\"{PLOTLY_CDN}\"></script></head><body>"
    );
    html.push_str("<h1>EDA Report</h1>\n");
    let _ = writeln!(
        html,
        "<p><b>Rows:</b> {} | <b>Valid timestamps:</b> {}</p>",
        stats.rows, stats.rows_valid_ts
    );

    html.push_str("<h2>Summary</h2>\n<table>\n");
    for (key, value) in stats.to_rows() {
        let _ = writeln!(
            html,
            "<tr><th align='left'>{}</th><td>{}</td></tr>",
            escape_html(&key),
            escape_html(&value)
        );
    }
    html.push_str("</table>\n<h2>Charts</h2>\n");

    for (i, fig) in figures.iter().enumerate() {
        let _ = writeln!(html, "<h3>Figure {}</h3>", i + 1);
        html.push_str(&fig.to_html_fragment(&format!("figure-{}", i + 1)));
        html.push('\n');
    }
    html.push_str("</body></html>\n");
    html
}

const INDEX_PAGE: &str = "<html><head><meta charset='utf-8'><title>Reports</title></head>\
<body><h1>Reports</h1><ul><li><a href='eda_report.html'>EDA Report</a></li></ul></body></html>";

/// What the exploratory report produced.
#[derive(Debug, Clone)]
pub struct EdaReport {
    pub stats: EdaStats,
    pub figure_count: usize,
    /// Files written, in write order.
    pub written: Vec<PathBuf>,
}

/// Build the exploratory report for `input`.
///
/// Writes `eda_report.csv` and `eda_report.html` into `output_dir`, a copy of
/// the HTML into `docs_dir`, and `docs_dir/index.html`.
pub fn run_eda(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    docs_dir: impl AsRef<Path>,
) -> Result<EdaReport> {
    let (input, output_dir, docs_dir) = (input.as_ref(), output_dir.as_ref(), docs_dir.as_ref());
    fs::create_dir_all(output_dir)?;
    fs::create_dir_all(docs_dir)?;

    let table = read_table(input)?;
    let rows = chart_rows(&table);
    let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
    let stats = EdaStats::from_table(&table).with_values(&values);

    let mut written = Vec::new();

    let stats_path = output_dir.join("eda_report.csv");
    let mut writer = csv::Writer::from_path(&stats_path)?;
    writer.write_record(["metric", "value"])?;
    for (key, value) in stats.to_rows() {
        writer.write_record([key, value])?;
    }
    writer.flush()?;
    written.push(stats_path);

    let figures = build_figures(&rows, ChartColumns::of(&table));
    let html = render_report(&stats, &figures);
    for target in [output_dir.join("eda_report.html"), docs_dir.join("eda_report.html")] {
        fs::write(&target, &html)?;
        written.push(target);
    }

    let index = docs_dir.join("index.html");
    fs::write(&index, INDEX_PAGE)?;
    written.push(index);

    info!(
        rows = stats.rows,
        valid_ts = stats.rows_valid_ts,
        figures = figures.len(),
        "eda report ready"
    );

    Ok(EdaReport {
        stats,
        figure_count: figures.len(),
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CSV: &str = "timestamp,user_id,client_type,symbol,side,quantity,price,venue\n\
        01/04/2024 10:00,1,bronze,AAPL,buy,10,5,X\n\
        07/04/2024 23:59,2,gold,MSFT,SELL,2,10,\n\
        08/04/2024 00:00,1,bronze,AAPL,hold,1,30,X\n\
        garbage,3,bronze,,buy,1,N/A,X\n";

    fn write_input(dir: &Path) -> PathBuf {
        let path = dir.join("trades.csv");
        fs::write(&path, CSV).unwrap();
        path
    }

    #[test]
    fn test_stats() {
        let dir = tempfile::tempdir().unwrap();
        let table = read_table(write_input(dir.path())).unwrap();
        let stats = EdaStats::from_table(&table);

        assert_eq!(stats.rows, 4);
        assert_eq!(stats.rows_valid_ts, 3);
        assert_eq!(stats.unique_symbols, 2);
        let nulls: BTreeMap<_, _> = stats.nulls_per_column.iter().cloned().collect();
        assert_eq!(nulls["timestamp"], 1);
        assert_eq!(nulls["price"], 1);
        assert_eq!(nulls["symbol"], 1);
        assert_eq!(nulls["venue"], 1);
        assert_eq!(nulls["quantity"], 0);
        assert_eq!(stats.date_min.unwrap().to_string(), "2024-04-01 10:00:00");
        assert_eq!(stats.date_max.unwrap().to_string(), "2024-04-08 00:00:00");
    }

    #[test]
    fn test_chart_subset_keeps_all_sides() {
        let dir = tempfile::tempdir().unwrap();
        let table = read_table(write_input(dir.path())).unwrap();
        let rows = chart_rows(&table);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().any(|r| r.side == "hold"));
    }

    #[test]
    fn test_figures() {
        let dir = tempfile::tempdir().unwrap();
        let table = read_table(write_input(dir.path())).unwrap();
        let figures = build_figures(&chart_rows(&table), ChartColumns::of(&table));
        assert_eq!(figures.len(), 4);

        // AAPL 50 + 30 outranks MSFT 20
        let by_symbol = figures[1].to_json();
        assert_eq!(by_symbol["data"][0]["x"][0], "AAPL");
        assert_eq!(by_symbol["data"][0]["y"][0], 80.0);

        // Monday 1st and Sunday 7th share a bucket, Monday 8th does not
        let weekly = figures[2].to_json();
        assert_eq!(weekly["data"][0]["name"], "bronze");
        assert_eq!(weekly["data"][0]["x"][0], "2024-04-01");
        assert_eq!(weekly["data"][0]["x"][1], "2024-04-08");
        assert_eq!(weekly["data"][1]["x"][0], "2024-04-01");
    }

    #[test]
    fn test_run_eda_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let out = dir.path().join("output");
        let docs = dir.path().join("docs");

        let report = run_eda(&input, &out, &docs).unwrap();
        assert_eq!(report.figure_count, 4);
        assert_eq!(report.written.len(), 4);
        assert_relative_eq!(report.stats.value_mean.unwrap(), (50.0 + 20.0 + 30.0) / 3.0);

        let html = fs::read_to_string(out.join("eda_report.html")).unwrap();
        assert!(html.contains("<b>Rows:</b> 4 | <b>Valid timestamps:</b> 3"));
        assert!(html.contains("Figure 4"));
        assert_eq!(html, fs::read_to_string(docs.join("eda_report.html")).unwrap());
        assert!(fs::read_to_string(docs.join("index.html"))
            .unwrap()
            .contains("eda_report.html"));

        let stats_csv = fs::read_to_string(out.join("eda_report.csv")).unwrap();
        assert!(stats_csv.starts_with("metric,value\nrows,4\n"));
    }

    #[test]
    fn test_run_eda_without_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trades.csv");
        fs::write(
            &input,
            "timestamp,symbol,quantity,price\n01/04/2024,AAPL,10,5\n02/04/2024,MSFT,1,3\n",
        )
        .unwrap();

        let report = run_eda(&input, dir.path().join("output"), dir.path().join("docs")).unwrap();
        assert_eq!(report.stats.rows, 2);
        assert_eq!(report.stats.unique_symbols, 2);
        // Only the by-symbol chart remains
        assert_eq!(report.figure_count, 1);
    }

    #[test]
    fn test_run_eda_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_eda(dir.path().join("none.csv"), dir.path(), dir.path()).unwrap_err();
        assert!(err.is_structural());
    }
}
