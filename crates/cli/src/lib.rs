//! Run orchestration for the `tradeagg` binary.
//!
//! One run reads a single input snapshot and fully replaces every output of
//! the previous run. Only a missing input file or missing columns abort it;
//! the spreadsheet copy of the ranking is best-effort.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tradeagg_aggregation::{transform, TransformStats};
use tradeagg_core::Config;
use tradeagg_ingestion::extract;
use tradeagg_reporting::charts::{top_clients_figure, weekly_volume_figure};
use tradeagg_reporting::{
    load_sqlite, run_eda, top_clients, write_aggregates_csv, write_rankings_csv,
    write_rankings_xlsx, EdaReport,
};
use tracing::{info, warn};

/// Outcome of one run.
#[derive(Debug)]
pub struct RunSummary {
    /// Row accounting of the transform.
    pub stats: TransformStats,
    /// Aggregate rows written to every sink.
    pub aggregate_rows: usize,
    /// Rows in the ranking extract.
    pub ranked_clients: usize,
    /// Whether the spreadsheet copy was written.
    pub xlsx_written: bool,
    /// Exploratory report, when requested.
    pub report: Option<EdaReport>,
    /// Files and databases written, in write order.
    pub written: Vec<PathBuf>,
}

/// Execute the pipeline described by `config`.
pub fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;
    let out = &config.output;
    let mut written = Vec::new();

    let report = if config.run_report {
        let report = run_eda(&config.input, &out.output_dir, &out.docs_dir)
            .context("exploratory report failed")?;
        written.extend(report.written.iter().cloned());
        Some(report)
    } else {
        None
    };

    let table = extract(&config.input)?;
    let (aggs, stats) = transform(&table)?;

    fs::create_dir_all(&out.output_dir)
        .with_context(|| format!("cannot create {}", out.output_dir.display()))?;
    fs::create_dir_all(&out.plots_dir)
        .with_context(|| format!("cannot create {}", out.plots_dir.display()))?;

    let aggregates_csv = out.aggregates_csv();
    write_aggregates_csv(&aggs, &aggregates_csv)?;
    written.push(aggregates_csv);

    load_sqlite(&aggs, &out.db_path, &out.table)?;
    written.push(out.db_path.clone());

    let ranking = top_clients(&aggs, &config.ranking.client_type, config.ranking.top_n);
    let rankings_csv = out.rankings_csv();
    write_rankings_csv(&ranking, &rankings_csv)?;
    written.push(rankings_csv);

    let xlsx_path = out.rankings_xlsx();
    let xlsx_written = match write_rankings_xlsx(&ranking, &xlsx_path) {
        Ok(()) => {
            written.push(xlsx_path);
            true
        }
        Err(e) => {
            warn!(error = %e, "spreadsheet export skipped");
            false
        }
    };

    let weekly_page = out.plots_dir.join("weekly_volume.html");
    weekly_volume_figure(&aggs).write_html(&weekly_page)?;
    written.push(weekly_page);

    let ranking_page = out
        .plots_dir
        .join(format!("top_{}_clients.html", config.ranking.client_type.to_lowercase()));
    top_clients_figure(&ranking, &config.ranking.client_type).write_html(&ranking_page)?;
    written.push(ranking_page);

    info!(
        aggregates = aggs.len(),
        ranked = ranking.len(),
        output = %out.output_dir.display(),
        db = %out.db_path.display(),
        "run complete"
    );

    Ok(RunSummary {
        stats,
        aggregate_rows: aggs.len(),
        ranked_clients: ranking.len(),
        xlsx_written,
        report,
        written,
    })
}
