use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tradeagg_core::{Config, Error};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "tradeagg",
    about = "Aggregate trades into weekly per-client, per-symbol totals"
)]
struct Cli {
    /// Also build the exploratory report and publish it to the docs directory.
    #[arg(long)]
    run_eda: bool,

    /// JSON configuration; defaults apply to any field it omits.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::level_filters::LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    config.run_report |= cli.run_eda;

    let summary = match tradeagg_cli::run(&config) {
        Ok(summary) => summary,
        Err(e) => {
            // Bad input (missing file or columns) exits 2, anything else 1.
            let structural = e.downcast_ref::<Error>().is_some_and(Error::is_structural);
            error!(error = %format!("{e:#}"), structural, "run aborted");
            std::process::exit(if structural { 2 } else { 1 });
        }
    };
    info!(
        rows_in = summary.stats.rows_in,
        rows_dropped = summary.stats.dropped.total(),
        aggregates = summary.aggregate_rows,
        "done: outputs in {}, database at {}",
        config.output.output_dir.display(),
        config.output.db_path.display()
    );
    Ok(())
}
