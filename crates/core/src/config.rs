//! Configuration structures for the trade aggregation pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input CSV with one trade per row.
    pub input: PathBuf,
    /// Output destinations.
    pub output: OutputConfig,
    /// Client ranking extract.
    pub ranking: RankingConfig,
    /// Also build the exploratory HTML report.
    pub run_report: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/trades.csv"),
            output: OutputConfig::default(),
            ranking: RankingConfig::default(),
            run_report: false,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve every relative path against `root`.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        rebase(&mut self.input);
        rebase(&mut self.output.output_dir);
        rebase(&mut self.output.plots_dir);
        rebase(&mut self.output.docs_dir);
        rebase(&mut self.output.db_path);
        self
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        check_table_name(&self.output.table)?;
        if self.ranking.top_n == 0 {
            return Err(Error::config("ranking.top_n must be greater than zero"));
        }
        Ok(())
    }
}

/// Reject table names that cannot be spliced into SQL unquoted.
///
/// A valid name is non-empty ASCII alphanumerics or `_` and does not start
/// with a digit.
pub fn check_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::config(format!("invalid table name '{table}'")))
    }
}

/// Where a run writes its artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for tabular exports and the report copy.
    pub output_dir: PathBuf,
    /// Directory for standalone chart pages.
    pub plots_dir: PathBuf,
    /// Published report directory (report copy + index page).
    pub docs_dir: PathBuf,
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Table replaced on every run.
    pub table: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            plots_dir: PathBuf::from("output/plots"),
            docs_dir: PathBuf::from("docs"),
            db_path: PathBuf::from("agg_result.db"),
            table: "agg_trades_weekly".to_string(),
        }
    }
}

impl OutputConfig {
    /// Weekly aggregate CSV.
    pub fn aggregates_csv(&self) -> PathBuf {
        self.output_dir.join("agg_trades_weekly.csv")
    }

    /// Ranking CSV.
    pub fn rankings_csv(&self) -> PathBuf {
        self.output_dir.join("top_clients.csv")
    }

    /// Ranking spreadsheet.
    pub fn rankings_xlsx(&self) -> PathBuf {
        self.output_dir.join("top_clients.xlsx")
    }
}

/// Top-N client ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Client type to rank (case-insensitive match).
    pub client_type: String,
    /// Number of clients to keep.
    pub top_n: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            client_type: "bronze".to_string(),
            top_n: 3,
        }
    }
}
