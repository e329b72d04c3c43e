//! Reading the trade CSV and validating its header.
//!
//! The table keeps every cell as text. Typing happens in the normalizer so a
//! malformed cell never aborts the read.

use std::fs::File;
use std::path::Path;

use tradeagg_core::{Error, RawTrade, Result, REQUIRED_COLUMNS};
use tracing::{debug, info};

/// Column-addressable text table as read from the input file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from a header and rows. Short rows read as empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Header names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(idx).map(String::as_str).unwrap_or("")),
        )
    }

    /// Required columns absent from the header, in canonical order.
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| self.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect()
    }

    /// Project every row onto the required trade fields.
    pub fn trades(&self) -> Result<Vec<RawTrade>> {
        validate_columns(self)?;
        Ok(self.project())
    }

    /// Project every row onto the trade fields without checking the header.
    ///
    /// Absent columns read as empty cells.
    pub fn project(&self) -> Vec<RawTrade> {
        let idx = |name: &str| self.column_index(name).unwrap_or(usize::MAX);
        let (ts, user, client, symbol, side, qty, px) = (
            idx("timestamp"),
            idx("user_id"),
            idx("client_type"),
            idx("symbol"),
            idx("side"),
            idx("quantity"),
            idx("price"),
        );

        self.rows
            .iter()
            .map(|row| {
                let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
                RawTrade {
                    timestamp: cell(ts),
                    user_id: cell(user),
                    client_type: cell(client),
                    symbol: cell(symbol),
                    side: cell(side),
                    quantity: cell(qty),
                    price: cell(px),
                }
            })
            .collect()
    }
}

/// Read a CSV with a header row into a text table.
///
/// No column checks are made here; see [`validate_columns`].
pub fn read_table(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::file_not_found(path),
        _ => Error::Io(e),
    })?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(path = %path.display(), columns = headers.len(), rows = rows.len(), "read table");
    Ok(RawTable::new(headers, rows))
}

/// Fail if any required column is absent.
pub fn validate_columns(table: &RawTable) -> Result<()> {
    let missing = table.missing_columns();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingColumns(missing))
    }
}

/// Read the input file and check its schema.
///
/// Fails with [`Error::FileNotFound`] or [`Error::MissingColumns`]; nothing
/// else about the content is checked.
pub fn extract(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }
    let table = read_table(path)?;
    validate_columns(&table)?;
    info!(path = %path.display(), rows = table.len(), "extracted trades");
    Ok(table)
}
