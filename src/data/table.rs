//! Delimiter-separated input tables.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{RaceError, RaceResult};

/// Role a configured column plays in the race.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum ColumnRole {
    Date,
    Value,
    Label,
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Date => "Date",
            Self::Value => "Value",
            Self::Label => "Label",
        })
    }
}

/// A configured column name that is absent from the table header.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct MissingColumn {
    pub role: ColumnRole,
    pub given: String,
}

/// One consolidated, user-facing message for a set of missing columns.
pub fn missing_columns_message(missing: &[MissingColumn]) -> String {
    let lines = missing
        .iter()
        .map(|m| format!("{} header name isn't called {}", m.role, m.given))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{lines}\n\nPlease ensure your header names exist in the csv file.")
}

/// Column names as configured by the user.
#[derive(Clone, Copy, Debug)]
pub struct ColumnNames<'a> {
    pub date: &'a str,
    pub label: &'a str,
    pub value: &'a str,
}

/// Resolved header positions of the three race columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnIndices {
    pub date: usize,
    pub label: usize,
    pub value: usize,
}

/// Raw table: header plus string records, as read from disk.
#[derive(Clone, Debug, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Accepts the extensions the race treats as tabular text.
pub fn is_tabular(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "csv" | "tsv" | "txt"))
        .unwrap_or(false)
}

impl Table {
    pub fn read(path: &Path, delimiter: u8) -> RaceResult<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open input table '{}'", path.display()))?;
        Self::from_reader(file, delimiter)
    }

    pub fn from_reader(reader: impl std::io::Read, delimiter: u8) -> RaceResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| RaceError::validation(format!("failed to read table header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| {
                RaceError::validation(format!("malformed table row {}: {e}", i + 2))
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        tracing::debug!(columns = headers.len(), rows = rows.len(), "read input table");
        Ok(Self { headers, rows })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Resolve the configured columns, reporting every missing one at once.
    pub fn check_columns(&self, names: ColumnNames<'_>) -> RaceResult<ColumnIndices> {
        let mut missing = Vec::new();
        let mut lookup = |role: ColumnRole, given: &str| {
            let idx = self.position(given);
            if idx.is_none() {
                missing.push(MissingColumn {
                    role,
                    given: given.to_string(),
                });
            }
            idx
        };
        let date = lookup(ColumnRole::Date, names.date);
        let value = lookup(ColumnRole::Value, names.value);
        let label = lookup(ColumnRole::Label, names.label);

        match (date, label, value) {
            (Some(date), Some(label), Some(value)) => Ok(ColumnIndices { date, label, value }),
            _ => Err(RaceError::MissingColumns(missing)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/table.rs"]
mod tests;
