//! Loading result sets exported by the compute stage

use super::row::ResultRow;
use super::set::{ColumnMapping, ResultSet};
use super::value::FieldValue;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// On-disk format of an exported result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    /// A JSON array of row objects
    Json,
    /// CSV with a header line
    Csv,
}

impl ResultFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Load a result set from a file
pub async fn load_result_set(
    path: &Path,
    format: Option<ResultFormat>,
    columns: ColumnMapping,
) -> Result<ResultSet> {
    let format = format
        .or_else(|| ResultFormat::from_path(path))
        .ok_or_else(|| {
            anyhow!(
                "Cannot determine result format of {}; pass --format",
                path.display()
            )
        })?;

    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read result set from {}", path.display()))?;

    let rows = match format {
        ResultFormat::Json => parse_json_rows(&content)?,
        ResultFormat::Csv => parse_csv_rows(&content)?,
    };

    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(ResultSet::new(rows, columns))
}

/// Parse a JSON array of row objects
pub fn parse_json_rows(content: &[u8]) -> Result<Vec<ResultRow>> {
    serde_json::from_slice(content).context("Result set is not a JSON array of row objects")
}

/// Parse CSV rows, inferring cell types
pub fn parse_csv_rows(content: &[u8]) -> Result<Vec<ResultRow>> {
    let mut reader = csv::Reader::from_reader(content);
    let headers = reader
        .headers()
        .context("Failed to read CSV header")?
        .clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", index + 1))?;
        let mut row = ResultRow::new();
        for (name, cell) in headers.iter().zip(record.iter()) {
            row.set(name, FieldValue::infer(cell));
        }
        rows.push(row);
    }
    Ok(rows)
}
