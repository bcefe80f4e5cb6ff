//! The computed result set handed to the publication pipeline

use super::row::ResultRow;
use super::value::FieldValue;
use serde::{Deserialize, Serialize};

/// Names of the columns the pipeline reads.
///
/// Every other column is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Client identifier, the partition key
    #[serde(default = "default_client_column")]
    pub client: String,

    /// Monetary amount summed per partition
    #[serde(default = "default_amount_column")]
    pub amount: String,

    /// Factor value averaged per partition
    #[serde(default = "default_factor_column")]
    pub factor: String,
}

fn default_client_column() -> String {
    "Cliente".to_string()
}

fn default_amount_column() -> String {
    "Importe".to_string()
}

fn default_factor_column() -> String {
    "Factor_4".to_string()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            client: default_client_column(),
            amount: default_amount_column(),
            factor: default_factor_column(),
        }
    }
}

static NULL: FieldValue = FieldValue::Null;

/// Read-only result set shared by every partition writer
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    rows: Vec<ResultRow>,
    columns: ColumnMapping,
}

impl ResultSet {
    pub fn new(rows: Vec<ResultRow>, columns: ColumnMapping) -> Self {
        Self { rows, columns }
    }

    /// Result set using the default column names
    pub fn from_rows(rows: Vec<ResultRow>) -> Self {
        Self::new(rows, ColumnMapping::default())
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Client identifier of a row; a missing column reads as null
    pub fn client_of<'a>(&self, row: &'a ResultRow) -> &'a FieldValue {
        row.get(&self.columns.client).unwrap_or(&NULL)
    }

    pub fn amount_of(&self, row: &ResultRow) -> Option<f64> {
        row.get(&self.columns.amount).and_then(FieldValue::as_f64)
    }

    pub fn factor_of(&self, row: &ResultRow) -> Option<f64> {
        row.get(&self.columns.factor).and_then(FieldValue::as_f64)
    }
}
