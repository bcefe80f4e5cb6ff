//! Partition planning
//!
//! Derives the distinct client identifiers of a result set in first-seen order. Planning
//! is pure: no storage is touched, so a bad row is reported before anything is written.

use super::layout::validate_client_id;
use crate::error::{PublishError, PublishResult};
use crate::results::{FieldValue, ResultSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A client identifier in its canonical string form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Canonical key for a client value.
    ///
    /// Text is taken as-is; integral numbers use their integer form so that `7051602`,
    /// `7051602.0` and `"7051602"` land in the same partition. Null and non-identifier
    /// values are rejected.
    pub fn from_value(value: &FieldValue) -> Result<Self, String> {
        let canonical = match value {
            FieldValue::Null => return Err("client identifier is null".to_string()),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                format!("{}", *f as i64)
            }
            FieldValue::Decimal(d) if d.fract() == Decimal::ZERO => d.trunc().normalize().to_string(),
            other => return Err(format!("unsupported client identifier {:?}", other)),
        };
        validate_client_id("client", &canonical).map_err(|e| match e {
            PublishError::Validation { message, .. } => message,
            other => other.to_string(),
        })?;
        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Ordered, distinct partition keys of one result set
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionPlan {
    keys: Vec<PartitionKey>,
    total_rows: usize,
}

impl PartitionPlan {
    pub fn keys(&self) -> &[PartitionKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Row count of the planned result set
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }
}

/// Running sums of one planned partition
#[derive(Debug, Default, Clone, Copy)]
struct PartitionSums {
    amount: f64,
    factor: f64,
}

/// Plan the partitions of a result set.
///
/// Fails with a validation error when the set is empty, any row lacks a usable
/// client identifier, or a partition's amount or factor sum does not fit an `f64`.
pub fn plan_partitions(results: &ResultSet) -> PublishResult<PartitionPlan> {
    if results.is_empty() {
        return Err(PublishError::validation("result set is empty; nothing to publish"));
    }

    let columns = results.columns();
    let mut index_of: HashMap<PartitionKey, usize> = HashMap::new();
    let mut keys = Vec::new();
    let mut sums: Vec<PartitionSums> = Vec::new();

    for (index, row) in results.rows().iter().enumerate() {
        let key = PartitionKey::from_value(results.client_of(row)).map_err(|reason| {
            PublishError::invalid_field(
                columns.client.clone(),
                format!("row {}: {}", index, reason),
            )
        })?;
        let slot = *index_of.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            sums.push(PartitionSums::default());
            sums.len() - 1
        });

        let partition = &mut sums[slot];
        if let Some(amount) = results.amount_of(row) {
            partition.amount += amount;
            ensure_finite(&columns.amount, index, &keys[slot], partition.amount)?;
        }
        if let Some(factor) = results.factor_of(row) {
            partition.factor += factor;
            ensure_finite(&columns.factor, index, &keys[slot], partition.factor)?;
        }
    }

    Ok(PartitionPlan {
        keys,
        total_rows: results.len(),
    })
}

fn ensure_finite(column: &str, row: usize, key: &PartitionKey, sum: f64) -> PublishResult<()> {
    if sum.is_finite() {
        return Ok(());
    }
    Err(PublishError::invalid_field(
        column,
        format!("row {}: sum of {} for client {} overflows", row, column, key),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ResultRow;

    fn row(client: impl Into<FieldValue>) -> ResultRow {
        ResultRow::new().with("Cliente", client).with("Importe", 1i64)
    }

    #[test]
    fn test_first_seen_order() {
        let set = ResultSet::from_rows(vec![row("B"), row("A"), row("B"), row("C"), row("A")]);
        let plan = plan_partitions(&set).unwrap();

        let keys: Vec<_> = plan.keys().iter().map(PartitionKey::as_str).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
        assert_eq!(plan.total_rows(), 5);
    }

    #[test]
    fn test_empty_result_set_is_validation_error() {
        let err = plan_partitions(&ResultSet::default()).unwrap_err();
        assert!(matches!(err, PublishError::Validation { .. }));
    }

    #[test]
    fn test_null_client_is_validation_error() {
        let set = ResultSet::from_rows(vec![row("A"), row(FieldValue::Null)]);
        let err = plan_partitions(&set).unwrap_err();

        match err {
            PublishError::Validation { message, field } => {
                assert_eq!(field.as_deref(), Some("Cliente"));
                assert!(message.contains("row 1"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_client_column_is_validation_error() {
        let set = ResultSet::from_rows(vec![ResultRow::new().with("Importe", 1i64)]);
        assert!(plan_partitions(&set).is_err());
    }

    #[test]
    fn test_numeric_and_text_ids_share_canonical_form() {
        assert_eq!(
            PartitionKey::from_value(&FieldValue::Integer(7051602)).unwrap(),
            PartitionKey::from("7051602")
        );
        assert_eq!(
            PartitionKey::from_value(&FieldValue::Float(7051602.0)).unwrap(),
            PartitionKey::from("7051602")
        );
        assert_eq!(
            PartitionKey::from_value(&FieldValue::decimal("7051602.00").unwrap()).unwrap(),
            PartitionKey::from("7051602")
        );
        assert!(PartitionKey::from_value(&FieldValue::Float(1.5)).is_err());
        assert!(PartitionKey::from_value(&FieldValue::Bool(true)).is_err());
    }

    #[test]
    fn test_unsafe_client_id_rejected() {
        assert!(PartitionKey::from_value(&FieldValue::from("a/b")).is_err());
        assert!(PartitionKey::from_value(&FieldValue::from("")).is_err());
    }

    #[test]
    fn test_amount_overflow_is_validation_error() {
        let set = ResultSet::from_rows(vec![
            ResultRow::new().with("Cliente", "A").with("Importe", 1.0e308),
            ResultRow::new().with("Cliente", "B").with("Importe", 1.0e308),
            ResultRow::new().with("Cliente", "A").with("Importe", 1.0e308),
        ]);
        let err = plan_partitions(&set).unwrap_err();

        match err {
            PublishError::Validation { message, field } => {
                assert_eq!(field.as_deref(), Some("Importe"));
                assert!(message.contains("row 2"));
                assert!(message.contains("client A"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_factor_overflow_is_validation_error() {
        let set = ResultSet::from_rows(vec![
            row("A").with("Factor_4", f64::MAX),
            row("A").with("Factor_4", f64::MAX),
        ]);
        let err = plan_partitions(&set).unwrap_err();
        assert!(matches!(err, PublishError::Validation { field: Some(ref f), .. } if f == "Factor_4"));
    }

    #[test]
    fn test_large_sums_across_clients_are_fine() {
        let set = ResultSet::from_rows(vec![
            ResultRow::new().with("Cliente", "A").with("Importe", 1.0e308),
            ResultRow::new().with("Cliente", "B").with("Importe", 1.0e308),
        ]);
        assert_eq!(plan_partitions(&set).unwrap().len(), 2);
    }

    #[test]
    fn test_client_id_too_long_for_file_name_rejected() {
        let set = ResultSet::from_rows(vec![row("x".repeat(244))]);
        let err = plan_partitions(&set).unwrap_err();
        assert!(matches!(err, PublishError::Validation { .. }));
        assert!(err.to_string().contains("exceeds 243 bytes"));

        let set = ResultSet::from_rows(vec![row("x".repeat(243))]);
        assert!(plan_partitions(&set).is_ok());
    }
}
