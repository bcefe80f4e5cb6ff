//! Common test utilities and helpers
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use ipp_publisher::publish::{FixedClock, JobContext, JobParameters};
use ipp_publisher::results::{FieldValue, ResultRow, ResultSet};
use ipp_publisher::storage::{JobStatusRecord, MemoryObjectStore, MemoryStatusStore};
use std::sync::Arc;

pub const JOB_ID: &str = "ipp-20240115-001";

pub fn parameters() -> JobParameters {
    JobParameters {
        price_threshold: 3000.0,
        material_status: "Disponible".to_string(),
        counters: "7051602,7051603".to_string(),
    }
}

/// Context with a clock frozen at 2024-01-15T10:30:00Z
pub fn fixed_context() -> JobContext {
    JobContext::new(JOB_ID, parameters())
        .unwrap()
        .with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        )))
}

pub fn row(client: impl Into<FieldValue>, amount: impl Into<FieldValue>) -> ResultRow {
    ResultRow::new()
        .with("Cliente", client)
        .with("Material", "MAT-001")
        .with("Importe", amount)
        .with("Factor_4", 1.25)
}

/// Client A with amounts 100 and 200, client B with 50
pub fn three_row_set() -> ResultSet {
    ResultSet::from_rows(vec![row("A", 100i64), row("B", 50i64), row("A", 200i64)])
}

/// Memory stores with a "running" status record already created for [`JOB_ID`]
pub async fn memory_stores() -> (Arc<MemoryObjectStore>, Arc<MemoryStatusStore>) {
    let statuses = Arc::new(MemoryStatusStore::new());
    statuses
        .create_record(JobStatusRecord::new(JOB_ID, "running"))
        .await;
    (Arc::new(MemoryObjectStore::new("invenadro-ipp-raw")), statuses)
}

pub fn partition_key(client: &str) -> String {
    format!("results/{}/clients/client_{}.json", JOB_ID, client)
}

pub fn manifest_key() -> String {
    format!("results/{}/metadata.json", JOB_ID)
}
