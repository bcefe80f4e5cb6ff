//! DynamoDB status store implementation

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::storage::{
    config::StorageConfig,
    error::{StorageError, StorageResult},
    traits::StatusStore,
    types::{JobStatusRecord, JobStatusUpdate},
};

/// Status records in a DynamoDB table keyed by `job_id`
pub struct DynamoStatusStore {
    client: Arc<Client>,
    table: String,
}

impl DynamoStatusStore {
    pub async fn new(config: &StorageConfig, table: &str) -> StorageResult<Self> {
        info!("Initializing DynamoDB status store for table {}", table);

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));
        if let Some(ref endpoint) = config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Ok(Self {
            client: Arc::new(Client::new(&aws_config)),
            table: table.to_string(),
        })
    }
}

/// Build the `SET` expression for an update; only fields the update carries are written
fn update_expression(update: &JobStatusUpdate) -> (String, HashMap<String, AttributeValue>) {
    let mut clauses = vec!["#s = :status".to_string(), "updated_at = :time".to_string()];
    let mut values = HashMap::new();
    values.insert(
        ":status".to_string(),
        AttributeValue::S(update.status.as_str().to_string()),
    );
    values.insert(
        ":time".to_string(),
        AttributeValue::S(update.updated_at.to_rfc3339()),
    );

    if let Some(ref location) = update.result_location {
        clauses.push("s3_result_path = :path".to_string());
        values.insert(":path".to_string(), AttributeValue::S(location.clone()));
    }
    if let Some(clients) = update.total_clients {
        clauses.push("total_clientes = :clientes".to_string());
        values.insert(":clientes".to_string(), AttributeValue::N(clients.to_string()));
    }
    if let Some(rows) = update.total_rows {
        clauses.push("total_registros = :registros".to_string());
        values.insert(":registros".to_string(), AttributeValue::N(rows.to_string()));
    }
    if let Some(ref message) = update.error_message {
        clauses.push("error_message = :error".to_string());
        values.insert(":error".to_string(), AttributeValue::S(message.clone()));
    }

    (format!("SET {}", clauses.join(", ")), values)
}

fn attribute_to_json(value: &AttributeValue) -> serde_json::Value {
    match value {
        AttributeValue::S(s) => serde_json::Value::String(s.clone()),
        AttributeValue::N(n) => n
            .parse::<i64>()
            .map(serde_json::Value::from)
            .or_else(|_| n.parse::<f64>().map(serde_json::Value::from))
            .unwrap_or_else(|_| serde_json::Value::String(n.clone())),
        AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
        AttributeValue::Null(_) => serde_json::Value::Null,
        AttributeValue::L(items) => items.iter().map(attribute_to_json).collect(),
        AttributeValue::M(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), attribute_to_json(v)))
                .collect(),
        ),
        AttributeValue::Ss(items) => items.clone().into(),
        other => serde_json::Value::String(format!("{:?}", other)),
    }
}

fn item_to_record(item: &HashMap<String, AttributeValue>) -> StorageResult<JobStatusRecord> {
    let object: serde_json::Map<String, serde_json::Value> = item
        .iter()
        .map(|(k, v)| (k.clone(), attribute_to_json(v)))
        .collect();
    serde_json::from_value(serde_json::Value::Object(object)).map_err(StorageError::serialization)
}

#[async_trait]
impl StatusStore for DynamoStatusStore {
    async fn update_status(&self, job_id: &str, update: &JobStatusUpdate) -> StorageResult<()> {
        debug!("Updating {} in {} to {}", job_id, self.table, update.status);

        let (expression, values) = update_expression(update);
        self.client
            .update_item()
            .table_name(&self.table)
            .key("job_id", AttributeValue::S(job_id.to_string()))
            .update_expression(expression)
            .condition_expression("attribute_exists(job_id)")
            .expression_attribute_names("#s", "status")
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    StorageError::not_found(format!("job status record {}", job_id))
                } else {
                    StorageError::backend(format!(
                        "Failed to update status of {}: {}",
                        job_id, service_error
                    ))
                }
            })?;

        Ok(())
    }

    async fn get_status(&self, job_id: &str) -> StorageResult<Option<JobStatusRecord>> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("job_id", AttributeValue::S(job_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| {
                StorageError::backend(format!("Failed to read status of {}: {}", job_id, e))
            })?;

        response.item().map(item_to_record).transpose()
    }

    fn backend_type(&self) -> &'static str {
        "dynamodb"
    }
}
