//! The job context threaded through every stage

use super::layout::validate_segment;
use crate::config::{build_counter_configs, CounterConfig, CounterDefaults, JobConfig};
use crate::error::{PublishError, PublishResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Source of generation timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Input parameters of the job, recorded verbatim in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobParameters {
    #[serde(rename = "limite_precio")]
    pub price_threshold: f64,
    #[serde(rename = "estatus_material")]
    pub material_status: String,
    /// Counter list as supplied, comma-separated
    #[serde(rename = "mostradores")]
    pub counters: String,
}

/// Explicit per-run context: job identity, parameters, derived counter
/// configuration and the clock.
#[derive(Clone)]
pub struct JobContext {
    job_id: String,
    parameters: JobParameters,
    counter_configs: Arc<[CounterConfig]>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("job_id", &self.job_id)
            .field("parameters", &self.parameters)
            .field("counters", &self.counter_configs.len())
            .finish()
    }
}

impl JobContext {
    /// Validate and build a context with default counter settings
    pub fn new(job_id: impl Into<String>, parameters: JobParameters) -> PublishResult<Self> {
        Self::with_counter_defaults(job_id, parameters, &CounterDefaults::default())
    }

    pub fn with_counter_defaults(
        job_id: impl Into<String>,
        parameters: JobParameters,
        defaults: &CounterDefaults,
    ) -> PublishResult<Self> {
        let job_id = job_id.into();
        validate_segment("job_id", &job_id)?;

        if !parameters.price_threshold.is_finite() {
            return Err(PublishError::invalid_field(
                "price_threshold",
                format!("price threshold must be finite, got {}", parameters.price_threshold),
            ));
        }

        let counter_configs = build_counter_configs(&parameters.counters, defaults);
        if counter_configs.is_empty() {
            return Err(PublishError::invalid_field(
                "counters",
                "counter list must contain at least one identifier",
            ));
        }

        Ok(Self {
            job_id,
            parameters,
            counter_configs,
            clock: Arc::new(SystemClock),
        })
    }

    /// Build the context from loaded job configuration
    pub fn from_config(config: &JobConfig) -> PublishResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(PublishError::configuration("bucket must be set"));
        }
        if config.status_table.trim().is_empty() {
            return Err(PublishError::configuration("status_table must be set"));
        }

        Self::with_counter_defaults(
            config.job_id.clone(),
            JobParameters {
                price_threshold: config.price_threshold,
                material_status: config.material_status.clone(),
                counters: config.counters.clone(),
            },
            &config.counter_defaults,
        )
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn counter_configs(&self) -> &[CounterConfig] {
        &self.counter_configs
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
