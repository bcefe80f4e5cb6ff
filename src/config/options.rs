//! Execution options for a publication run

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How partition writes are scheduled and bounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishOptions {
    /// Maximum partition writes in flight
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Limit for each individual storage operation
    #[serde(with = "humantime_serde", default = "default_partition_timeout")]
    pub partition_timeout: Option<Duration>,

    /// Limit for the whole run, measured from its start
    #[serde(with = "humantime_serde", default = "default_job_deadline")]
    pub job_deadline: Option<Duration>,

    /// Mark the status record `failed` when a run aborts
    #[serde(default = "default_true")]
    pub record_failure_status: bool,
}

fn default_max_parallel() -> usize {
    4
}

fn default_partition_timeout() -> Option<Duration> {
    Some(Duration::from_secs(60))
}

fn default_job_deadline() -> Option<Duration> {
    Some(Duration::from_secs(30 * 60))
}

fn default_true() -> bool {
    true
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            partition_timeout: default_partition_timeout(),
            job_deadline: default_job_deadline(),
            record_failure_status: true,
        }
    }
}

impl PublishOptions {
    /// One partition at a time, no time limits, status left untouched on failure
    pub fn sequential() -> Self {
        Self {
            max_parallel: 1,
            partition_timeout: None,
            job_deadline: None,
            record_failure_status: false,
        }
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn with_partition_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.partition_timeout = timeout;
        self
    }

    pub fn with_job_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.job_deadline = deadline;
        self
    }

    pub fn with_failure_status(mut self, enabled: bool) -> Self {
        self.record_failure_status = enabled;
        self
    }

    /// Effective parallelism, never below one
    pub fn parallelism(&self) -> usize {
        self.max_parallel.max(1)
    }
}
