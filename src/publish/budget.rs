//! Time limits for storage operations

use crate::storage::{StorageError, StorageResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Per-operation timeout combined with an overall deadline.
///
/// Each operation gets whichever is shorter: the per-operation timeout or the time left
/// until the deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationBudget {
    per_operation: Option<Duration>,
    deadline: Option<Instant>,
}

impl OperationBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Budget whose deadline is `job_deadline` from now
    pub fn starting_now(per_operation: Option<Duration>, job_deadline: Option<Duration>) -> Self {
        Self {
            per_operation,
            deadline: job_deadline.map(|d| Instant::now() + d),
        }
    }

    /// Limit for an operation starting now
    pub fn limit(&self) -> Option<Duration> {
        let remaining = self
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));
        match (self.per_operation, remaining) {
            (Some(timeout), Some(remaining)) => Some(timeout.min(remaining)),
            (timeout, remaining) => timeout.or(remaining),
        }
    }

    /// Run a storage operation under the current limit
    pub async fn run<T, F>(&self, operation: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        match self.limit() {
            Some(limit) => tokio::time::timeout(limit, operation)
                .await
                .map_err(|_| StorageError::Timeout(limit))?,
            None => operation.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_has_no_limit() {
        assert_eq!(OperationBudget::unlimited().limit(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_is_shorter_of_timeout_and_deadline() {
        let budget =
            OperationBudget::starting_now(Some(Duration::from_secs(10)), Some(Duration::from_secs(30)));
        assert_eq!(budget.limit(), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(25)).await;
        assert_eq!(budget.limit(), Some(Duration::from_secs(5)));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(budget.limit(), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_maps_elapsed_to_timeout() {
        let budget = OperationBudget::starting_now(Some(Duration::from_millis(50)), None);
        let result: StorageResult<()> = budget
            .run(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(StorageError::Timeout(d)) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_run_passes_through_result() {
        let budget = OperationBudget::starting_now(Some(Duration::from_secs(5)), None);
        assert_eq!(budget.run(async { Ok(7) }).await.unwrap(), 7);
    }
}
