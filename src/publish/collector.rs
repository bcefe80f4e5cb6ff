//! Aggregation of partition summaries
//!
//! Summaries arrive in plan order from a single consumer. The collector owns its state
//! exclusively, so no locking is needed; completeness is checked once at the barrier.

use super::writer::PartitionSummary;
use crate::error::{PublishError, PublishResult};
use tracing::error;

/// Totals of a complete set of partitions
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTotals {
    pub summaries: Vec<PartitionSummary>,
    pub total_rows: usize,
    pub total_clients: usize,
}

/// Accumulates partition summaries for one job
#[derive(Debug)]
pub struct AggregateCollector {
    expected_rows: usize,
    summaries: Vec<PartitionSummary>,
    total_rows: usize,
}

impl AggregateCollector {
    pub fn new(expected_rows: usize) -> Self {
        Self {
            expected_rows,
            summaries: Vec::new(),
            total_rows: 0,
        }
    }

    pub fn record(&mut self, summary: PartitionSummary) {
        self.total_rows += summary.row_count;
        self.summaries.push(summary);
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Close the collection, checking that every input row was accounted for
    pub fn finish(self) -> PublishResult<AggregateTotals> {
        if self.total_rows != self.expected_rows {
            error!(
                "Partition row counts sum to {} but the result set has {} rows",
                self.total_rows, self.expected_rows
            );
            return Err(PublishError::AggregationMismatch {
                expected: self.expected_rows,
                aggregated: self.total_rows,
            });
        }

        Ok(AggregateTotals {
            total_clients: self.summaries.len(),
            total_rows: self.total_rows,
            summaries: self.summaries,
        })
    }
}
