//! Result publication pipeline
//!
//! PartitionPlanner → PartitionWriter × N → AggregateCollector → ManifestBuilder →
//! CompletionSignaler → StatusRecorder, driven by [`PublishPipeline`].

pub mod budget;
pub mod collector;
pub mod context;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod planner;
pub mod signaler;
pub mod status;
pub mod verify;
pub mod writer;

pub use budget::OperationBudget;
pub use collector::{AggregateCollector, AggregateTotals};
pub use context::{Clock, FixedClock, JobContext, JobParameters, SystemClock};
pub use manifest::{JobManifest, ManifestBuilder, ManifestStatus};
pub use pipeline::{PublishPipeline, PublishReport};
pub use planner::{plan_partitions, PartitionKey, PartitionPlan};
pub use signaler::CompletionSignaler;
pub use status::StatusRecorder;
pub use verify::{verify_publication, VerificationReport};
pub use writer::{ArtifactHeader, PartitionArtifact, PartitionMetrics, PartitionSummary, PartitionWriter};
