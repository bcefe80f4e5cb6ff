//! Configuration management
//!
//! Job parameters come from the launching process as a TOML file, environment
//! variables, or both; environment values win.

pub mod counters;
pub mod job;
pub mod options;

pub use counters::{
    build_counter_configs, parse_counter_ids, CounterConfig, CounterDefaults, CounterFlags,
};
pub use job::JobConfig;
pub use options::PublishOptions;
