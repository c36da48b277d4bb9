//! Metrics and observability
//!
//! Atomic counters on the hot path, published through the `metrics` facade
//! on demand.

mod counters;
mod recorder;

pub use counters::{PoolCounters, PoolStats};
pub use recorder::{describe_pool_metrics, publish_stats};
