//! Metrics facade publication
//!
//! Pushes pool snapshots into whatever recorder the application installed.
//! Without a recorder these calls are no-ops.

use metrics::{counter, describe_counter, describe_gauge, gauge};

use super::counters::PoolStats;

/// Register metric descriptions with the installed recorder
pub fn describe_pool_metrics() {
    describe_gauge!("memstream_blocks_in_use", "Blocks currently leased to streams");
    describe_gauge!("memstream_blocks_free", "Blocks retained in the free list");
    describe_gauge!("memstream_streams_active", "Streams not yet released");
    describe_counter!("memstream_blocks_allocated", "Blocks allocated from the heap");
    describe_counter!("memstream_blocks_discarded", "Returned blocks dropped because the free list was full");
    describe_counter!("memstream_streams_created", "Total streams leased");
}

/// Publish a pool snapshot
pub fn publish_stats(stats: &PoolStats) {
    gauge!("memstream_blocks_in_use").set(stats.blocks_in_use as f64);
    gauge!("memstream_blocks_free").set(stats.blocks_free as f64);
    gauge!("memstream_streams_active").set(stats.streams_active as f64);

    counter!("memstream_blocks_allocated").absolute(stats.blocks_allocated);
    counter!("memstream_blocks_discarded").absolute(stats.blocks_discarded);
    counter!("memstream_streams_created").absolute(stats.streams_created);
}
