//! Block pool manager
//!
//! Fixed-size blocks are leased from a lock-free free list and returned when
//! the owning stream is dropped or closed. Blocks that do not fit back into
//! the free list are released to the allocator.

use crossbeam::queue::ArrayQueue;
use std::sync::Arc;
use tracing::{debug, trace};

use super::stream::PooledStream;
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::metrics::{self, PoolCounters, PoolStats};

/// Inner pool state (shared across clones and leased streams)
pub(crate) struct PoolInner {
    config: PoolConfig,
    free_blocks: ArrayQueue<Box<[u8]>>,
    counters: PoolCounters,
}

impl PoolInner {
    pub(crate) fn block_size(&self) -> usize {
        self.config.block_size
    }

    pub(crate) fn stream_limit(&self) -> Option<u64> {
        self.config.stream_limit()
    }

    /// Take a block from the free list, allocating one if it is empty.
    /// Reused blocks are not cleared.
    pub(crate) fn lease_block(&self) -> Box<[u8]> {
        self.counters.block_leased();
        match self.free_blocks.pop() {
            Some(block) => block,
            None => {
                self.counters.block_allocated();
                vec![0u8; self.config.block_size].into_boxed_slice()
            }
        }
    }

    /// Return blocks to the free list
    pub(crate) fn return_blocks(&self, blocks: Vec<Box<[u8]>>) {
        for block in blocks {
            self.counters.block_returned();
            if self.free_blocks.push(block).is_err() {
                self.counters.block_discarded();
                trace!("free list full, discarding block");
            }
        }
    }

    pub(crate) fn stream_created(&self) {
        self.counters.stream_created();
    }

    pub(crate) fn stream_released(&self) {
        self.counters.stream_released();
    }
}

/// Shared authority that leases and reclaims pooled streams.
///
/// Cloning is cheap; every clone refers to the same pool.
#[derive(Clone)]
pub struct PoolManager {
    inner: Arc<PoolInner>,
}

impl PoolManager {
    /// Build a pool manager, preallocating blocks if configured
    pub fn new(config: PoolConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PoolError::Construction(e.to_string()))?;

        let inner = PoolInner {
            free_blocks: ArrayQueue::new(config.max_free_blocks),
            counters: PoolCounters::new(),
            config,
        };

        for _ in 0..inner.config.preallocate_blocks {
            let block = vec![0u8; inner.config.block_size].into_boxed_slice();
            inner.counters.block_allocated();
            let _ = inner.free_blocks.push(block);
        }

        metrics::describe_pool_metrics();
        debug!(
            block_size = inner.config.block_size,
            max_free_blocks = inner.config.max_free_blocks,
            preallocated = inner.config.preallocate_blocks,
            "Pool manager created"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Lease an empty stream; blocks are leased lazily as it grows
    pub fn get_stream(&self) -> PooledStream {
        PooledStream::new(self.inner.clone())
    }

    /// Lease a stream with capacity for at least `required` bytes.
    ///
    /// Its length is still 0; only blocks are reserved.
    pub fn get_stream_sized(&self, required: usize) -> Result<PooledStream> {
        let mut stream = self.get_stream();
        stream.reserve(required)?;
        Ok(stream)
    }

    /// Pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Size of each pooled block
    pub fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    /// Whether two managers share the same pool
    pub fn ptr_eq(&self, other: &PoolManager) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        self.inner
            .counters
            .snapshot(self.inner.config.block_size, self.inner.free_blocks.len())
    }

    /// Push the current stats into the `metrics` facade
    pub fn publish_metrics(&self) {
        metrics::publish_stats(&self.stats());
    }
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager")
            .field("config", &self.inner.config)
            .field("free_blocks", &self.inner.free_blocks.len())
            .finish()
    }
}
