//! Atomic counters for pool accounting
//!
//! Lock-free counters that can be safely updated from any thread. Each pool
//! manager owns one set.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic pool counters
#[derive(Debug, Default)]
pub struct PoolCounters {
    // Block metrics
    blocks_allocated: AtomicU64,
    blocks_leased: AtomicU64,
    blocks_returned: AtomicU64,
    blocks_discarded: AtomicU64,

    // Stream metrics
    streams_created: AtomicU64,
    streams_released: AtomicU64,
}

impl PoolCounters {
    pub const fn new() -> Self {
        Self {
            blocks_allocated: AtomicU64::new(0),
            blocks_leased: AtomicU64::new(0),
            blocks_returned: AtomicU64::new(0),
            blocks_discarded: AtomicU64::new(0),
            streams_created: AtomicU64::new(0),
            streams_released: AtomicU64::new(0),
        }
    }

    // Block tracking
    #[inline]
    pub fn block_allocated(&self) {
        self.blocks_allocated.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn block_leased(&self) {
        self.blocks_leased.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn block_returned(&self) {
        self.blocks_returned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn block_discarded(&self) {
        self.blocks_discarded.fetch_add(1, Ordering::Relaxed);
    }

    // Stream tracking
    #[inline]
    pub fn stream_created(&self) {
        self.streams_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn stream_released(&self) {
        self.streams_released.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self, block_size: usize, blocks_free: usize) -> PoolStats {
        let leased = self.blocks_leased.load(Ordering::Relaxed);
        let returned = self.blocks_returned.load(Ordering::Relaxed);
        let created = self.streams_created.load(Ordering::Relaxed);
        let released = self.streams_released.load(Ordering::Relaxed);

        PoolStats {
            block_size,
            blocks_allocated: self.blocks_allocated.load(Ordering::Relaxed),
            blocks_in_use: leased.saturating_sub(returned),
            blocks_free: blocks_free as u64,
            blocks_discarded: self.blocks_discarded.load(Ordering::Relaxed),
            streams_created: created,
            streams_released: released,
            streams_active: created.saturating_sub(released),
        }
    }
}

/// Snapshot of pool statistics for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub block_size: usize,
    pub blocks_allocated: u64,
    pub blocks_in_use: u64,
    pub blocks_free: u64,
    pub blocks_discarded: u64,
    pub streams_created: u64,
    pub streams_released: u64,
    pub streams_active: u64,
}

impl PoolStats {
    /// Bytes currently leased out to streams
    pub fn bytes_in_use(&self) -> u64 {
        self.blocks_in_use * self.block_size as u64
    }

    /// Bytes held in the free list
    pub fn bytes_free(&self) -> u64 {
        self.blocks_free * self.block_size as u64
    }
}
