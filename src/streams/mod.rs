//! Pooled stream utility
//!
//! [`MemoryStreamUtil`] is the long-lived entry point: it owns the
//! [`PoolHandle`] and offers acquisition of pre-filled pooled streams and
//! materialization of arbitrary sources into byte vectors.
//!
//! Hold one instance for the life of the application (e.g. in an `Arc`) and
//! drop every stream it returns as soon as you are done with it.

mod acquire;
mod encoding;
mod materialize;

use crate::config::PoolConfig;
use crate::error::Result;
use crate::pool::{PoolHandle, PoolManager};

/// Acquire and materialize pooled byte streams
#[derive(Debug, Default)]
pub struct MemoryStreamUtil {
    handle: PoolHandle,
}

impl MemoryStreamUtil {
    /// Create a utility whose pool is built from `config` on first use
    pub fn new(config: PoolConfig) -> Self {
        Self::from_handle(PoolHandle::new(config))
    }

    /// Create a utility over an existing handle
    pub fn from_handle(handle: PoolHandle) -> Self {
        Self { handle }
    }

    /// The underlying handle
    pub fn handle(&self) -> &PoolHandle {
        &self.handle
    }

    /// Get the shared pool manager. Rarely needed directly.
    pub async fn get_manager(&self) -> Result<PoolManager> {
        self.handle.get_manager_async().await
    }

    /// Blocking form of [`get_manager`](Self::get_manager)
    pub fn get_manager_sync(&self) -> Result<PoolManager> {
        self.handle.get_manager()
    }
}
