//! Pool manager handle
//!
//! Lazily builds one [`PoolManager`] and hands the same instance to every
//! caller. Construction is double-checked under a single `tokio` mutex that
//! both the blocking and the async accessor use.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::manager::PoolManager;
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};

type ManagerFactory = Box<dyn Fn() -> Result<PoolManager> + Send + Sync>;

/// Owns the single shared pool manager
pub struct PoolHandle {
    manager: OnceLock<PoolManager>,
    init_lock: Mutex<()>,
    failed_builds: AtomicUsize,
    factory: ManagerFactory,
}

impl PoolHandle {
    /// Create a handle that builds a manager from `config` on first use
    pub fn new(config: PoolConfig) -> Self {
        Self::with_factory(move || PoolManager::new(config.clone()))
    }

    /// Create a handle with a custom construction routine
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<PoolManager> + Send + Sync + 'static,
    {
        Self {
            manager: OnceLock::new(),
            init_lock: Mutex::new(()),
            failed_builds: AtomicUsize::new(0),
            factory: Box::new(factory),
        }
    }

    /// Whether the manager has been built
    pub fn is_initialized(&self) -> bool {
        self.manager.get().is_some()
    }

    /// Get the manager, blocking briefly if another caller is building it.
    ///
    /// Prefer [`get_manager_async`](Self::get_manager_async) from async code.
    /// A build that fails while this call waits is reported here as
    /// [`PoolError::Construction`] instead of waiting for the lock, which may
    /// have been handed to a task queued on this same thread.
    pub fn get_manager(&self) -> Result<PoolManager> {
        if let Some(manager) = self.manager.get() {
            return Ok(manager.clone());
        }

        let failures_seen = self.failed_builds.load(Ordering::Acquire);
        let _guard = loop {
            match self.init_lock.try_lock() {
                Ok(guard) => break guard,
                Err(_) => {
                    if let Some(manager) = self.manager.get() {
                        return Ok(manager.clone());
                    }
                    if self.failed_builds.load(Ordering::Acquire) != failures_seen {
                        return Err(PoolError::Construction(
                            "concurrent pool manager construction failed".into(),
                        ));
                    }
                    std::thread::yield_now();
                }
            }
        };

        self.build_locked()
    }

    /// Get the manager, suspending while another caller is building it
    pub async fn get_manager_async(&self) -> Result<PoolManager> {
        if let Some(manager) = self.manager.get() {
            return Ok(manager.clone());
        }

        let _guard = self.init_lock.lock().await;
        self.build_locked()
    }

    // Caller holds `init_lock`
    fn build_locked(&self) -> Result<PoolManager> {
        if let Some(manager) = self.manager.get() {
            return Ok(manager.clone());
        }

        let manager = (self.factory)().map_err(|e| {
            self.failed_builds.fetch_add(1, Ordering::AcqRel);
            warn!(error = %e, "Pool manager construction failed");
            match e {
                PoolError::Construction(_) => e,
                other => PoolError::Construction(other.to_string()),
            }
        })?;

        let _ = self.manager.set(manager.clone());
        debug!(block_size = manager.block_size(), "Pool manager initialized");
        Ok(manager)
    }
}

impl Default for PoolHandle {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl std::fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolHandle")
            .field("manager", &self.manager.get())
            .finish_non_exhaustive()
    }
}
