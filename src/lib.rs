//! memstream-pool - Pooled in-memory byte streams
//!
//! This library provides reusable, block-pooled byte streams for transient
//! serialization and I/O staging, plus materialization of arbitrary readable
//! streams into exact-size byte vectors with a zero-copy fast path for
//! in-memory sources.

pub mod config;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod source;
pub mod streams;
pub mod util;

pub use config::{Config, PoolConfig};
pub use error::{PoolError, Result};
pub use pool::{PoolHandle, PoolManager, PooledStream};
pub use source::{ByteSource, InMemory, ReaderSource};
pub use streams::MemoryStreamUtil;

/// Library version for display
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
