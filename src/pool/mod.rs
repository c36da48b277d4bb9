//! Memory pool management
//!
//! Block-recycling pool, the streams leased from it, and the handle that
//! builds the pool once.

mod handle;
mod manager;
mod stream;

pub use handle::PoolHandle;
pub use manager::PoolManager;
pub use stream::PooledStream;

pub(crate) use stream::closed_error;
