//! Pooled stream
//!
//! A growable, seekable byte stream backed by blocks leased from a
//! [`PoolManager`](super::PoolManager). Blocks go back to the pool when the
//! stream is dropped or closed.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::manager::PoolInner;
use crate::error::{PoolError, Result};

/// Error returned by every operation on a closed stream
pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "stream is closed")
}

/// A stream leased from the pool
pub struct PooledStream {
    blocks: Vec<Box<[u8]>>,
    len: usize,
    position: u64,
    closed: bool,
    pool: Arc<PoolInner>,
}

impl PooledStream {
    pub(crate) fn new(pool: Arc<PoolInner>) -> Self {
        pool.stream_created();
        Self {
            blocks: Vec::new(),
            len: 0,
            position: 0,
            closed: false,
            pool,
        }
    }

    /// Length of the stream contents in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the stream holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current cursor position. May be past the end.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the cursor. Positions past the end are allowed.
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    /// Bytes available without leasing more blocks
    pub fn capacity(&self) -> usize {
        self.blocks.len() * self.pool.block_size()
    }

    /// Whether the stream was closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Ensure capacity for at least `required` bytes
    pub fn reserve(&mut self, required: usize) -> Result<()> {
        self.ensure_open()?;
        if let Some(max) = self.pool.stream_limit() {
            if required as u64 > max {
                return Err(PoolError::CapacityExceeded {
                    requested: required as u64,
                    max,
                });
            }
        }

        let needed_blocks = required.div_ceil(self.pool.block_size());
        while self.blocks.len() < needed_blocks {
            self.blocks.push(self.pool.lease_block());
        }
        Ok(())
    }

    /// Resize the stream. Growing zero-fills; shrinking keeps the blocks.
    pub fn set_len(&mut self, len: u64) -> Result<()> {
        let new_len = usize::try_from(len).map_err(|_| PoolError::Overflow("stream length"))?;
        self.reserve(new_len)?;
        if new_len > self.len {
            self.zero_range(self.len, new_len);
        }
        self.len = new_len;
        Ok(())
    }

    /// Contents as one contiguous slice, when they fit a single block
    pub fn try_as_contiguous(&self) -> Option<&[u8]> {
        if self.closed {
            return None;
        }
        if self.len == 0 {
            return Some(&[]);
        }
        if self.len <= self.pool.block_size() {
            return self.blocks.first().map(|block| &block[..self.len]);
        }
        None
    }

    /// Set the length to `len` and expose it as one writable slice.
    ///
    /// Returns `None` without changing the stream when `len` does not fit
    /// in a single block. The exposed bytes are not cleared.
    pub(crate) fn direct_region_mut(&mut self, len: usize) -> Result<Option<&mut [u8]>> {
        if len > self.pool.block_size() {
            return Ok(None);
        }
        self.reserve(len)?;
        self.len = len;
        Ok(self.blocks.first_mut().map(|block| &mut block[..len]))
    }

    /// Copy the whole contents into a new vector, regardless of position
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        let block_size = self.pool.block_size();
        let mut remaining = self.len;
        for block in &self.blocks {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(block_size);
            out.extend_from_slice(&block[..take]);
            remaining -= take;
        }
        out
    }

    /// Release the blocks to the pool. Any further I/O fails.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.len = 0;
        self.position = 0;
        self.pool.return_blocks(std::mem::take(&mut self.blocks));
        self.pool.stream_released();
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            Err(closed_error())
        } else {
            Ok(())
        }
    }

    fn zero_range(&mut self, start: usize, end: usize) {
        let block_size = self.pool.block_size();
        let mut offset = start;
        while offset < end {
            let (index, within) = (offset / block_size, offset % block_size);
            let take = (block_size - within).min(end - offset);
            self.blocks[index][within..within + take].fill(0);
            offset += take;
        }
    }
}

impl Read for PooledStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;
        let len = self.len as u64;
        if self.position >= len || buf.is_empty() {
            return Ok(0);
        }

        let block_size = self.pool.block_size();
        let start = self.position as usize;
        let end = self.len.min(start.saturating_add(buf.len()));
        let mut offset = start;
        while offset < end {
            let (index, within) = (offset / block_size, offset % block_size);
            let take = (block_size - within).min(end - offset);
            buf[offset - start..offset - start + take]
                .copy_from_slice(&self.blocks[index][within..within + take]);
            offset += take;
        }

        self.position = end as u64;
        Ok(end - start)
    }
}

impl Write for PooledStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(0);
        }

        let start = usize::try_from(self.position)
            .map_err(|_| PoolError::Overflow("stream position"))?;
        let end = start
            .checked_add(buf.len())
            .ok_or(PoolError::Overflow("stream length"))?;
        self.reserve(end)?;
        if start > self.len {
            self.zero_range(self.len, start);
        }

        let block_size = self.pool.block_size();
        let mut offset = start;
        while offset < end {
            let (index, within) = (offset / block_size, offset % block_size);
            let take = (block_size - within).min(end - offset);
            self.blocks[index][within..within + take]
                .copy_from_slice(&buf[offset - start..offset - start + take]);
            offset += take;
        }

        self.len = self.len.max(end);
        self.position = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()
    }
}

impl Seek for PooledStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.ensure_open()?;
        let (base, delta) = match pos {
            SeekFrom::Start(n) => {
                self.position = n;
                return Ok(n);
            }
            SeekFrom::End(delta) => (self.len as u64, delta),
            SeekFrom::Current(delta) => (self.position, delta),
        };

        match base.checked_add_signed(delta) {
            Some(n) => {
                self.position = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

impl AsyncRead for PooledStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let n = Read::read(self.get_mut(), buf.initialize_unfilled())?;
        buf.advance(n);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for PooledStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Write::write(self.get_mut(), buf))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(self.ensure_open())
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(self.ensure_open())
    }
}

impl Drop for PooledStream {
    fn drop(&mut self) {
        // Return blocks to pool
        self.close();
    }
}

impl std::fmt::Debug for PooledStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledStream")
            .field("len", &self.len)
            .field("position", &self.position)
            .field("blocks", &self.blocks.len())
            .field("closed", &self.closed)
            .finish()
    }
}
