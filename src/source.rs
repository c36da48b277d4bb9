//! Readable sources for materialization
//!
//! [`ByteSource`] is what `bytes_from_stream` drains. Sources that live in
//! memory additionally expose [`InMemory`], which unlocks the synchronous
//! fast path.

use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt, ReadBuf};

use crate::pool::{closed_error, PooledStream};

/// Random-access view of a source whose bytes are already in memory
pub trait InMemory: Read + Seek {
    /// Declared length in bytes
    fn len(&self) -> u64;

    /// Current cursor position as reported by the source
    fn position(&self) -> u64;

    /// All contents from offset 0, if they are stored contiguously
    fn try_as_contiguous(&self) -> Option<&[u8]>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A readable byte stream the materializer can drain
pub trait ByteSource: AsyncRead + Unpin + Send {
    /// In-memory view, when the source has one
    fn in_memory(&mut self) -> Option<&mut dyn InMemory> {
        None
    }

    /// Bytes left to read, when the source supports random access
    fn remaining_hint(&self) -> Option<u64> {
        None
    }

    /// Release the source. Sources without resources do nothing.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl InMemory for PooledStream {
    fn len(&self) -> u64 {
        PooledStream::len(self) as u64
    }

    fn position(&self) -> u64 {
        PooledStream::position(self)
    }

    fn try_as_contiguous(&self) -> Option<&[u8]> {
        PooledStream::try_as_contiguous(self)
    }
}

impl ByteSource for PooledStream {
    fn in_memory(&mut self) -> Option<&mut dyn InMemory> {
        Some(self)
    }

    fn remaining_hint(&self) -> Option<u64> {
        (PooledStream::len(self) as u64).checked_sub(PooledStream::position(self))
    }

    fn close(&mut self) -> io::Result<()> {
        PooledStream::close(self);
        Ok(())
    }
}

impl<T: AsRef<[u8]>> InMemory for Cursor<T> {
    fn len(&self) -> u64 {
        self.get_ref().as_ref().len() as u64
    }

    fn position(&self) -> u64 {
        Cursor::position(self)
    }

    fn try_as_contiguous(&self) -> Option<&[u8]> {
        Some(self.get_ref().as_ref())
    }
}

/// Closing a cursor is a no-op: it owns no resource, so it stays readable
/// after `bytes_from_stream` even when `keep_open` is false.
impl<T: AsRef<[u8]> + Unpin + Send> ByteSource for Cursor<T> {
    fn in_memory(&mut self) -> Option<&mut dyn InMemory> {
        Some(self)
    }

    fn remaining_hint(&self) -> Option<u64> {
        InMemory::len(self).checked_sub(Cursor::position(self))
    }
}

/// Adapter turning any [`AsyncRead`] into a closable [`ByteSource`]
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: Option<R>,
    remaining: Option<u64>,
}

impl<R> ReaderSource<R> {
    /// Wrap a reader with no size information
    pub fn new(reader: R) -> Self {
        Self {
            inner: Some(reader),
            remaining: None,
        }
    }

    /// Wrap a reader known to hold `remaining` more bytes
    pub fn with_remaining(reader: R, remaining: u64) -> Self {
        Self {
            inner: Some(reader),
            remaining: Some(remaining),
        }
    }

    /// Whether the reader has been released
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Take the reader back, if it was not closed
    pub fn into_inner(self) -> Option<R> {
        self.inner
    }
}

impl<R: AsyncRead + AsyncSeek + Unpin> ReaderSource<R> {
    /// Wrap a seekable reader, measuring the bytes left after its cursor
    pub async fn seekable(mut reader: R) -> io::Result<Self> {
        let position = reader.stream_position().await?;
        let end = reader.seek(SeekFrom::End(0)).await?;
        reader.seek(SeekFrom::Start(position)).await?;

        Ok(Self::with_remaining(reader, end.saturating_sub(position)))
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ReaderSource<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let Some(reader) = this.inner.as_mut() else {
            return Poll::Ready(Err(closed_error()));
        };

        let before = buf.filled().len();
        let result = Pin::new(reader).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &result {
            let read = (buf.filled().len() - before) as u64;
            if let Some(remaining) = this.remaining.as_mut() {
                *remaining = remaining.saturating_sub(read);
            }
        }
        result
    }
}

impl<R: AsyncRead + Unpin + Send> ByteSource for ReaderSource<R> {
    fn remaining_hint(&self) -> Option<u64> {
        self.inner.as_ref().and(self.remaining)
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner = None;
        Ok(())
    }
}
