//! Materialization integration tests

use memstream_pool::{
    ByteSource, InMemory, MemoryStreamUtil, PoolConfig, PoolError, ReaderSource,
};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::sync::CancellationToken;

use crate::small_block_util;

/// In-memory source whose reported position ignores its real cursor
struct InvalidPositionStream {
    inner: Cursor<Vec<u8>>,
    reported_position: u64,
    closed: bool,
}

impl InvalidPositionStream {
    fn new(data: Vec<u8>, reported_position: u64) -> Self {
        Self {
            inner: Cursor::new(data),
            reported_position,
            closed: false,
        }
    }
}

impl Read for InvalidPositionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for InvalidPositionStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl AsyncRead for InvalidPositionStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl InMemory for InvalidPositionStream {
    fn len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }

    fn position(&self) -> u64 {
        self.reported_position
    }

    fn try_as_contiguous(&self) -> Option<&[u8]> {
        Some(self.inner.get_ref())
    }
}

impl ByteSource for InvalidPositionStream {
    fn in_memory(&mut self) -> Option<&mut dyn InMemory> {
        Some(self)
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Reader that yields some bytes, then fails
struct FailingReader {
    served: bool,
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.served {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "source failed")));
        }
        self.served = true;
        buf.put_slice(b"partial");
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_pooled_stream_source() {
    let util = MemoryStreamUtil::default();
    let data = vec![1u8, 2, 3, 4, 5];

    let mut source = util.get_span_sync(&data).unwrap();
    let result = util.bytes_from_stream(Some(&mut source), false, None).await.unwrap();

    assert_eq!(result, data);
    assert!(source.is_closed());
}

#[tokio::test]
async fn test_pooled_stream_at_position() {
    let util = MemoryStreamUtil::default();

    let mut source = util.get_span_sync(&[1, 2, 3, 4, 5]).unwrap();
    source.set_position(2);
    let result = util.bytes_from_stream(Some(&mut source), false, None).await.unwrap();

    assert_eq!(result, vec![3, 4, 5]);
    assert!(source.is_closed());
}

#[tokio::test]
async fn test_pooled_stream_at_end_or_empty() {
    let util = MemoryStreamUtil::default();

    let mut source = util.get_span_sync(&[1, 2, 3]).unwrap();
    source.set_position(3);
    let result = util.bytes_from_stream(Some(&mut source), false, None).await.unwrap();
    assert!(result.is_empty());
    assert!(source.is_closed());

    let mut source = util.get_sync().unwrap();
    let result = util.bytes_from_stream(Some(&mut source), false, None).await.unwrap();
    assert!(result.is_empty());
    assert!(source.is_closed());
}

#[tokio::test]
async fn test_multi_block_source_uses_read_loop() {
    let util = small_block_util();
    let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();

    let mut source = util.get_span_sync(&data).unwrap();
    source.set_position(100);
    let result = util.bytes_from_stream(Some(&mut source), true, None).await.unwrap();

    assert_eq!(result, &data[100..]);
    assert_eq!(source.position(), 100);
}

#[tokio::test]
async fn test_keep_open() {
    let util = MemoryStreamUtil::default();
    let data = vec![1u8, 2, 3];

    let mut source = util.get_span_sync(&data).unwrap();
    let result = util.bytes_from_stream(Some(&mut source), true, None).await.unwrap();
    assert_eq!(result, data);
    assert!(!source.is_closed());

    // Still usable
    let again = util.bytes_from_stream(Some(&mut source), true, None).await.unwrap();
    assert_eq!(again, data);

    let mut reader = ReaderSource::new(&b"reader"[..]);
    util.bytes_from_stream(Some(&mut reader), true, None).await.unwrap();
    assert!(!reader.is_closed());
}

#[tokio::test]
async fn test_closed_source_is_unusable() {
    let util = MemoryStreamUtil::default();
    let mut source = util.get_span_sync(b"bytes").unwrap();
    util.bytes_from_stream(Some(&mut source), false, None).await.unwrap();

    let mut buf = [0u8; 1];
    assert!(source.read(&mut buf).is_err());
}

#[tokio::test]
async fn test_null_stream() {
    let util = MemoryStreamUtil::default();
    let result = util
        .bytes_from_stream(None::<&mut ReaderSource<&[u8]>>, false, None)
        .await;
    assert!(matches!(result, Err(PoolError::ArgumentMissing("stream"))));
}

#[tokio::test]
async fn test_cursor_source() {
    let util = MemoryStreamUtil::default();
    let mut cursor = Cursor::new(b"cursor bytes".to_vec());
    cursor.set_position(7);

    let result = util.bytes_from_stream(Some(&mut cursor), false, None).await.unwrap();
    assert_eq!(result, b"bytes");

    // Cursors own nothing to release and stay readable
    let mut rest = String::new();
    cursor.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "bytes");
}

#[tokio::test]
async fn test_invalid_position() {
    let util = MemoryStreamUtil::default();
    let mut source = InvalidPositionStream::new(vec![1, 2, 3, 4, 5], 10);

    let result = util.bytes_from_stream(Some(&mut source), false, None).await;
    assert!(matches!(result, Err(PoolError::InvalidState(_))));
    // Closed even on failure
    assert!(source.closed);
}

#[tokio::test]
async fn test_non_seekable_stream() {
    let util = small_block_util();
    let data: Vec<u8> = (0..5000u32).map(|i| (i % 256) as u8).collect();

    let mut source = ReaderSource::new(&data[..]);
    let result = util.bytes_from_stream(Some(&mut source), false, None).await.unwrap();

    assert_eq!(result, data);
    assert!(source.is_closed());

    // Temporary stream went back to the pool
    let stats = util.get_manager().await.unwrap().stats();
    assert_eq!(stats.blocks_in_use, 0);
}

#[tokio::test]
async fn test_sized_reader_source() {
    let util = MemoryStreamUtil::default();
    let data = b"sized reader".to_vec();

    let mut source = ReaderSource::with_remaining(&data[..], data.len() as u64);
    let result = util.bytes_from_stream(Some(&mut source), false, None).await.unwrap();
    assert_eq!(result, data);
}

#[tokio::test]
async fn test_file_stream() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 256) as u8).collect();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let util = MemoryStreamUtil::default();
    let handle = tokio::fs::File::open(file.path()).await.unwrap();
    let mut source = ReaderSource::seekable(handle).await.unwrap();
    assert_eq!(source.remaining_hint(), Some(10_000));

    let result = util.bytes_from_stream(Some(&mut source), false, None).await.unwrap();
    assert_eq!(result, data);
    assert!(source.is_closed());
}

#[tokio::test]
async fn test_reader_past_stream_limit() {
    let util = MemoryStreamUtil::new(PoolConfig {
        block_size: 16,
        max_free_blocks: 16,
        preallocate_blocks: 0,
        max_stream_len: 32,
    });
    let mut source = ReaderSource::new(&[1u8; 100][..]);

    let result = util.bytes_from_stream(Some(&mut source), false, None).await;
    assert!(matches!(
        result,
        Err(PoolError::CapacityExceeded { max: 32, .. })
    ));
    assert!(source.is_closed());

    let stats = util.get_manager().await.unwrap().stats();
    assert_eq!(stats.blocks_in_use, 0);
    assert_eq!(stats.streams_active, 0);
}

#[tokio::test]
async fn test_source_error_still_closes() {
    let util = MemoryStreamUtil::default();
    let mut source = ReaderSource::new(FailingReader { served: false });

    let result = util.bytes_from_stream(Some(&mut source), false, None).await;
    assert!(matches!(result, Err(PoolError::Io(_))));
    assert!(source.is_closed());

    let stats = util.get_manager().await.unwrap().stats();
    assert_eq!(stats.streams_active, 0);
}

#[tokio::test]
async fn test_cancelled_copy() {
    let util = MemoryStreamUtil::default();
    let token = CancellationToken::new();
    token.cancel();

    let mut source = ReaderSource::new(&b"never read"[..]);
    let result = util
        .bytes_from_stream(Some(&mut source), false, Some(&token))
        .await;
    assert!(matches!(result, Err(PoolError::Cancelled)));
    assert!(source.is_closed());
}

#[tokio::test]
async fn test_cancellation_ignored_on_fast_path() {
    let util = MemoryStreamUtil::default();
    let token = CancellationToken::new();
    token.cancel();

    let mut source = util.get_span_sync(b"in memory").unwrap();
    let result = util
        .bytes_from_stream(Some(&mut source), false, Some(&token))
        .await
        .unwrap();
    assert_eq!(result, b"in memory");
}

#[tokio::test]
async fn test_uncancelled_token_completes() {
    let util = MemoryStreamUtil::default();
    let token = CancellationToken::new();

    let mut source = ReaderSource::new(&b"streamed"[..]);
    let result = util
        .bytes_from_stream(Some(&mut source), false, Some(&token))
        .await
        .unwrap();
    assert_eq!(result, b"streamed");
}
