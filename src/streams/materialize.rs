//! Stream materialization
//!
//! Drains the unread remainder of a source into an exact-size `Vec<u8>`.
//! In-memory sources are copied synchronously from their backing region;
//! everything else is streamed through a temporary pooled stream.

use std::io::{self, SeekFrom};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::MemoryStreamUtil;
use crate::error::{PoolError, Result};
use crate::pool::PooledStream;
use crate::source::{ByteSource, InMemory};

impl MemoryStreamUtil {
    /// Read the rest of `source` into a new vector.
    ///
    /// Unless `keep_open` is set the source is closed afterwards, whether or
    /// not materialization succeeded. `cancel` is only observed while
    /// copying a source that is not in memory.
    pub async fn bytes_from_stream<S>(
        &self,
        source: Option<&mut S>,
        keep_open: bool,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<u8>>
    where
        S: ByteSource + ?Sized,
    {
        let source = source.ok_or(PoolError::ArgumentMissing("stream"))?;

        let fast = source.in_memory().map(bytes_from_in_memory);
        let result = match fast {
            Some(result) => result,
            None => self.bytes_from_reader(source, cancel).await,
        };

        if !keep_open {
            if let Err(close_err) = source.close() {
                match &result {
                    Ok(_) => return Err(close_err.into()),
                    Err(err) => warn!(
                        error = %close_err,
                        cause = %err,
                        "Failed to close source after materialization error"
                    ),
                }
            }
        }

        result
    }

    async fn bytes_from_reader<S>(
        &self,
        source: &mut S,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<u8>>
    where
        S: ByteSource + ?Sized,
    {
        let manager = self.get_manager().await?;
        let hint = size_hint(source.remaining_hint(), manager.config().stream_limit());

        let mut buffer = if hint > 0 {
            manager.get_stream_sized(hint)?
        } else {
            manager.get_stream()
        };

        let copied = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(PoolError::Cancelled),
                copied = tokio::io::copy(source, &mut buffer) => copied?,
            },
            None => tokio::io::copy(source, &mut buffer).await?,
        };

        debug!(copied, hint, "Source copied into pooled stream");
        Ok(extract(&buffer))
    }
}

/// Usable pre-size for the temporary stream, 0 when there is none
fn size_hint(remaining: Option<u64>, limit: Option<u64>) -> usize {
    match remaining {
        Some(n) if n > 0 && n <= isize::MAX as u64 && limit.map_or(true, |max| n <= max) => {
            n as usize
        }
        _ => 0,
    }
}

/// Copy a pooled stream's contents out, once
fn extract(buffer: &PooledStream) -> Vec<u8> {
    if buffer.is_empty() {
        return Vec::new();
    }
    match buffer.try_as_contiguous() {
        Some(region) => region.to_vec(),
        None => buffer.to_vec(),
    }
}

/// Synchronous fast path for sources held in memory
fn bytes_from_in_memory(source: &mut dyn InMemory) -> Result<Vec<u8>> {
    let len = source.len();
    let position = source.position();
    if position > len {
        return Err(PoolError::position_out_of_bounds(position, len));
    }

    let remaining = usize::try_from(len - position)
        .map_err(|_| PoolError::Overflow("remaining stream length"))?;
    if remaining == 0 {
        return Ok(Vec::new());
    }

    if let Some(region) = source.try_as_contiguous() {
        let start = usize::try_from(position)
            .map_err(|_| PoolError::Overflow("stream position"))?;
        let end = start
            .checked_add(remaining)
            .ok_or(PoolError::Overflow("stream position"))?;
        if let Some(bytes) = region.get(start..end) {
            return Ok(bytes.to_vec());
        }
    }

    // No usable region: read from the cursor, then put it back
    let original = source.stream_position()?;
    source.seek(SeekFrom::Start(position))?;

    let mut out = vec![0u8; remaining];
    let read = read_up_to(source, &mut out);
    let restored = source.seek(SeekFrom::Start(original));
    let total = read?;
    restored?;

    // Fewer bytes than declared means the source changed underneath us
    out.truncate(total);
    Ok(out)
}

fn read_up_to(source: &mut dyn InMemory, out: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < out.len() {
        match source.read(&mut out[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
