//! Stream acquisition
//!
//! Every payload takes the same route: size the UTF-8 or raw byte length,
//! lease a stream reserved to that size, write straight into its first block
//! when the payload fits one, otherwise encode into a scratch vector and
//! write that. The returned stream is positioned at 0.

use bytes::Bytes;
use std::io::Write;
use std::sync::Arc;
use tracing::trace;

use super::encoding::{encode_utf8_into, utf16_chars, utf8_len};
use super::MemoryStreamUtil;
use crate::error::{PoolError, Result};
use crate::pool::{PoolManager, PooledStream};

/// Lease a stream of exactly `len` bytes and let `encode` fill it.
///
/// On error the partially built stream is dropped, returning its blocks.
fn fill_stream<F>(manager: &PoolManager, len: usize, encode: F) -> Result<PooledStream>
where
    F: FnOnce(&mut [u8]),
{
    if len == 0 {
        return Ok(manager.get_stream());
    }

    let mut stream = manager.get_stream_sized(len)?;

    match stream.direct_region_mut(len)? {
        Some(region) => {
            encode(region);
        }
        None => {
            trace!(len, "payload spans several blocks, encoding via scratch buffer");
            let mut scratch = vec![0u8; len];
            encode(&mut scratch);
            stream.write_all(&scratch)?;
        }
    }

    stream.set_position(0);
    Ok(stream)
}

fn stream_from_bytes(manager: &PoolManager, bytes: &[u8]) -> Result<PooledStream> {
    fill_stream(manager, bytes.len(), |dst| dst.copy_from_slice(bytes))
}

fn stream_from_utf16(manager: &PoolManager, units: &[u16]) -> Result<PooledStream> {
    if units.is_empty() {
        return Ok(manager.get_stream());
    }
    let len = utf8_len(utf16_chars(units))?;
    fill_stream(manager, len, |dst| encode_utf8_into(utf16_chars(units), dst))
}

fn stream_from_chars(manager: &PoolManager, chars: &[char]) -> Result<PooledStream> {
    if chars.is_empty() {
        return Ok(manager.get_stream());
    }
    let len = utf8_len(chars.iter().copied())?;
    fill_stream(manager, len, |dst| encode_utf8_into(chars.iter().copied(), dst))
}

impl MemoryStreamUtil {
    /// Lease an empty stream
    pub async fn get(&self) -> Result<PooledStream> {
        Ok(self.get_manager().await?.get_stream())
    }

    /// Blocking form of [`get`](Self::get)
    pub fn get_sync(&self) -> Result<PooledStream> {
        Ok(self.get_manager_sync()?.get_stream())
    }

    /// Lease a stream holding a copy of `bytes`.
    ///
    /// `None` fails with [`PoolError::ArgumentMissing`] before the pool is
    /// touched.
    pub async fn get_bytes(&self, bytes: Option<&[u8]>) -> Result<PooledStream> {
        let bytes = bytes.ok_or(PoolError::ArgumentMissing("bytes"))?;
        stream_from_bytes(&self.get_manager().await?, bytes)
    }

    /// Blocking form of [`get_bytes`](Self::get_bytes)
    pub fn get_bytes_sync(&self, bytes: Option<&[u8]>) -> Result<PooledStream> {
        let bytes = bytes.ok_or(PoolError::ArgumentMissing("bytes"))?;
        stream_from_bytes(&self.get_manager_sync()?, bytes)
    }

    /// Lease a stream holding the UTF-8 bytes of `text`
    pub async fn get_str(&self, text: Option<&str>) -> Result<PooledStream> {
        let text = text.ok_or(PoolError::ArgumentMissing("text"))?;
        stream_from_bytes(&self.get_manager().await?, text.as_bytes())
    }

    /// Blocking form of [`get_str`](Self::get_str)
    pub fn get_str_sync(&self, text: Option<&str>) -> Result<PooledStream> {
        let text = text.ok_or(PoolError::ArgumentMissing("text"))?;
        stream_from_bytes(&self.get_manager_sync()?, text.as_bytes())
    }

    /// Lease a stream holding a copy of `span`. Never fails for empty input.
    pub fn get_span_sync(&self, span: &[u8]) -> Result<PooledStream> {
        stream_from_bytes(&self.get_manager_sync()?, span)
    }

    /// Lease a stream holding a copy of owned `memory`
    pub async fn get_memory(&self, memory: Bytes) -> Result<PooledStream> {
        let manager = self.get_manager().await?;
        stream_from_bytes(&manager, &memory)
    }

    /// Lease a stream holding the UTF-8 encoding of `chars`
    pub fn get_chars_sync(&self, chars: &[char]) -> Result<PooledStream> {
        stream_from_chars(&self.get_manager_sync()?, chars)
    }

    /// Lease a stream holding the UTF-8 encoding of UTF-16 `units`
    pub fn get_utf16_sync(&self, units: &[u16]) -> Result<PooledStream> {
        stream_from_utf16(&self.get_manager_sync()?, units)
    }

    /// Owned form of [`get_utf16_sync`](Self::get_utf16_sync), usable across
    /// the await on the manager
    pub async fn get_utf16_memory(&self, units: Arc<[u16]>) -> Result<PooledStream> {
        let manager = self.get_manager().await?;
        stream_from_utf16(&manager, &units)
    }
}
