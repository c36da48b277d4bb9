//! UTF-8 sizing and encoding for character payloads
//!
//! UTF-16 input is decoded lossily: an unpaired surrogate becomes U+FFFD,
//! which encodes to three bytes.

use crate::error::{PoolError, Result};

/// Scalars of a UTF-16 sequence, unpaired surrogates replaced
pub(crate) fn utf16_chars(units: &[u16]) -> impl Iterator<Item = char> + Clone + '_ {
    char::decode_utf16(units.iter().copied()).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
}

/// Number of bytes the UTF-8 encoding of `chars` occupies
pub(crate) fn utf8_len<I>(chars: I) -> Result<usize>
where
    I: IntoIterator<Item = char>,
{
    chars
        .into_iter()
        .try_fold(0usize, |total, c| total.checked_add(c.len_utf8()))
        .ok_or(PoolError::Overflow("encoded text length"))
}

/// Encode `chars` into `dst`, which must be exactly `utf8_len` bytes
pub(crate) fn encode_utf8_into<I>(chars: I, dst: &mut [u8])
where
    I: IntoIterator<Item = char>,
{
    let mut offset = 0;
    for c in chars {
        offset += c.encode_utf8(&mut dst[offset..]).len();
    }
    debug_assert_eq!(offset, dst.len());
}
