//! Bounds-checked read cursor over a byte slice

use crate::error::{CodecError, Result};

/// Sequential read position over a borrowed byte slice.
///
/// Every read is bounds-checked: running off the end yields
/// [`CodecError::TruncatedData`] and leaves the position unchanged.
///
/// # Example
///
/// ```
/// use relic_codec::Cursor;
///
/// let data = [0x01, 0x02, 0x03];
/// let mut cursor = Cursor::new(&data);
/// assert_eq!(cursor.take(2).unwrap(), &[0x01, 0x02]);
/// assert_eq!(cursor.remaining(), 1);
/// assert!(cursor.take(2).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the slice
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read `len` bytes and advance
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(CodecError::TruncatedData {
                offset: self.pos,
                needed: len,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read exactly `N` bytes into an array
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Advance without reading
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Unread bytes, without advancing
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}
