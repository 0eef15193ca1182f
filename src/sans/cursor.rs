//! Bounds-checked sequential reader over a byte slice.

use thiserror::Error;

/// Byte order of multi-byte values in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Map a definition record's architecture byte to a byte order.
    pub fn from_architecture(architecture: u8) -> Self {
        if architecture == 0 {
            Self::Little
        } else {
            Self::Big
        }
    }
}

/// A read ran past the end of the available bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Input ran out at offset {offset} ({needed} more bytes needed).")]
pub struct Truncated {
    /// Absolute offset at which the input ran out.
    pub offset: usize,
    /// Number of bytes missing to complete the read.
    pub needed: usize,
}

macro_rules! read_int {
    ($c:expr, $t:ty, $endian:expr) => {{
        let r = $c.read_array::<{ size_of::<$t>() }>()?;
        Ok(match $endian {
            Endian::Little => <$t>::from_le_bytes(r),
            Endian::Big => <$t>::from_be_bytes(r),
        })
    }};
}

/// Sequential reader over a byte slice.
///
/// Every successful read advances the position by the number of bytes
/// consumed. A failed read leaves the position untouched.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_offset(data, 0)
    }

    /// Create a cursor whose first byte sits at absolute offset `base` of a
    /// larger stream. Only affects reported offsets.
    pub fn with_offset(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Number of bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Position relative to the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Absolute position within the stream.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Move to a position relative to the start of the slice.
    pub fn seek(&mut self, pos: usize) -> Result<(), Truncated> {
        if pos > self.data.len() {
            return Err(self.truncated(pos - self.pos));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Truncated> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Truncated> {
        if self.remaining() < n {
            return Err(self.truncated(n));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Truncated> {
        let mut buf = [0; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, Truncated> {
        let [b] = self.read_array()?;
        Ok(b)
    }

    pub fn read_u16(&mut self, endian: Endian) -> Result<u16, Truncated> {
        read_int!(self, u16, endian)
    }

    pub fn read_u32(&mut self, endian: Endian) -> Result<u32, Truncated> {
        read_int!(self, u32, endian)
    }

    pub fn read_u64(&mut self, endian: Endian) -> Result<u64, Truncated> {
        read_int!(self, u64, endian)
    }

    fn truncated(&self, wanted: usize) -> Truncated {
        Truncated {
            offset: self.base + self.data.len(),
            needed: wanted - self.remaining(),
        }
    }
}
