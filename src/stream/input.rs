// Seekable, bounds-checked reader over an in-memory byte slice.
//
// Shared strings are resolved by jumping backwards and returning, so the
// reader needs random access; every read is checked against the slice end.

use super::varint::{self, VarIntError};

/// Error type for stream-level decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// Fewer bytes remain than the read requires.
    #[error("unexpected end of input at offset {offset} (needed {needed} bytes)")]
    UnexpectedEof { offset: u64, needed: u64 },
    /// Varint longer than ten bytes or larger than `u64::MAX`.
    #[error("varint overflow at offset {offset}")]
    VarintOverflow { offset: u64 },
    /// String bytes are not valid UTF-8.
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: u64 },
    /// Seek target lies past the end of the input.
    #[error("seek to offset {offset} past end of input ({len} bytes)")]
    SeekOutOfBounds { offset: u64, len: u64 },
    /// Back-reference distance is zero or reaches before the start.
    #[error("invalid back-reference of {distance} bytes from offset {from}")]
    InvalidRewind { distance: u64, from: u64 },
}

/// Cursor over an encoded buffer.
#[derive(Debug, Clone)]
pub struct InputStream<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> InputStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position as u64
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the cursor and the end of input.
    #[inline]
    pub fn remaining(&self) -> u64 {
        (self.data.len() - self.position) as u64
    }

    #[inline]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the cursor to an absolute offset. The end of input is a valid
    /// target.
    pub fn seek(&mut self, offset: u64) -> Result<(), ReadError> {
        if offset > self.len() {
            return Err(ReadError::SeekOutOfBounds {
                offset,
                len: self.len(),
            });
        }
        self.position = offset as usize;
        Ok(())
    }

    /// Seek to `from - distance` and return the position held before the
    /// seek.
    pub fn rewind(&mut self, distance: u64, from: u64) -> Result<u64, ReadError> {
        if distance == 0 || distance > from {
            return Err(ReadError::InvalidRewind { distance, from });
        }
        let previous = self.position();
        self.seek(from - distance)?;
        Ok(previous)
    }

    pub fn get_byte(&mut self) -> Result<u8, ReadError> {
        let byte = *self
            .data
            .get(self.position)
            .ok_or(ReadError::UnexpectedEof {
                offset: self.position(),
                needed: 1,
            })?;
        self.position += 1;
        Ok(byte)
    }

    /// Two bytes, most significant first.
    pub fn get_word(&mut self) -> Result<u16, ReadError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn get_varint(&mut self) -> Result<u64, ReadError> {
        let offset = self.position();
        match varint::read_u64(&self.data[self.position..]) {
            Ok((value, consumed)) => {
                self.position += consumed;
                Ok(value)
            }
            Err(VarIntError::Underflow) => Err(ReadError::UnexpectedEof {
                offset: self.len(),
                needed: 1,
            }),
            Err(VarIntError::Overflow) => Err(ReadError::VarintOverflow { offset }),
        }
    }

    pub fn get_varint_zigzag(&mut self) -> Result<i64, ReadError> {
        self.get_varint().map(varint::zigzag_decode)
    }

    /// Read exactly `length` bytes as a UTF-8 string.
    pub fn get_string_utf8(&mut self, length: u64) -> Result<String, ReadError> {
        let offset = self.position();
        let bytes = self.take(length)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| ReadError::InvalidUtf8 { offset })
    }

    fn take(&mut self, length: u64) -> Result<&'a [u8], ReadError> {
        if length > self.remaining() {
            return Err(ReadError::UnexpectedEof {
                offset: self.position(),
                needed: length,
            });
        }
        let data = self.data;
        let start = self.position;
        self.position += length as usize;
        Ok(&data[start..self.position])
    }
}
