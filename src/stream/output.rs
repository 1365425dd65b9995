// Append-only byte writer with a running position.
//
// Back-references in the wire format are expressed as distances from the
// current position, so the writer counts every byte it forwards to the sink.

use std::io::{self, Write};

use super::varint;

/// Position-tracking writer over any `Write` sink.
#[derive(Debug)]
pub struct OutputStream<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> OutputStream<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn put_byte(&mut self, byte: u8) -> io::Result<()> {
        self.inner.write_all(&[byte])?;
        self.position += 1;
        Ok(())
    }

    /// Two bytes, most significant first.
    pub fn put_word(&mut self, word: u16) -> io::Result<()> {
        self.inner.write_all(&word.to_be_bytes())?;
        self.position += 2;
        Ok(())
    }

    pub fn put_varint(&mut self, value: u64) -> io::Result<()> {
        let written = varint::write_u64(&mut self.inner, value)?;
        self.position += written as u64;
        Ok(())
    }

    pub fn put_varint_zigzag(&mut self, value: i64) -> io::Result<()> {
        let written = varint::write_i64_zigzag(&mut self.inner, value)?;
        self.position += written as u64;
        Ok(())
    }

    /// Raw UTF-8 bytes of `value`, without any length information.
    pub fn put_string_utf8(&mut self, value: &str) -> io::Result<()> {
        self.inner.write_all(value.as_bytes())?;
        self.position += value.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_position_across_primitives() {
        let mut out = OutputStream::new(Vec::new());
        out.put_byte(0x01).unwrap();
        assert_eq!(out.position(), 1);
        out.put_word(2014).unwrap();
        assert_eq!(out.position(), 3);
        out.put_varint(300).unwrap();
        assert_eq!(out.position(), 5);
        out.put_varint_zigzag(-314).unwrap();
        assert_eq!(out.position(), 7);
        out.put_string_utf8("héllo").unwrap();
        assert_eq!(out.position(), 13);

        let bytes = out.into_inner();
        assert_eq!(
            bytes,
            [
                0x01, 0x07, 0xDE, 0xAC, 0x02, 0xF3, 0x04, b'h', 0xC3, 0xA9, b'l', b'l', b'o'
            ]
        );
    }

    #[test]
    fn word_is_big_endian() {
        let mut out = OutputStream::new(Vec::new());
        out.put_word(0x0102).unwrap();
        assert_eq!(out.get_ref(), &[0x01, 0x02]);
    }
}
