// Base-128 variable-length integers (LEB128) and zigzag mapping.
//
// Little-endian: least-significant 7-bit group first. Every byte except the
// last has bit 7 set. A `u64` never needs more than 10 bytes.

use std::io::{self, Write};

/// Maximum encoded length for a 64-bit value (ceil(64/7) = 10).
pub const MAX_VARINT_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Zigzag
// ---------------------------------------------------------------------------

/// Map a signed integer onto the unsigned line: `0, -1, 1, -2, ...` become
/// `0, 1, 2, 3, ...`.
#[inline]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `u64` into the front of `buf`.
/// Returns the number of bytes written (1..=10).
#[inline]
pub fn encode_u64(mut num: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = 0;
    loop {
        let group = (num & 0x7F) as u8;
        num >>= 7;
        if num == 0 {
            buf[i] = group;
            return i + 1;
        }
        buf[i] = group | 0x80;
        i += 1;
    }
}

/// Encode a `u64` and write to a `Write` sink.
pub fn write_u64<W: Write>(w: &mut W, num: u64) -> io::Result<usize> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_u64(num, &mut buf);
    w.write_all(&buf[..len])?;
    Ok(len)
}

/// Zigzag-map an `i64` and write it as a varint.
pub fn write_i64_zigzag<W: Write>(w: &mut W, num: i64) -> io::Result<usize> {
    write_u64(w, zigzag_encode(num))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a `u64` from the front of a byte slice.
/// Returns `(value, bytes_consumed)` or an error.
pub fn read_u64(data: &[u8]) -> Result<(u64, usize), VarIntError> {
    let mut val: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        let shift = 7 * i as u32;
        let group = u64::from(byte & 0x7F);
        // The tenth byte may only carry the single remaining bit.
        if i >= MAX_VARINT_LEN || (i == MAX_VARINT_LEN - 1 && group > 1) {
            return Err(VarIntError::Overflow);
        }
        val |= group << shift;
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(VarIntError::Underflow)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Return the encoded byte-length of a `u64` value.
#[inline]
pub fn sizeof_u64(num: u64) -> usize {
    let bits = 64 - num.leading_zeros();
    (bits.max(1).div_ceil(7) as usize).min(MAX_VARINT_LEN)
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VarIntError {
    /// Not enough input bytes to complete the integer.
    #[error("varint underflow (truncated input)")]
    Underflow,
    /// Value would overflow a `u64`.
    #[error("varint overflow")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_u64() {
        let cases: &[u64] = &[
            0,
            1,
            127,
            128,
            255,
            256,
            16383,
            16384,
            u32::MAX as u64,
            u64::MAX,
        ];
        let mut buf = [0u8; MAX_VARINT_LEN];
        for &val in cases {
            let len = encode_u64(val, &mut buf);
            let (decoded, consumed) = read_u64(&buf[..len]).unwrap();
            assert_eq!(decoded, val, "roundtrip failed for {val}");
            assert_eq!(consumed, len, "length mismatch for {val}");
            assert_eq!(sizeof_u64(val), len, "sizeof mismatch for {val}");
        }
    }

    #[test]
    fn encoding_is_little_endian() {
        // 300 = 0b1_0010_1100: low group 0x2C with continuation, then 0x02.
        let mut buf = [0u8; MAX_VARINT_LEN];
        let len = encode_u64(300, &mut buf);
        assert_eq!(&buf[..len], &[0xAC, 0x02]);

        let len = encode_u64(627, &mut buf);
        assert_eq!(&buf[..len], &[0xF3, 0x04]);
    }

    #[test]
    fn single_byte_values() {
        let mut buf = [0u8; MAX_VARINT_LEN];
        for val in 0..=127u64 {
            let len = encode_u64(val, &mut buf);
            assert_eq!(len, 1);
            assert_eq!(buf[0], val as u8);
        }
    }

    #[test]
    fn zigzag_mapping() {
        let cases: &[(i64, u64)] = &[
            (0, 0),
            (-1, 1),
            (1, 2),
            (-2, 3),
            (2, 4),
            (-314, 627),
            (i64::MAX, u64::MAX - 1),
            (i64::MIN, u64::MAX),
        ];
        for &(signed, unsigned) in cases {
            assert_eq!(zigzag_encode(signed), unsigned);
            assert_eq!(zigzag_decode(unsigned), signed);
        }
    }

    #[test]
    fn overflow_detection() {
        // Eleven bytes.
        let data = [0xFF; 11];
        assert_eq!(read_u64(&data), Err(VarIntError::Overflow));
        // Ten bytes whose last group exceeds the remaining bit.
        let mut data = [0xFF; 10];
        data[9] = 0x02;
        assert_eq!(read_u64(&data), Err(VarIntError::Overflow));
        data[9] = 0x01;
        assert_eq!(read_u64(&data), Ok((u64::MAX, 10)));
    }

    #[test]
    fn underflow_detection() {
        // Truncated: all continuation bytes, no terminator.
        let data = [0x80, 0x80, 0x80];
        assert_eq!(read_u64(&data), Err(VarIntError::Underflow));
        assert_eq!(read_u64(&[]), Err(VarIntError::Underflow));
    }

    #[test]
    fn write_read_roundtrip() {
        let mut out = Vec::new();
        let written = write_u64(&mut out, 999999).unwrap();
        let (val, len) = read_u64(&out).unwrap();
        assert_eq!(val, 999999);
        assert_eq!(len, out.len());
        assert_eq!(written, len);

        out.clear();
        write_i64_zigzag(&mut out, -3).unwrap();
        assert_eq!(out, [0x05]);
    }
}
