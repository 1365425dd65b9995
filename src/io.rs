// File and stream helpers: JSON text in, packed bytes out, and back.
//
// Decoding needs the whole encoded buffer in memory, since shared strings
// point backwards. JSON input is likewise read fully before encoding.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::codec::{DecodeError, Decoder, EncodeError, Encoder};
use crate::encoding::Encoding;
use crate::engine::{DecodeOptions, EncodeOptions};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `encode_file()` and `encode_stream()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeStats {
    /// JSON input size in bytes.
    pub input_size: u64,
    /// Encoded output size in bytes.
    pub output_size: u64,
    /// Strings held by the cache when the session ended.
    pub cached_strings: u64,
}

/// Statistics returned by `decode_file()` and `decode_stream()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStats {
    /// Encoded input size in bytes.
    pub input_size: u64,
    /// JSON output size in bytes.
    pub output_size: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file and stream operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Input is not valid JSON text.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Read a JSON document from `input`, write its encoding to `output`.
pub fn encode_file(
    encoding: &Encoding,
    input: &Path,
    output: &Path,
    opts: &EncodeOptions,
) -> Result<EncodeStats, IoError> {
    let reader = BufReader::with_capacity(BUF_SIZE, File::open(input)?);
    let writer = BufWriter::with_capacity(BUF_SIZE, File::create(output)?);
    encode_stream(encoding, reader, writer, opts)
}

/// Stream form of `encode_file()`.
pub fn encode_stream<R: Read, W: Write>(
    encoding: &Encoding,
    mut reader: R,
    writer: W,
    opts: &EncodeOptions,
) -> Result<EncodeStats, IoError> {
    encoding.validate().map_err(EncodeError::from)?;

    let mut text = Vec::new();
    reader.read_to_end(&mut text)?;
    let document: serde_json::Value = serde_json::from_slice(&text)?;

    let mut encoder = Encoder::with_cache_config(writer, opts.cache).with_max_depth(opts.max_depth);
    encoder.encode(&document, encoding)?;
    encoder.flush()?;

    let stats = EncodeStats {
        input_size: text.len() as u64,
        output_size: encoder.position(),
        cached_strings: encoder.cache().len() as u64,
    };
    log::debug!("encode: {stats:?}");
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decode the bytes in `input`, write the document to `output` as JSON text.
pub fn decode_file(
    encoding: &Encoding,
    input: &Path,
    output: &Path,
    opts: &DecodeOptions,
) -> Result<DecodeStats, IoError> {
    let bytes = std::fs::read(input)?;
    let writer = BufWriter::with_capacity(BUF_SIZE, File::create(output)?);
    decode_bytes(encoding, &bytes, writer, opts, false)
}

/// Stream form of `decode_file()`, optionally pretty-printing.
pub fn decode_stream<R: Read, W: Write>(
    encoding: &Encoding,
    mut reader: R,
    writer: W,
    opts: &DecodeOptions,
    pretty: bool,
) -> Result<DecodeStats, IoError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_bytes(encoding, &bytes, writer, opts, pretty)
}

fn decode_bytes<W: Write>(
    encoding: &Encoding,
    bytes: &[u8],
    writer: W,
    opts: &DecodeOptions,
    pretty: bool,
) -> Result<DecodeStats, IoError> {
    encoding.validate().map_err(DecodeError::from)?;

    let mut decoder = Decoder::with_max_depth(bytes, opts.max_depth);
    let document = decoder.decode(encoding)?;
    if !opts.allow_trailing_data {
        decoder.finish()?;
    }

    let mut out = CountingWriter {
        inner: writer,
        count: 0,
    };
    if pretty {
        serde_json::to_writer_pretty(&mut out, &document)?;
    } else {
        serde_json::to_writer(&mut out, &document)?;
    }
    out.write_all(b"\n")?;
    out.flush()?;

    let stats = DecodeStats {
        input_size: bytes.len() as u64,
        output_size: out.count,
    };
    log::debug!("decode: {stats:?}");
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Counting writer
// ---------------------------------------------------------------------------

struct CountingWriter<W: Write> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::loader;

    #[test]
    fn encode_decode_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("doc.json");
        let packed_path = dir.path().join("doc.bin");
        let restored_path = dir.path().join("restored.json");

        let text = r#"{"name":"oxipack","versions":[1,2,3],"ratio":0.75,"tags":["a","b","a"]}"#;
        std::fs::write(&json_path, text).unwrap();

        let any = Encoding::any();
        let enc = encode_file(&any, &json_path, &packed_path, &EncodeOptions::default()).unwrap();
        assert_eq!(enc.input_size, text.len() as u64);
        assert_eq!(enc.output_size, std::fs::metadata(&packed_path).unwrap().len());

        let dec =
            decode_file(&any, &packed_path, &restored_path, &DecodeOptions::default()).unwrap();
        assert_eq!(dec.input_size, enc.output_size);

        let restored: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&restored_path).unwrap()).unwrap();
        let original: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn stream_roundtrip_with_schema() {
        let encoding = loader::from_str(
            r#"{
                "binpackEncoding": "FLOOR_TYPED_ARRAY",
                "binpackOptions": {
                    "minimum": 0,
                    "encoding": {
                        "binpackEncoding": "FLOOR_MULTIPLE_ENUM_VARINT",
                        "binpackOptions": {"minimum": 0, "multiplier": 1}
                    }
                }
            }"#,
        )
        .unwrap();

        let mut packed = Vec::new();
        let stats = encode_stream(
            &encoding,
            &b"[1, 2, 300]"[..],
            &mut packed,
            &EncodeOptions::default(),
        )
        .unwrap();
        assert_eq!(packed, [0x03, 0x01, 0x02, 0xAC, 0x02]);
        assert_eq!(stats.output_size, 5);
        assert_eq!(stats.cached_strings, 0);

        let mut json = Vec::new();
        let stats =
            decode_stream(&encoding, &packed[..], &mut json, &DecodeOptions::default(), false)
                .unwrap();
        assert_eq!(json, b"[1,2,300]\n");
        assert_eq!(stats.output_size, 10);
    }

    #[test]
    fn pretty_output() {
        let mut packed = Vec::new();
        encode_stream(
            &Encoding::any(),
            &br#"{"a":[1]}"#[..],
            &mut packed,
            &EncodeOptions::default(),
        )
        .unwrap();
        let mut json = Vec::new();
        decode_stream(
            &Encoding::any(),
            &packed[..],
            &mut json,
            &DecodeOptions::default(),
            true,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(json).unwrap(),
            "{\n  \"a\": [\n    1\n  ]\n}\n"
        );
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = encode_stream(
            &Encoding::any(),
            &b"{not json"[..],
            io::sink(),
            &EncodeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IoError::Json(_)));
    }

    #[test]
    fn truncated_input_is_reported() {
        let err = decode_stream(
            &Encoding::any(),
            &[0x25, 0x66][..],
            io::sink(),
            &DecodeOptions::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, IoError::Decode(_)));
    }
}
