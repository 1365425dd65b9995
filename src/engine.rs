// One-shot APIs: encode a whole document to a buffer, decode a whole buffer
// to a document.
//
// Each call is one session. Descriptors are validated up front so that a
// hand-built `Encoding` fails with `InvalidEncoding` before any byte is
// written or read.

use serde_json::Value;

use crate::codec::{CacheConfig, DEFAULT_MAX_DEPTH, DecodeError, Decoder, EncodeError, Encoder};
use crate::encoding::Encoding;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// String cache tuning. Affects output size only.
    pub cache: CacheConfig,
    /// Maximum nesting of arrays and objects. Keep it at or below the
    /// decoder's limit so every encoded document decodes.
    pub max_depth: usize,
}

impl EncodeOptions {
    /// Options that never emit back-references.
    pub const fn without_shared_strings() -> Self {
        Self {
            cache: CacheConfig::disabled(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting of arrays and objects.
    pub max_depth: usize,
    /// Accept bytes left over after the document.
    pub allow_trailing_data: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_trailing_data: false,
        }
    }
}

// ---------------------------------------------------------------------------
// High-level encode
// ---------------------------------------------------------------------------

/// Encode `document` laid out as `encoding` with default options.
pub fn encode(document: &Value, encoding: &Encoding) -> Result<Vec<u8>, EncodeError> {
    encode_with_options(document, encoding, &EncodeOptions::default())
}

/// Encode with custom options.
pub fn encode_with_options(
    document: &Value,
    encoding: &Encoding,
    opts: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    encoding.validate()?;
    let mut encoder =
        Encoder::with_cache_config(Vec::new(), opts.cache).with_max_depth(opts.max_depth);
    encoder.encode(document, encoding)?;
    log::debug!(
        "encoded {} as {} bytes, {} cached strings",
        encoding.name(),
        encoder.position(),
        encoder.cache().len()
    );
    Ok(encoder.into_inner())
}

/// Encode independent documents on the rayon pool, one session each.
///
/// Results are returned in input order.
#[cfg(feature = "parallel")]
pub fn encode_batch(
    documents: &[Value],
    encoding: &Encoding,
    opts: &EncodeOptions,
) -> Vec<Result<Vec<u8>, EncodeError>> {
    use rayon::prelude::*;

    documents
        .par_iter()
        .map(|document| encode_with_options(document, encoding, opts))
        .collect()
}

// ---------------------------------------------------------------------------
// High-level decode
// ---------------------------------------------------------------------------

/// Decode one document from `bytes` with default options.
pub fn decode(bytes: &[u8], encoding: &Encoding) -> Result<Value, DecodeError> {
    decode_with_options(bytes, encoding, &DecodeOptions::default())
}

/// Decode with custom options.
pub fn decode_with_options(
    bytes: &[u8],
    encoding: &Encoding,
    opts: &DecodeOptions,
) -> Result<Value, DecodeError> {
    encoding.validate()?;
    let mut decoder = Decoder::with_max_depth(bytes, opts.max_depth);
    let document = decoder.decode(encoding)?;
    if !opts.allow_trailing_data {
        decoder.finish()?;
    }
    log::debug!(
        "decoded {} from {} of {} bytes",
        encoding.name(),
        decoder.position(),
        bytes.len()
    );
    Ok(document)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
