// Codec layer: descriptor-driven encoding and decoding of JSON values.
//
// The encoder owns the string cache; the decoder resolves shared strings by
// following back-references and needs no cache of its own.

pub mod cache;
pub mod decoder;
pub mod encoder;

pub use cache::{Cache, CacheConfig, CacheKind};
pub use decoder::{DEFAULT_MAX_DEPTH, DecodeError, Decoder};
pub use encoder::{EncodeError, Encoder};
