//! Oxipack: schema-directed binary serialization of JSON documents.
//!
//! An [`Encoding`](encoding::Encoding) tree describes how each location of a
//! document is laid out on the wire. Bounded integers shrink to a byte,
//! constants vanish, and repeated strings become back-references. Without a
//! schema, `ANY_PACKED_TYPE_TAG_BYTE_PREFIX` still packs any JSON value.
//!
//! The crate provides:
//! - Byte-level stream primitives (`stream`)
//! - The descriptor model and its JSON loader (`encoding`)
//! - The encoder, decoder and string cache (`codec`)
//! - One-shot APIs (`engine`) and file helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use oxipack::encoding::loader;
//! use oxipack::engine;
//! use serde_json::json;
//!
//! let encoding = loader::from_str(r#"{
//!     "binpackEncoding": "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
//!     "binpackOptions": { "minimum": -100, "maximum": 100, "multiplier": 5 }
//! }"#).unwrap();
//!
//! let bytes = engine::encode(&json!(5), &encoding).unwrap();
//! assert_eq!(bytes, [21]);
//! assert_eq!(engine::decode(&bytes, &encoding).unwrap(), json!(5));
//! ```

pub mod codec;
pub mod encoding;
pub mod engine;
pub mod io;
pub mod numeric;
pub mod stream;

#[cfg(feature = "cli")]
pub mod cli;
