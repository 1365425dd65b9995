// Descriptor configuration: JSON objects of the form
//
//   { "binpackEncoding": "FLOOR_TYPED_ARRAY",
//     "binpackOptions": { "minimum": 0, "encoding": { ... }, "prefixEncodings": [] } }
//
// `load` builds and validates an `Encoding` tree, `to_json` is its inverse.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use super::{Encoding, EncodingError, value_kind};
use crate::codec::DEFAULT_MAX_DEPTH;

pub const ENCODING_KEY: &str = "binpackEncoding";
pub const OPTIONS_KEY: &str = "binpackOptions";

/// Wire names of every encoding, in declaration order.
pub const NAMES: [&str; 22] = [
    "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
    "FLOOR_MULTIPLE_ENUM_VARINT",
    "ROOF_MULTIPLE_MIRROR_ENUM_VARINT",
    "ARBITRARY_MULTIPLE_ZIGZAG_VARINT",
    "DOUBLE_VARINT_TUPLE",
    "BYTE_CHOICE_INDEX",
    "LARGE_CHOICE_INDEX",
    "TOP_LEVEL_BYTE_CHOICE_INDEX",
    "CONST_NONE",
    "ANY_PACKED_TYPE_TAG_BYTE_PREFIX",
    "UTF8_STRING_NO_LENGTH",
    "FLOOR_VARINT_PREFIX_UTF8_STRING_SHARED",
    "ROOF_VARINT_PREFIX_UTF8_STRING_SHARED",
    "BOUNDED_8BIT_PREFIX_UTF8_STRING_SHARED",
    "RFC3339_DATE_INTEGER_TRIPLET",
    "PREFIX_VARINT_LENGTH_STRING_SHARED",
    "FIXED_TYPED_ARRAY",
    "BOUNDED_8BITS_TYPED_ARRAY",
    "FLOOR_TYPED_ARRAY",
    "ROOF_TYPED_ARRAY",
    "FIXED_TYPED_ARBITRARY_OBJECT",
    "VARINT_TYPED_ARBITRARY_OBJECT",
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for descriptor configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Configuration text is not valid JSON.
    #[error("invalid descriptor JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A descriptor is not a JSON object.
    #[error("descriptor must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
    /// A descriptor lacks the `binpackEncoding` name.
    #[error("descriptor is missing the \"binpackEncoding\" name")]
    MissingName,
    /// The `binpackEncoding` name is not a known variant.
    #[error("unrecognized encoding: {0}")]
    UnrecognizedEncoding(String),
    #[error("{encoding}: missing option \"{option}\"")]
    MissingOption {
        encoding: &'static str,
        option: &'static str,
    },
    #[error("{encoding}: option \"{option}\" must be {expected}")]
    InvalidOption {
        encoding: &'static str,
        option: &'static str,
        expected: &'static str,
    },
    /// Descriptors nested deeper than the codec's nesting limit.
    #[error("descriptor nesting deeper than {limit} levels")]
    TooDeep { limit: usize },
    /// Options parsed but violate the variant's invariants.
    #[error(transparent)]
    Invalid(#[from] EncodingError),
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Build a validated descriptor from its JSON configuration.
pub fn load(config: &Value) -> Result<Encoding, LoadError> {
    let encoding = parse(config, 0)?;
    encoding.validate()?;
    log::debug!("loaded {} descriptor", encoding.name());
    Ok(encoding)
}

/// Parse JSON text and [`load`] it.
pub fn from_str(text: &str) -> Result<Encoding, LoadError> {
    let config: Value = serde_json::from_str(text)?;
    load(&config)
}

fn parse(config: &Value, depth: usize) -> Result<Encoding, LoadError> {
    if depth >= DEFAULT_MAX_DEPTH {
        return Err(LoadError::TooDeep {
            limit: DEFAULT_MAX_DEPTH,
        });
    }
    let object = config.as_object().ok_or(LoadError::NotAnObject {
        found: value_kind(config),
    })?;
    let raw = object
        .get(ENCODING_KEY)
        .and_then(Value::as_str)
        .ok_or(LoadError::MissingName)?;
    let name = NAMES
        .iter()
        .copied()
        .find(|name| *name == raw)
        .ok_or_else(|| LoadError::UnrecognizedEncoding(raw.to_owned()))?;
    let options = Options {
        encoding: name,
        map: object.get(OPTIONS_KEY).and_then(Value::as_object),
        depth,
    };

    let encoding = match name {
        "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED" => Encoding::BoundedMultiple8BitsEnumFixed {
            minimum: options.signed("minimum")?,
            maximum: options.signed("maximum")?,
            multiplier: options.unsigned("multiplier")?,
        },
        "FLOOR_MULTIPLE_ENUM_VARINT" => Encoding::FloorMultipleEnumVarint {
            minimum: options.signed("minimum")?,
            multiplier: options.unsigned("multiplier")?,
        },
        "ROOF_MULTIPLE_MIRROR_ENUM_VARINT" => Encoding::RoofMultipleMirrorEnumVarint {
            maximum: options.signed("maximum")?,
            multiplier: options.unsigned("multiplier")?,
        },
        "ARBITRARY_MULTIPLE_ZIGZAG_VARINT" => Encoding::ArbitraryMultipleZigzagVarint {
            multiplier: options.unsigned("multiplier")?,
        },
        "DOUBLE_VARINT_TUPLE" => Encoding::DoubleVarintTuple,
        "BYTE_CHOICE_INDEX" => Encoding::ByteChoiceIndex {
            choices: options.array("choices")?.clone(),
        },
        "LARGE_CHOICE_INDEX" => Encoding::LargeChoiceIndex {
            choices: options.array("choices")?.clone(),
        },
        "TOP_LEVEL_BYTE_CHOICE_INDEX" => Encoding::TopLevelByteChoiceIndex {
            choices: options.array("choices")?.clone(),
        },
        "CONST_NONE" => Encoding::ConstNone {
            value: options.value("value")?.clone(),
        },
        "ANY_PACKED_TYPE_TAG_BYTE_PREFIX" => Encoding::AnyPackedTypeTagBytePrefix,
        "UTF8_STRING_NO_LENGTH" => Encoding::Utf8StringNoLength {
            size: options.unsigned("size")?,
        },
        "FLOOR_VARINT_PREFIX_UTF8_STRING_SHARED" => Encoding::FloorVarintPrefixUtf8StringShared {
            minimum: options.unsigned("minimum")?,
        },
        "ROOF_VARINT_PREFIX_UTF8_STRING_SHARED" => Encoding::RoofVarintPrefixUtf8StringShared {
            maximum: options.unsigned("maximum")?,
        },
        "BOUNDED_8BIT_PREFIX_UTF8_STRING_SHARED" => Encoding::Bounded8BitPrefixUtf8StringShared {
            minimum: options.unsigned("minimum")?,
            maximum: options.unsigned("maximum")?,
        },
        "RFC3339_DATE_INTEGER_TRIPLET" => Encoding::Rfc3339DateIntegerTriplet,
        "PREFIX_VARINT_LENGTH_STRING_SHARED" => Encoding::PrefixVarintLengthStringShared,
        "FIXED_TYPED_ARRAY" => Encoding::FixedTypedArray {
            size: options.unsigned("size")?,
            encoding: options.child("encoding")?,
            prefix_encodings: options.children("prefixEncodings")?,
        },
        "BOUNDED_8BITS_TYPED_ARRAY" => Encoding::Bounded8BitsTypedArray {
            minimum: options.unsigned("minimum")?,
            maximum: options.unsigned("maximum")?,
            encoding: options.child("encoding")?,
            prefix_encodings: options.children("prefixEncodings")?,
        },
        "FLOOR_TYPED_ARRAY" => Encoding::FloorTypedArray {
            minimum: options.unsigned("minimum")?,
            encoding: options.child("encoding")?,
            prefix_encodings: options.children("prefixEncodings")?,
        },
        "ROOF_TYPED_ARRAY" => Encoding::RoofTypedArray {
            maximum: options.unsigned("maximum")?,
            encoding: options.child("encoding")?,
            prefix_encodings: options.children("prefixEncodings")?,
        },
        "FIXED_TYPED_ARBITRARY_OBJECT" => Encoding::FixedTypedArbitraryObject {
            size: options.unsigned("size")?,
            key_encoding: options.child("keyEncoding")?,
            encoding: options.child("encoding")?,
        },
        "VARINT_TYPED_ARBITRARY_OBJECT" => Encoding::VarintTypedArbitraryObject {
            key_encoding: options.child("keyEncoding")?,
            encoding: options.child("encoding")?,
        },
        other => return Err(LoadError::UnrecognizedEncoding(other.to_owned())),
    };
    debug_assert_eq!(encoding.name(), name);
    Ok(encoding)
}

/// Typed accessors over a `binpackOptions` object.
struct Options<'a> {
    encoding: &'static str,
    map: Option<&'a Map<String, Value>>,
    /// Nesting level of the descriptor these options belong to.
    depth: usize,
}

impl<'a> Options<'a> {
    fn value(&self, option: &'static str) -> Result<&'a Value, LoadError> {
        self.map
            .and_then(|map| map.get(option))
            .ok_or(LoadError::MissingOption {
                encoding: self.encoding,
                option,
            })
    }

    fn invalid(&self, option: &'static str, expected: &'static str) -> LoadError {
        LoadError::InvalidOption {
            encoding: self.encoding,
            option,
            expected,
        }
    }

    fn signed(&self, option: &'static str) -> Result<i64, LoadError> {
        self.value(option)?
            .as_i64()
            .ok_or_else(|| self.invalid(option, "a 64-bit signed integer"))
    }

    fn unsigned(&self, option: &'static str) -> Result<u64, LoadError> {
        self.value(option)?
            .as_u64()
            .ok_or_else(|| self.invalid(option, "a non-negative integer"))
    }

    fn array(&self, option: &'static str) -> Result<&'a Vec<Value>, LoadError> {
        self.value(option)?
            .as_array()
            .ok_or_else(|| self.invalid(option, "an array"))
    }

    fn child(&self, option: &'static str) -> Result<Arc<Encoding>, LoadError> {
        parse(self.value(option)?, self.depth + 1).map(Arc::new)
    }

    /// Optional list of descriptors; absent means empty.
    fn children(&self, option: &'static str) -> Result<Vec<Encoding>, LoadError> {
        match self.map.and_then(|map| map.get(option)) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| parse(item, self.depth + 1))
                .collect(),
            Some(_) => Err(self.invalid(option, "an array of descriptors")),
        }
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Render a descriptor back into its JSON configuration.
pub fn to_json(encoding: &Encoding) -> Value {
    let options = match encoding {
        Encoding::BoundedMultiple8BitsEnumFixed {
            minimum,
            maximum,
            multiplier,
        } => json!({ "minimum": minimum, "maximum": maximum, "multiplier": multiplier }),
        Encoding::FloorMultipleEnumVarint {
            minimum,
            multiplier,
        } => json!({ "minimum": minimum, "multiplier": multiplier }),
        Encoding::RoofMultipleMirrorEnumVarint {
            maximum,
            multiplier,
        } => json!({ "maximum": maximum, "multiplier": multiplier }),
        Encoding::ArbitraryMultipleZigzagVarint { multiplier } => {
            json!({ "multiplier": multiplier })
        }
        Encoding::ByteChoiceIndex { choices }
        | Encoding::LargeChoiceIndex { choices }
        | Encoding::TopLevelByteChoiceIndex { choices } => json!({ "choices": choices }),
        Encoding::ConstNone { value } => json!({ "value": value }),
        Encoding::Utf8StringNoLength { size } => json!({ "size": size }),
        Encoding::FloorVarintPrefixUtf8StringShared { minimum } => json!({ "minimum": minimum }),
        Encoding::RoofVarintPrefixUtf8StringShared { maximum } => json!({ "maximum": maximum }),
        Encoding::Bounded8BitPrefixUtf8StringShared { minimum, maximum } => {
            json!({ "minimum": minimum, "maximum": maximum })
        }
        Encoding::FixedTypedArray {
            size,
            encoding,
            prefix_encodings,
        } => json!({
            "size": size,
            "encoding": to_json(encoding),
            "prefixEncodings": prefix_encodings.iter().map(to_json).collect::<Vec<_>>(),
        }),
        Encoding::Bounded8BitsTypedArray {
            minimum,
            maximum,
            encoding,
            prefix_encodings,
        } => json!({
            "minimum": minimum,
            "maximum": maximum,
            "encoding": to_json(encoding),
            "prefixEncodings": prefix_encodings.iter().map(to_json).collect::<Vec<_>>(),
        }),
        Encoding::FloorTypedArray {
            minimum,
            encoding,
            prefix_encodings,
        } => json!({
            "minimum": minimum,
            "encoding": to_json(encoding),
            "prefixEncodings": prefix_encodings.iter().map(to_json).collect::<Vec<_>>(),
        }),
        Encoding::RoofTypedArray {
            maximum,
            encoding,
            prefix_encodings,
        } => json!({
            "maximum": maximum,
            "encoding": to_json(encoding),
            "prefixEncodings": prefix_encodings.iter().map(to_json).collect::<Vec<_>>(),
        }),
        Encoding::FixedTypedArbitraryObject {
            size,
            key_encoding,
            encoding,
        } => json!({
            "size": size,
            "keyEncoding": to_json(key_encoding),
            "encoding": to_json(encoding),
        }),
        Encoding::VarintTypedArbitraryObject {
            key_encoding,
            encoding,
        } => json!({
            "keyEncoding": to_json(key_encoding),
            "encoding": to_json(encoding),
        }),
        Encoding::DoubleVarintTuple
        | Encoding::AnyPackedTypeTagBytePrefix
        | Encoding::Rfc3339DateIntegerTriplet
        | Encoding::PrefixVarintLengthStringShared => json!({}),
    };
    json!({ ENCODING_KEY: encoding.name(), OPTIONS_KEY: options })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
