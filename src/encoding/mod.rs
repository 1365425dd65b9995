// Encoding descriptors: the schema-derived instructions that tell the encoder
// and decoder how each location of a document is laid out on the wire.
//
// A descriptor tree is immutable once built. Array and object descriptors
// hold their children behind `Arc`, so one tree can be shared by many
// encoding sessions and threads.

pub mod loader;
pub mod tag;

use std::sync::Arc;

use serde_json::Value;

use crate::numeric::{count_multiples, is_byte};

/// Error returned when descriptor parameters break a variant's invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {encoding} options: {reason}")]
pub struct EncodingError {
    pub encoding: &'static str,
    pub reason: String,
}

impl EncodingError {
    pub(crate) fn new(encoding: &'static str, reason: impl Into<String>) -> Self {
        Self {
            encoding,
            reason: reason.into(),
        }
    }
}

/// A wire layout for one location of a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoding {
    // --- integers ---
    /// One byte holding the index of `value / multiplier` among the
    /// multiples in `[minimum, maximum]`.
    BoundedMultiple8BitsEnumFixed {
        minimum: i64,
        maximum: i64,
        multiplier: u64,
    },
    /// Varint distance of `value / multiplier` above the lowest multiple.
    FloorMultipleEnumVarint { minimum: i64, multiplier: u64 },
    /// Varint distance of `value / multiplier` below the highest multiple.
    RoofMultipleMirrorEnumVarint { maximum: i64, multiplier: u64 },
    /// Zigzag varint of `value / multiplier`.
    ArbitraryMultipleZigzagVarint { multiplier: u64 },

    // --- numbers ---
    /// Zigzag varint of the decimal digits, then a varint point position.
    DoubleVarintTuple,

    // --- enumerations and any ---
    ByteChoiceIndex { choices: Vec<Value> },
    LargeChoiceIndex { choices: Vec<Value> },
    /// Like `ByteChoiceIndex`, but the first choice costs zero bytes. Only
    /// valid as the last value of a stream.
    TopLevelByteChoiceIndex { choices: Vec<Value> },
    ConstNone { value: Value },
    AnyPackedTypeTagBytePrefix,

    // --- strings ---
    Utf8StringNoLength { size: u64 },
    FloorVarintPrefixUtf8StringShared { minimum: u64 },
    RoofVarintPrefixUtf8StringShared { maximum: u64 },
    Bounded8BitPrefixUtf8StringShared { minimum: u64, maximum: u64 },
    Rfc3339DateIntegerTriplet,
    PrefixVarintLengthStringShared,

    // --- arrays ---
    FixedTypedArray {
        size: u64,
        encoding: Arc<Encoding>,
        prefix_encodings: Vec<Encoding>,
    },
    Bounded8BitsTypedArray {
        minimum: u64,
        maximum: u64,
        encoding: Arc<Encoding>,
        prefix_encodings: Vec<Encoding>,
    },
    FloorTypedArray {
        minimum: u64,
        encoding: Arc<Encoding>,
        prefix_encodings: Vec<Encoding>,
    },
    RoofTypedArray {
        maximum: u64,
        encoding: Arc<Encoding>,
        prefix_encodings: Vec<Encoding>,
    },

    // --- objects ---
    FixedTypedArbitraryObject {
        size: u64,
        key_encoding: Arc<Encoding>,
        encoding: Arc<Encoding>,
    },
    VarintTypedArbitraryObject {
        key_encoding: Arc<Encoding>,
        encoding: Arc<Encoding>,
    },
}

impl Encoding {
    /// The schema-less fallback.
    pub const fn any() -> Self {
        Encoding::AnyPackedTypeTagBytePrefix
    }

    /// Configuration name of the variant, as used by the loader.
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::BoundedMultiple8BitsEnumFixed { .. } => "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
            Encoding::FloorMultipleEnumVarint { .. } => "FLOOR_MULTIPLE_ENUM_VARINT",
            Encoding::RoofMultipleMirrorEnumVarint { .. } => "ROOF_MULTIPLE_MIRROR_ENUM_VARINT",
            Encoding::ArbitraryMultipleZigzagVarint { .. } => "ARBITRARY_MULTIPLE_ZIGZAG_VARINT",
            Encoding::DoubleVarintTuple => "DOUBLE_VARINT_TUPLE",
            Encoding::ByteChoiceIndex { .. } => "BYTE_CHOICE_INDEX",
            Encoding::LargeChoiceIndex { .. } => "LARGE_CHOICE_INDEX",
            Encoding::TopLevelByteChoiceIndex { .. } => "TOP_LEVEL_BYTE_CHOICE_INDEX",
            Encoding::ConstNone { .. } => "CONST_NONE",
            Encoding::AnyPackedTypeTagBytePrefix => "ANY_PACKED_TYPE_TAG_BYTE_PREFIX",
            Encoding::Utf8StringNoLength { .. } => "UTF8_STRING_NO_LENGTH",
            Encoding::FloorVarintPrefixUtf8StringShared { .. } => {
                "FLOOR_VARINT_PREFIX_UTF8_STRING_SHARED"
            }
            Encoding::RoofVarintPrefixUtf8StringShared { .. } => {
                "ROOF_VARINT_PREFIX_UTF8_STRING_SHARED"
            }
            Encoding::Bounded8BitPrefixUtf8StringShared { .. } => {
                "BOUNDED_8BIT_PREFIX_UTF8_STRING_SHARED"
            }
            Encoding::Rfc3339DateIntegerTriplet => "RFC3339_DATE_INTEGER_TRIPLET",
            Encoding::PrefixVarintLengthStringShared => "PREFIX_VARINT_LENGTH_STRING_SHARED",
            Encoding::FixedTypedArray { .. } => "FIXED_TYPED_ARRAY",
            Encoding::Bounded8BitsTypedArray { .. } => "BOUNDED_8BITS_TYPED_ARRAY",
            Encoding::FloorTypedArray { .. } => "FLOOR_TYPED_ARRAY",
            Encoding::RoofTypedArray { .. } => "ROOF_TYPED_ARRAY",
            Encoding::FixedTypedArbitraryObject { .. } => "FIXED_TYPED_ARBITRARY_OBJECT",
            Encoding::VarintTypedArbitraryObject { .. } => "VARINT_TYPED_ARBITRARY_OBJECT",
        }
    }

    /// Check the parameter invariants of this descriptor and all of its
    /// children.
    pub fn validate(&self) -> Result<(), EncodingError> {
        let name = self.name();
        match self {
            Encoding::BoundedMultiple8BitsEnumFixed {
                minimum,
                maximum,
                multiplier,
            } => {
                check_multiplier(name, *multiplier)?;
                if minimum > maximum {
                    return Err(EncodingError::new(
                        name,
                        format!("minimum {minimum} exceeds maximum {maximum}"),
                    ));
                }
                let count = count_multiples(*minimum, *maximum, *multiplier);
                if count == 0 {
                    return Err(EncodingError::new(
                        name,
                        format!("no multiple of {multiplier} in [{minimum}, {maximum}]"),
                    ));
                }
                if !is_byte(count - 1) {
                    return Err(EncodingError::new(
                        name,
                        format!("{count} values do not fit in a byte"),
                    ));
                }
            }
            Encoding::FloorMultipleEnumVarint { multiplier, .. }
            | Encoding::RoofMultipleMirrorEnumVarint { multiplier, .. }
            | Encoding::ArbitraryMultipleZigzagVarint { multiplier } => {
                check_multiplier(name, *multiplier)?;
            }
            Encoding::ByteChoiceIndex { choices }
            | Encoding::TopLevelByteChoiceIndex { choices } => {
                check_choices(name, choices)?;
                if choices.len() > 256 {
                    return Err(EncodingError::new(
                        name,
                        format!("{} choices do not fit in a byte", choices.len()),
                    ));
                }
            }
            Encoding::LargeChoiceIndex { choices } => check_choices(name, choices)?,
            Encoding::Bounded8BitPrefixUtf8StringShared { minimum, maximum } => {
                check_bounds(name, *minimum, *maximum)?;
                // The prefix stores `length - minimum + 1`.
                if maximum - minimum >= u64::from(u8::MAX) {
                    return Err(EncodingError::new(
                        name,
                        format!("length range [{minimum}, {maximum}] does not fit in a byte"),
                    ));
                }
            }
            Encoding::FixedTypedArray {
                encoding,
                prefix_encodings,
                ..
            }
            | Encoding::FloorTypedArray {
                encoding,
                prefix_encodings,
                ..
            }
            | Encoding::RoofTypedArray {
                encoding,
                prefix_encodings,
                ..
            } => {
                encoding.validate()?;
                prefix_encodings.iter().try_for_each(Encoding::validate)?;
            }
            Encoding::Bounded8BitsTypedArray {
                minimum,
                maximum,
                encoding,
                prefix_encodings,
            } => {
                check_bounds(name, *minimum, *maximum)?;
                if !is_byte(maximum - minimum) {
                    return Err(EncodingError::new(
                        name,
                        format!("size range [{minimum}, {maximum}] does not fit in a byte"),
                    ));
                }
                encoding.validate()?;
                prefix_encodings.iter().try_for_each(Encoding::validate)?;
            }
            Encoding::FixedTypedArbitraryObject {
                key_encoding,
                encoding,
                ..
            }
            | Encoding::VarintTypedArbitraryObject {
                key_encoding,
                encoding,
            } => {
                key_encoding.validate()?;
                encoding.validate()?;
            }
            Encoding::DoubleVarintTuple
            | Encoding::ConstNone { .. }
            | Encoding::AnyPackedTypeTagBytePrefix
            | Encoding::Utf8StringNoLength { .. }
            | Encoding::FloorVarintPrefixUtf8StringShared { .. }
            | Encoding::RoofVarintPrefixUtf8StringShared { .. }
            | Encoding::Rfc3339DateIntegerTriplet
            | Encoding::PrefixVarintLengthStringShared => {}
        }
        Ok(())
    }
}

/// Article-prefixed name of a JSON value's type, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(number) if number.is_f64() => "a real number",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn check_multiplier(name: &'static str, multiplier: u64) -> Result<(), EncodingError> {
    if multiplier == 0 {
        return Err(EncodingError::new(name, "multiplier must be positive"));
    }
    Ok(())
}

fn check_bounds(name: &'static str, minimum: u64, maximum: u64) -> Result<(), EncodingError> {
    if minimum > maximum {
        return Err(EncodingError::new(
            name,
            format!("minimum {minimum} exceeds maximum {maximum}"),
        ));
    }
    Ok(())
}

fn check_choices(name: &'static str, choices: &[Value]) -> Result<(), EncodingError> {
    if choices.is_empty() {
        return Err(EncodingError::new(name, "choices must not be empty"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
