// Descriptor-driven decoder: the inverse of `Encoder`.
//
// Works over an in-memory buffer because shared strings are resolved by
// seeking backwards. Every read is bounds-checked and every decoded quantity
// is checked against the descriptor, so arbitrary input produces an error
// rather than a panic.

use serde_json::{Map, Number, Value};

use crate::encoding::tag;
use crate::encoding::{Encoding, EncodingError, value_kind};
use crate::numeric::{divide_ceil, divide_floor};
use crate::stream::{InputStream, ReadError};

/// Nesting limit for arrays and objects, matching serde_json's parser.
pub const DEFAULT_MAX_DEPTH: usize = 128;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for decoding bytes against a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Read(#[from] ReadError),
    /// Tag byte with no meaning in ANY_PACKED_TYPE_TAG_BYTE_PREFIX.
    #[error("invalid type tag {tag:#04x} at offset {offset}")]
    InvalidTag { offset: u64, tag: u8 },
    #[error("{encoding}: choice index {index} out of range for {count} choices")]
    ChoiceOutOfRange {
        encoding: &'static str,
        index: u64,
        count: usize,
    },
    /// Decoded quantity falls outside what the descriptor allows.
    #[error("{encoding}: {reason}")]
    OutOfRange {
        encoding: &'static str,
        reason: String,
    },
    #[error("{encoding}: decoded integer does not fit 64 bits")]
    IntegerOverflow { encoding: &'static str },
    /// Pointer chain that does not move strictly backwards.
    #[error("invalid back-reference of {distance} bytes at offset {offset}")]
    InvalidBackReference { offset: u64, distance: u64 },
    #[error("RFC3339_DATE_INTEGER_TRIPLET: invalid date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: u16, month: u8, day: u8 },
    #[error("{encoding}: object key decoded to {found}, expected a string")]
    NonStringKey {
        encoding: &'static str,
        found: &'static str,
    },
    #[error("{encoding}: duplicate object key {key:?}")]
    DuplicateKey { encoding: &'static str, key: String },
    #[error("nesting deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: u64 },
    #[error("{remaining} trailing bytes after offset {offset}")]
    TrailingData { offset: u64, remaining: u64 },
    #[error(transparent)]
    InvalidEncoding(#[from] EncodingError),
}

fn out_of_range(encoding: &'static str, reason: impl Into<String>) -> DecodeError {
    DecodeError::OutOfRange {
        encoding,
        reason: reason.into(),
    }
}

fn check_multiplier(encoding: &'static str, multiplier: u64) -> Result<(), DecodeError> {
    if multiplier == 0 {
        return Err(EncodingError::new(encoding, "multiplier must be positive").into());
    }
    Ok(())
}

/// `index * multiplier` as an `i64`.
fn scale(encoding: &'static str, index: i128, multiplier: u64) -> Result<i64, DecodeError> {
    index
        .checked_mul(i128::from(multiplier))
        .and_then(|value| i64::try_from(value).ok())
        .ok_or(DecodeError::IntegerOverflow { encoding })
}

fn real_value(encoding: &'static str, value: f64) -> Result<Value, DecodeError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| out_of_range(encoding, format!("{value} is not a finite number")))
}

/// How a shared string stores its length.
#[derive(Debug, Clone, Copy)]
enum LengthPrefix {
    /// Varint `length - minimum + 1`.
    Floor(u64),
    /// Varint `maximum - length + 1`.
    Roof(u64),
    /// Byte `length - minimum + 1`, length at most `maximum`.
    Bounded(u64, u64),
}

impl LengthPrefix {
    fn read(self, stream: &mut InputStream<'_>) -> Result<u64, ReadError> {
        match self {
            LengthPrefix::Bounded(..) => stream.get_byte().map(u64::from),
            LengthPrefix::Floor(_) | LengthPrefix::Roof(_) => stream.get_varint(),
        }
    }

    /// String length for a non-zero prefix.
    fn length(self, prefix: u64) -> Option<u64> {
        let offset = prefix.checked_sub(1)?;
        match self {
            LengthPrefix::Floor(minimum) => minimum.checked_add(offset),
            LengthPrefix::Roof(maximum) => maximum.checked_sub(offset),
            LengthPrefix::Bounded(minimum, maximum) => minimum
                .checked_add(offset)
                .filter(|length| *length <= maximum),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decoding session over an encoded buffer.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    stream: InputStream<'a>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_depth(data, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            stream: InputStream::new(data),
            depth: 0,
            max_depth,
        }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    #[inline]
    pub fn has_more_data(&self) -> bool {
        self.stream.has_more_data()
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.stream.remaining()
    }

    /// Read one value laid out as `encoding`.
    pub fn decode(&mut self, encoding: &Encoding) -> Result<Value, DecodeError> {
        let name = encoding.name();
        match encoding {
            Encoding::BoundedMultiple8BitsEnumFixed {
                minimum,
                maximum,
                multiplier,
            } => {
                check_multiplier(name, *multiplier)?;
                let index = i128::from(self.stream.get_byte()?);
                let value = scale(
                    name,
                    index + i128::from(divide_ceil(*minimum, *multiplier)),
                    *multiplier,
                )?;
                if value > *maximum {
                    return Err(out_of_range(name, format!("{value} exceeds maximum {maximum}")));
                }
                Ok(Value::from(value))
            }
            Encoding::FloorMultipleEnumVarint {
                minimum,
                multiplier,
            } => {
                check_multiplier(name, *multiplier)?;
                let index = i128::from(self.stream.get_varint()?);
                let value = scale(
                    name,
                    index + i128::from(divide_ceil(*minimum, *multiplier)),
                    *multiplier,
                )?;
                Ok(Value::from(value))
            }
            Encoding::RoofMultipleMirrorEnumVarint {
                maximum,
                multiplier,
            } => {
                check_multiplier(name, *multiplier)?;
                let index = i128::from(self.stream.get_varint()?);
                let value = scale(
                    name,
                    i128::from(divide_floor(*maximum, *multiplier)) - index,
                    *multiplier,
                )?;
                Ok(Value::from(value))
            }
            Encoding::ArbitraryMultipleZigzagVarint { multiplier } => {
                check_multiplier(name, *multiplier)?;
                let index = i128::from(self.stream.get_varint_zigzag()?);
                Ok(Value::from(scale(name, index, *multiplier)?))
            }
            Encoding::DoubleVarintTuple => self.double_varint_tuple(),
            Encoding::ByteChoiceIndex { choices } => {
                let index = u64::from(self.stream.get_byte()?);
                choice(name, choices, index)
            }
            Encoding::LargeChoiceIndex { choices } => {
                let index = self.stream.get_varint()?;
                choice(name, choices, index)
            }
            Encoding::TopLevelByteChoiceIndex { choices } => {
                let index = if self.stream.has_more_data() {
                    u64::from(self.stream.get_byte()?) + 1
                } else {
                    0
                };
                choice(name, choices, index)
            }
            Encoding::ConstNone { value } => Ok(value.clone()),
            Encoding::AnyPackedTypeTagBytePrefix => self.any(),
            Encoding::Utf8StringNoLength { size } => {
                Ok(Value::String(self.stream.get_string_utf8(*size)?))
            }
            Encoding::FloorVarintPrefixUtf8StringShared { minimum } => {
                self.shared_string(name, LengthPrefix::Floor(*minimum))
            }
            Encoding::RoofVarintPrefixUtf8StringShared { maximum } => {
                self.shared_string(name, LengthPrefix::Roof(*maximum))
            }
            Encoding::Bounded8BitPrefixUtf8StringShared { minimum, maximum } => {
                self.shared_string(name, LengthPrefix::Bounded(*minimum, *maximum))
            }
            Encoding::Rfc3339DateIntegerTriplet => {
                let year = self.stream.get_word()?;
                let month = self.stream.get_byte()?;
                let day = self.stream.get_byte()?;
                if year > 9999 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                    return Err(DecodeError::InvalidDate { year, month, day });
                }
                Ok(Value::String(format!("{year:04}-{month:02}-{day:02}")))
            }
            Encoding::PrefixVarintLengthStringShared => self
                .prefix_varint_length_string_shared()
                .map(Value::String),
            Encoding::FixedTypedArray {
                size,
                encoding,
                prefix_encodings,
            } => self.typed_items(*size, encoding, prefix_encodings),
            Encoding::Bounded8BitsTypedArray {
                minimum,
                maximum,
                encoding,
                prefix_encodings,
            } => {
                let size = minimum
                    .checked_add(u64::from(self.stream.get_byte()?))
                    .ok_or_else(|| out_of_range(name, "array size overflows"))?;
                if size > *maximum {
                    return Err(out_of_range(
                        name,
                        format!("array of {size} items exceeds maximum {maximum}"),
                    ));
                }
                self.typed_items(size, encoding, prefix_encodings)
            }
            Encoding::FloorTypedArray {
                minimum,
                encoding,
                prefix_encodings,
            } => {
                let size = minimum
                    .checked_add(self.stream.get_varint()?)
                    .ok_or_else(|| out_of_range(name, "array size overflows"))?;
                self.typed_items(size, encoding, prefix_encodings)
            }
            Encoding::RoofTypedArray {
                maximum,
                encoding,
                prefix_encodings,
            } => {
                let distance = self.stream.get_varint()?;
                let size = maximum.checked_sub(distance).ok_or_else(|| {
                    out_of_range(name, format!("size distance {distance} exceeds maximum {maximum}"))
                })?;
                self.typed_items(size, encoding, prefix_encodings)
            }
            Encoding::FixedTypedArbitraryObject {
                size,
                key_encoding,
                encoding,
            } => self.typed_entries(name, *size, key_encoding, encoding),
            Encoding::VarintTypedArbitraryObject {
                key_encoding,
                encoding,
            } => {
                let size = self.stream.get_varint()?;
                self.typed_entries(name, size, key_encoding, encoding)
            }
        }
    }

    /// Fail with `TrailingData` unless the whole buffer has been consumed.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.stream.has_more_data() {
            return Err(DecodeError::TrailingData {
                offset: self.stream.position(),
                remaining: self.stream.remaining(),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Scalars
    // -----------------------------------------------------------------------

    fn double_varint_tuple(&mut self) -> Result<Value, DecodeError> {
        const NAME: &str = "DOUBLE_VARINT_TUPLE";
        let digits = self.stream.get_varint_zigzag()?;
        let point = self.stream.get_varint()?;
        // Parsing rounds once; `digits as f64 / 10^point` would round twice
        // once digits exceed 2^53.
        let value: f64 = format!("{digits}e-{point}")
            .parse()
            .map_err(|_| out_of_range(NAME, format!("unreadable real {digits}e-{point}")))?;
        real_value(NAME, value)
    }

    fn shared_string(
        &mut self,
        encoding: &'static str,
        prefix: LengthPrefix,
    ) -> Result<Value, DecodeError> {
        let mut value = prefix.read(&mut self.stream)?;
        let shared = value == 0;
        if shared {
            value = prefix.read(&mut self.stream)?;
        }
        let length = prefix
            .length(value)
            .ok_or_else(|| out_of_range(encoding, format!("invalid length prefix {value}")))?;

        if !shared {
            return Ok(Value::String(self.stream.get_string_utf8(length)?));
        }
        self.string_at_distance(length).map(Value::String)
    }

    /// Read a varint distance, then `length` bytes that far back from the
    /// position preceding the distance, and resume after the distance.
    fn string_at_distance(&mut self, length: u64) -> Result<String, DecodeError> {
        let position = self.stream.position();
        let distance = self.stream.get_varint()?;
        let resume = self.stream.rewind(distance, position)?;
        log::trace!("shared string of {length} bytes, {distance} bytes back from {position}");
        let value = self.stream.get_string_utf8(length)?;
        self.stream.seek(resume)?;
        Ok(value)
    }

    fn prefix_varint_length_string_shared(&mut self) -> Result<String, DecodeError> {
        let mut resume = None;
        let mut prefix = self.stream.get_varint()?;
        // Pointers may point at pointers; each hop must move strictly back.
        while prefix == 0 {
            let sentinel = self.stream.position() - 1;
            let distance = self.stream.get_varint()?;
            let after = self.stream.rewind(distance, sentinel + 1)?;
            if self.stream.position() >= sentinel {
                return Err(DecodeError::InvalidBackReference {
                    offset: sentinel,
                    distance,
                });
            }
            resume.get_or_insert(after);
            prefix = self.stream.get_varint()?;
        }
        let value = self.stream.get_string_utf8(prefix - 1)?;
        if let Some(resume) = resume {
            self.stream.seek(resume)?;
        }
        Ok(value)
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    /// Run `body` one nesting level down. The level is released on error
    /// too, so a session stays usable after a failed value.
    fn nested<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        if self.depth >= self.max_depth {
            return Err(DecodeError::TooDeep {
                limit: self.max_depth,
                offset: self.stream.position(),
            });
        }
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    /// Preallocation bound: never trust a decoded size beyond the input left.
    fn capacity(&self, size: u64) -> usize {
        size.min(self.stream.remaining()) as usize
    }

    fn typed_items(
        &mut self,
        size: u64,
        encoding: &Encoding,
        prefix_encodings: &[Encoding],
    ) -> Result<Value, DecodeError> {
        self.nested(|this| {
            let mut items = Vec::with_capacity(this.capacity(size));
            for index in 0..size {
                let encoding = usize::try_from(index)
                    .ok()
                    .and_then(|index| prefix_encodings.get(index))
                    .unwrap_or(encoding);
                items.push(this.decode(encoding)?);
            }
            Ok(Value::Array(items))
        })
    }

    fn typed_entries(
        &mut self,
        name: &'static str,
        size: u64,
        key_encoding: &Encoding,
        encoding: &Encoding,
    ) -> Result<Value, DecodeError> {
        self.nested(|this| {
            let mut entries = Map::new();
            for _ in 0..size {
                let key = match this.decode(key_encoding)? {
                    Value::String(key) => key,
                    other => {
                        return Err(DecodeError::NonStringKey {
                            encoding: name,
                            found: value_kind(&other),
                        });
                    }
                };
                let value = this.decode(encoding)?;
                insert_unique(name, &mut entries, key, value)?;
            }
            Ok(Value::Object(entries))
        })
    }

    // -----------------------------------------------------------------------
    // ANY_PACKED_TYPE_TAG_BYTE_PREFIX
    // -----------------------------------------------------------------------

    fn any(&mut self) -> Result<Value, DecodeError> {
        const NAME: &str = "ANY_PACKED_TYPE_TAG_BYTE_PREFIX";
        let offset = self.stream.position();
        let byte = self.stream.get_byte()?;
        let subtype = tag::subtype(byte);

        match tag::kind(byte) {
            tag::TYPE_SHARED_STRING => {
                let length = if subtype == 0 {
                    self.floor_length(NAME)?
                } else {
                    u64::from(subtype - 1)
                };
                self.string_at_distance(length).map(Value::String)
            }
            tag::TYPE_STRING => {
                if subtype == 0 {
                    self.shared_string(NAME, LengthPrefix::Floor(tag::STRING_FLOOR_MINIMUM))
                } else {
                    let length = u64::from(subtype - 1);
                    Ok(Value::String(self.stream.get_string_utf8(length)?))
                }
            }
            tag::TYPE_LONG_STRING => {
                let length = u64::from(subtype) + tag::INLINE_LIMIT;
                Ok(Value::String(self.stream.get_string_utf8(length)?))
            }
            tag::TYPE_POSITIVE_INTEGER_BYTE => {
                let value = if subtype > 0 {
                    subtype - 1
                } else {
                    self.stream.get_byte()?
                };
                Ok(Value::from(value))
            }
            tag::TYPE_NEGATIVE_INTEGER_BYTE => {
                let value = if subtype > 0 {
                    -i64::from(subtype)
                } else {
                    -i64::from(self.stream.get_byte()?) - 1
                };
                Ok(Value::from(value))
            }
            tag::TYPE_ARRAY => {
                let size = self.any_size(NAME, subtype)?;
                self.nested(|this| {
                    let mut items = Vec::with_capacity(this.capacity(size));
                    for _ in 0..size {
                        items.push(this.any()?);
                    }
                    Ok(Value::Array(items))
                })
            }
            tag::TYPE_OBJECT => {
                let size = self.any_size(NAME, subtype)?;
                self.nested(|this| {
                    let mut entries = Map::new();
                    for _ in 0..size {
                        let key = this.prefix_varint_length_string_shared()?;
                        let value = this.any()?;
                        insert_unique(NAME, &mut entries, key, value)?;
                    }
                    Ok(Value::Object(entries))
                })
            }
            // TYPE_OTHER
            _ => match subtype {
                tag::SUBTYPE_FALSE => Ok(Value::Bool(false)),
                tag::SUBTYPE_TRUE => Ok(Value::Bool(true)),
                tag::SUBTYPE_NULL => Ok(Value::Null),
                tag::SUBTYPE_POSITIVE_INTEGER => {
                    let value = i64::try_from(self.stream.get_varint()?)
                        .map_err(|_| DecodeError::IntegerOverflow { encoding: NAME })?;
                    Ok(Value::from(value))
                }
                tag::SUBTYPE_NEGATIVE_INTEGER => {
                    let absolute = i64::try_from(self.stream.get_varint()?)
                        .map_err(|_| DecodeError::IntegerOverflow { encoding: NAME })?;
                    Ok(Value::from(-absolute - 1))
                }
                tag::SUBTYPE_NUMBER => self.double_varint_tuple(),
                tag::SUBTYPE_POSITIVE_REAL_INTEGER_BYTE => {
                    real_value(NAME, f64::from(self.stream.get_byte()?))
                }
                tag::SUBTYPE_LONG_STRING_BASE_EXPONENT_7..=tag::SUBTYPE_LONG_STRING_BASE_EXPONENT_10 => {
                    let length = self
                        .stream
                        .get_varint()?
                        .checked_add(1u64 << subtype)
                        .ok_or_else(|| out_of_range(NAME, "string length overflows"))?;
                    Ok(Value::String(self.stream.get_string_utf8(length)?))
                }
                _ => Err(DecodeError::InvalidTag { offset, tag: byte }),
            },
        }
    }

    /// Length of an ANY string stored as a floor prefix above the inline forms.
    fn floor_length(&mut self, encoding: &'static str) -> Result<u64, DecodeError> {
        let prefix = self.stream.get_varint()?;
        LengthPrefix::Floor(tag::STRING_FLOOR_MINIMUM)
            .length(prefix)
            .ok_or_else(|| out_of_range(encoding, format!("invalid length prefix {prefix}")))
    }

    fn any_size(&mut self, encoding: &'static str, subtype: u8) -> Result<u64, DecodeError> {
        if subtype > 0 {
            return Ok(u64::from(subtype - 1));
        }
        self.stream
            .get_varint()?
            .checked_add(tag::INLINE_LIMIT)
            .ok_or_else(|| out_of_range(encoding, "container size overflows"))
    }
}

fn choice(encoding: &'static str, choices: &[Value], index: u64) -> Result<Value, DecodeError> {
    usize::try_from(index)
        .ok()
        .and_then(|index| choices.get(index))
        .cloned()
        .ok_or(DecodeError::ChoiceOutOfRange {
            encoding,
            index,
            count: choices.len(),
        })
}

fn insert_unique(
    encoding: &'static str,
    entries: &mut Map<String, Value>,
    key: String,
    value: Value,
) -> Result<(), DecodeError> {
    if entries.contains_key(&key) {
        return Err(DecodeError::DuplicateKey { encoding, key });
    }
    entries.insert(key, value);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
