// Descriptor-driven encoder: walks a JSON value alongside its `Encoding`
// tree and emits the byte-exact wire layout of every location.
//
// One `Encoder` is one session. The string cache lives as long as the
// encoder, so strings repeated anywhere in the session become
// back-references.

use std::io::{self, Write};

use serde_json::Value;

use super::cache::{Cache, CacheConfig, CacheKind};
use super::decoder::DEFAULT_MAX_DEPTH;
use crate::encoding::tag::{self, pack};
use crate::encoding::{Encoding, EncodingError, value_kind};
use crate::numeric::{closest_smallest_exponent, divide_ceil, divide_floor, is_byte, real_digits};
use crate::stream::OutputStream;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for encoding a value against a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The value's JSON type is not the one the descriptor lays out.
    #[error("{encoding}: expected {expected}, got {found}")]
    TypeMismatch {
        encoding: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    /// A number, string length, array length or object size falls outside
    /// the descriptor's bounds.
    #[error("{encoding}: {reason}")]
    OutOfRange {
        encoding: &'static str,
        reason: String,
    },
    #[error("{encoding}: {value} is not a multiple of {multiplier}")]
    NotAMultiple {
        encoding: &'static str,
        value: i64,
        multiplier: u64,
    },
    #[error("{encoding}: value is not one of the {count} choices")]
    NotAChoice { encoding: &'static str, count: usize },
    #[error("CONST_NONE: value does not match the constant")]
    ConstMismatch,
    /// Real number without a finite digits/point representation.
    #[error("{encoding}: cannot represent {value}")]
    Unrepresentable { encoding: &'static str, value: f64 },
    #[error("RFC3339_DATE_INTEGER_TRIPLET: invalid date {0:?}")]
    InvalidDate(String),
    /// Deeper than a decoder with the same limit would accept.
    #[error("nesting deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: u64 },
    #[error(transparent)]
    InvalidEncoding(#[from] EncodingError),
}

fn out_of_range(encoding: &'static str, reason: impl Into<String>) -> EncodeError {
    EncodeError::OutOfRange {
        encoding,
        reason: reason.into(),
    }
}

fn mismatch(encoding: &'static str, expected: &'static str, document: &Value) -> EncodeError {
    EncodeError::TypeMismatch {
        encoding,
        expected,
        found: value_kind(document),
    }
}

// ---------------------------------------------------------------------------
// Value accessors
// ---------------------------------------------------------------------------

fn integer(encoding: &'static str, document: &Value) -> Result<i64, EncodeError> {
    match document {
        Value::Number(number) => match number.as_i64() {
            Some(value) => Ok(value),
            None if number.is_u64() => Err(out_of_range(
                encoding,
                format!("{number} does not fit a 64-bit signed integer"),
            )),
            None => Err(mismatch(encoding, "an integer", document)),
        },
        _ => Err(mismatch(encoding, "an integer", document)),
    }
}

fn real(encoding: &'static str, document: &Value) -> Result<f64, EncodeError> {
    document
        .as_f64()
        .ok_or_else(|| mismatch(encoding, "a number", document))
}

fn string<'v>(encoding: &'static str, document: &'v Value) -> Result<&'v str, EncodeError> {
    document
        .as_str()
        .ok_or_else(|| mismatch(encoding, "a string", document))
}

fn array<'v>(encoding: &'static str, document: &'v Value) -> Result<&'v [Value], EncodeError> {
    document
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| mismatch(encoding, "an array", document))
}

fn object<'v>(
    encoding: &'static str,
    document: &'v Value,
) -> Result<&'v serde_json::Map<String, Value>, EncodeError> {
    document
        .as_object()
        .ok_or_else(|| mismatch(encoding, "an object", document))
}

fn check_multiplier(encoding: &'static str, multiplier: u64) -> Result<(), EncodeError> {
    if multiplier == 0 {
        return Err(EncodingError::new(encoding, "multiplier must be positive").into());
    }
    Ok(())
}

/// `value / multiplier`, requiring an exact division.
fn quotient(encoding: &'static str, value: i64, multiplier: u64) -> Result<i64, EncodeError> {
    check_multiplier(encoding, multiplier)?;
    if value.unsigned_abs() % multiplier != 0 {
        return Err(EncodeError::NotAMultiple {
            encoding,
            value,
            multiplier,
        });
    }
    // |value / multiplier| <= |value|, so the cast is lossless.
    Ok((i128::from(value) / i128::from(multiplier)) as i64)
}

/// Parse `YYYY-MM-DD`.
fn parse_date(value: &str) -> Option<(u16, u8, u8)> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let number = |range: std::ops::Range<usize>| -> Option<u16> {
        bytes[range].iter().try_fold(0u16, |acc, &byte| {
            byte.is_ascii_digit().then(|| acc * 10 + u16::from(byte - b'0'))
        })
    };
    let year = number(0..4)?;
    let month = number(5..7)?;
    let day = number(8..10)?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some((year, month as u8, day as u8))
}

/// Length prefix of a shared string.
#[derive(Debug, Clone, Copy)]
enum LengthPrefix {
    Varint(u64),
    Byte(u8),
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encoding session over a `Write` sink.
#[derive(Debug)]
pub struct Encoder<W: Write> {
    stream: OutputStream<W>,
    cache: Cache,
    depth: usize,
    max_depth: usize,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self::with_cache_config(writer, CacheConfig::default())
    }

    pub fn with_cache_config(writer: W, config: CacheConfig) -> Self {
        Self {
            stream: OutputStream::new(writer),
            cache: Cache::with_config(config),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit nesting of arrays and objects to `max_depth` levels.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Bytes emitted so far in this session.
    #[inline]
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    #[inline]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }

    pub fn into_inner(self) -> W {
        self.stream.into_inner()
    }

    /// Emit `document` laid out as `encoding`.
    ///
    /// On error the stream may hold a partial encoding of `document`.
    pub fn encode(&mut self, document: &Value, encoding: &Encoding) -> Result<(), EncodeError> {
        let name = encoding.name();
        match encoding {
            Encoding::BoundedMultiple8BitsEnumFixed {
                minimum,
                maximum,
                multiplier,
            } => self.bounded_multiple_8bits_enum_fixed(
                integer(name, document)?,
                *minimum,
                *maximum,
                *multiplier,
            ),
            Encoding::FloorMultipleEnumVarint {
                minimum,
                multiplier,
            } => self.floor_multiple_enum_varint(integer(name, document)?, *minimum, *multiplier),
            Encoding::RoofMultipleMirrorEnumVarint {
                maximum,
                multiplier,
            } => self.roof_multiple_mirror_enum_varint(
                integer(name, document)?,
                *maximum,
                *multiplier,
            ),
            Encoding::ArbitraryMultipleZigzagVarint { multiplier } => {
                let value = quotient(name, integer(name, document)?, *multiplier)?;
                Ok(self.stream.put_varint_zigzag(value)?)
            }
            Encoding::DoubleVarintTuple => self.double_varint_tuple(real(name, document)?),
            Encoding::ByteChoiceIndex { choices } => {
                let index = choice_index(name, choices, document)?;
                let byte = u8::try_from(index)
                    .map_err(|_| out_of_range(name, format!("choice index {index} exceeds a byte")))?;
                Ok(self.stream.put_byte(byte)?)
            }
            Encoding::LargeChoiceIndex { choices } => {
                let index = choice_index(name, choices, document)?;
                Ok(self.stream.put_varint(index as u64)?)
            }
            Encoding::TopLevelByteChoiceIndex { choices } => {
                match choice_index(name, choices, document)? {
                    0 => Ok(()),
                    index => {
                        let byte = u8::try_from(index - 1).map_err(|_| {
                            out_of_range(name, format!("choice index {index} exceeds a byte"))
                        })?;
                        Ok(self.stream.put_byte(byte)?)
                    }
                }
            }
            Encoding::ConstNone { value } => {
                if document != value {
                    return Err(EncodeError::ConstMismatch);
                }
                Ok(())
            }
            Encoding::AnyPackedTypeTagBytePrefix => self.any(document),
            Encoding::Utf8StringNoLength { size } => {
                let value = string(name, document)?;
                if value.len() as u64 != *size {
                    return Err(out_of_range(
                        name,
                        format!("string of {} bytes, expected {size}", value.len()),
                    ));
                }
                Ok(self.stream.put_string_utf8(value)?)
            }
            Encoding::FloorVarintPrefixUtf8StringShared { minimum } => {
                self.floor_varint_prefix_utf8_string_shared(string(name, document)?, *minimum)
            }
            Encoding::RoofVarintPrefixUtf8StringShared { maximum } => {
                let value = string(name, document)?;
                let length = value.len() as u64;
                if length > *maximum {
                    return Err(out_of_range(
                        name,
                        format!("string of {length} bytes exceeds maximum {maximum}"),
                    ));
                }
                let prefix = (maximum - length)
                    .checked_add(1)
                    .ok_or_else(|| out_of_range(name, "length prefix overflows"))?;
                self.shared_string(value, LengthPrefix::Varint(prefix))
            }
            Encoding::Bounded8BitPrefixUtf8StringShared { minimum, maximum } => {
                let value = string(name, document)?;
                let length = value.len() as u64;
                if length < *minimum || length > *maximum {
                    return Err(out_of_range(
                        name,
                        format!("string of {length} bytes outside [{minimum}, {maximum}]"),
                    ));
                }
                let prefix = length - minimum + 1;
                if !is_byte(prefix) {
                    return Err(out_of_range(name, "length prefix exceeds a byte"));
                }
                self.shared_string(value, LengthPrefix::Byte(prefix as u8))
            }
            Encoding::Rfc3339DateIntegerTriplet => {
                let value = string(name, document)?;
                let (year, month, day) =
                    parse_date(value).ok_or_else(|| EncodeError::InvalidDate(value.to_owned()))?;
                self.stream.put_word(year)?;
                self.stream.put_byte(month)?;
                Ok(self.stream.put_byte(day)?)
            }
            Encoding::PrefixVarintLengthStringShared => {
                self.prefix_varint_length_string_shared(string(name, document)?)
            }
            Encoding::FixedTypedArray {
                size,
                encoding,
                prefix_encodings,
            } => {
                let items = array(name, document)?;
                if items.len() as u64 != *size {
                    return Err(out_of_range(
                        name,
                        format!("array of {} items, expected {size}", items.len()),
                    ));
                }
                self.typed_items(items, encoding, prefix_encodings)
            }
            Encoding::Bounded8BitsTypedArray {
                minimum,
                maximum,
                encoding,
                prefix_encodings,
            } => {
                let items = array(name, document)?;
                let length = items.len() as u64;
                if length < *minimum || length > *maximum {
                    return Err(out_of_range(
                        name,
                        format!("array of {length} items outside [{minimum}, {maximum}]"),
                    ));
                }
                let offset = length - minimum;
                if !is_byte(offset) {
                    return Err(out_of_range(name, "array size exceeds a byte"));
                }
                self.stream.put_byte(offset as u8)?;
                self.typed_items(items, encoding, prefix_encodings)
            }
            Encoding::FloorTypedArray {
                minimum,
                encoding,
                prefix_encodings,
            } => {
                let items = array(name, document)?;
                let length = items.len() as u64;
                if length < *minimum {
                    return Err(out_of_range(
                        name,
                        format!("array of {length} items below minimum {minimum}"),
                    ));
                }
                self.stream.put_varint(length - minimum)?;
                self.typed_items(items, encoding, prefix_encodings)
            }
            Encoding::RoofTypedArray {
                maximum,
                encoding,
                prefix_encodings,
            } => {
                let items = array(name, document)?;
                let length = items.len() as u64;
                if length > *maximum {
                    return Err(out_of_range(
                        name,
                        format!("array of {length} items exceeds maximum {maximum}"),
                    ));
                }
                self.stream.put_varint(maximum - length)?;
                self.typed_items(items, encoding, prefix_encodings)
            }
            Encoding::FixedTypedArbitraryObject {
                size,
                key_encoding,
                encoding,
            } => {
                let entries = object(name, document)?;
                if entries.len() as u64 != *size {
                    return Err(out_of_range(
                        name,
                        format!("object of {} entries, expected {size}", entries.len()),
                    ));
                }
                self.typed_entries(entries, key_encoding, encoding)
            }
            Encoding::VarintTypedArbitraryObject {
                key_encoding,
                encoding,
            } => {
                let entries = object(name, document)?;
                self.stream.put_varint(entries.len() as u64)?;
                self.typed_entries(entries, key_encoding, encoding)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Integers
    // -----------------------------------------------------------------------

    fn bounded_multiple_8bits_enum_fixed(
        &mut self,
        value: i64,
        minimum: i64,
        maximum: i64,
        multiplier: u64,
    ) -> Result<(), EncodeError> {
        const NAME: &str = "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED";
        if value < minimum || value > maximum {
            return Err(out_of_range(
                NAME,
                format!("{value} outside [{minimum}, {maximum}]"),
            ));
        }
        let index = i128::from(quotient(NAME, value, multiplier)?)
            - i128::from(divide_ceil(minimum, multiplier));
        let byte = u8::try_from(index)
            .map_err(|_| out_of_range(NAME, format!("enumeration index {index} exceeds a byte")))?;
        Ok(self.stream.put_byte(byte)?)
    }

    fn floor_multiple_enum_varint(
        &mut self,
        value: i64,
        minimum: i64,
        multiplier: u64,
    ) -> Result<(), EncodeError> {
        const NAME: &str = "FLOOR_MULTIPLE_ENUM_VARINT";
        if value < minimum {
            return Err(out_of_range(NAME, format!("{value} below minimum {minimum}")));
        }
        let index = i128::from(quotient(NAME, value, multiplier)?)
            - i128::from(divide_ceil(minimum, multiplier));
        // 0 <= index <= value - minimum < 2^64.
        Ok(self.stream.put_varint(index as u64)?)
    }

    fn roof_multiple_mirror_enum_varint(
        &mut self,
        value: i64,
        maximum: i64,
        multiplier: u64,
    ) -> Result<(), EncodeError> {
        const NAME: &str = "ROOF_MULTIPLE_MIRROR_ENUM_VARINT";
        if value > maximum {
            return Err(out_of_range(NAME, format!("{value} exceeds maximum {maximum}")));
        }
        let index = i128::from(divide_floor(maximum, multiplier.max(1)))
            - i128::from(quotient(NAME, value, multiplier)?);
        Ok(self.stream.put_varint(index as u64)?)
    }

    // -----------------------------------------------------------------------
    // Reals
    // -----------------------------------------------------------------------

    fn double_varint_tuple(&mut self, value: f64) -> Result<(), EncodeError> {
        let (digits, point) = real_digits(value).ok_or(EncodeError::Unrepresentable {
            encoding: "DOUBLE_VARINT_TUPLE",
            value,
        })?;
        self.stream.put_varint_zigzag(digits)?;
        Ok(self.stream.put_varint(point)?)
    }

    // -----------------------------------------------------------------------
    // Strings
    // -----------------------------------------------------------------------

    fn floor_varint_prefix_utf8_string_shared(
        &mut self,
        value: &str,
        minimum: u64,
    ) -> Result<(), EncodeError> {
        let length = value.len() as u64;
        if length < minimum {
            return Err(out_of_range(
                "FLOOR_VARINT_PREFIX_UTF8_STRING_SHARED",
                format!("string of {length} bytes below minimum {minimum}"),
            ));
        }
        self.shared_string(value, LengthPrefix::Varint(length - minimum + 1))
    }

    /// Common tail of the prefixed shared-string layouts.
    ///
    /// Cached: `0`, prefix, varint distance from after the prefix back to the
    /// cached bytes. Otherwise: prefix, raw bytes (recorded).
    fn shared_string(&mut self, value: &str, prefix: LengthPrefix) -> Result<(), EncodeError> {
        let cached = self.cache.find(value, CacheKind::Standalone);
        if cached.is_some() {
            self.stream.put_byte(0)?;
        }
        match prefix {
            LengthPrefix::Varint(prefix) => self.stream.put_varint(prefix)?,
            LengthPrefix::Byte(prefix) => self.stream.put_byte(prefix)?,
        }
        match cached {
            Some(offset) => {
                let distance = self.stream.position() - offset;
                log::trace!("shared string of {} bytes, {distance} bytes back", value.len());
                self.stream.put_varint(distance)?;
            }
            None => {
                self.cache
                    .record(value, self.stream.position(), CacheKind::Standalone);
                self.stream.put_string_utf8(value)?;
            }
        }
        Ok(())
    }

    fn prefix_varint_length_string_shared(&mut self, value: &str) -> Result<(), EncodeError> {
        let offset = self.stream.position();
        match self.cache.find(value, CacheKind::PrefixLengthVarintPlusOne) {
            Some(cached) => {
                self.stream.put_byte(0)?;
                let distance = self.stream.position() - cached;
                self.stream.put_varint(distance)?;
                // Point later references at this, closer, pointer.
                self.cache
                    .record(value, offset, CacheKind::PrefixLengthVarintPlusOne);
            }
            None => {
                self.cache
                    .record(value, offset, CacheKind::PrefixLengthVarintPlusOne);
                self.stream.put_varint(value.len() as u64 + 1)?;
                self.cache
                    .record(value, self.stream.position(), CacheKind::Standalone);
                self.stream.put_string_utf8(value)?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    /// Run `body` one nesting level down, counting levels the way the
    /// decoder does.
    fn nested(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        if self.depth >= self.max_depth {
            return Err(EncodeError::TooDeep {
                limit: self.max_depth,
                offset: self.stream.position(),
            });
        }
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    fn typed_items(
        &mut self,
        items: &[Value],
        encoding: &Encoding,
        prefix_encodings: &[Encoding],
    ) -> Result<(), EncodeError> {
        self.nested(|this| {
            for (index, item) in items.iter().enumerate() {
                let encoding = prefix_encodings.get(index).unwrap_or(encoding);
                this.encode(item, encoding)?;
            }
            Ok(())
        })
    }

    fn typed_entries(
        &mut self,
        entries: &serde_json::Map<String, Value>,
        key_encoding: &Encoding,
        encoding: &Encoding,
    ) -> Result<(), EncodeError> {
        self.nested(|this| {
            for (key, value) in entries {
                this.encode(&Value::String(key.clone()), key_encoding)?;
                this.encode(value, encoding)?;
            }
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // ANY_PACKED_TYPE_TAG_BYTE_PREFIX
    // -----------------------------------------------------------------------

    fn any(&mut self, document: &Value) -> Result<(), EncodeError> {
        match document {
            Value::Null => Ok(self.stream.put_byte(pack(tag::TYPE_OTHER, tag::SUBTYPE_NULL))?),
            Value::Bool(false) => {
                Ok(self.stream.put_byte(pack(tag::TYPE_OTHER, tag::SUBTYPE_FALSE))?)
            }
            Value::Bool(true) => Ok(self.stream.put_byte(pack(tag::TYPE_OTHER, tag::SUBTYPE_TRUE))?),
            Value::Number(number) => {
                if number.is_f64() {
                    self.any_real(real("ANY_PACKED_TYPE_TAG_BYTE_PREFIX", document)?)
                } else {
                    self.any_integer(integer("ANY_PACKED_TYPE_TAG_BYTE_PREFIX", document)?)
                }
            }
            Value::String(value) => self.any_string(value),
            Value::Array(items) => self.nested(|this| {
                this.any_size(tag::TYPE_ARRAY, items.len() as u64)?;
                items.iter().try_for_each(|item| this.any(item))
            }),
            Value::Object(entries) => self.nested(|this| {
                this.any_size(tag::TYPE_OBJECT, entries.len() as u64)?;
                for (key, value) in entries {
                    this.prefix_varint_length_string_shared(key)?;
                    this.any(value)?;
                }
                Ok(())
            }),
        }
    }

    fn any_size(&mut self, kind: u8, size: u64) -> Result<(), EncodeError> {
        if size >= tag::INLINE_LIMIT {
            self.stream.put_byte(pack(kind, 0))?;
            self.stream.put_varint(size - tag::INLINE_LIMIT)?;
        } else {
            self.stream.put_byte(pack(kind, size as u8 + 1))?;
        }
        Ok(())
    }

    fn any_integer(&mut self, value: i64) -> Result<(), EncodeError> {
        let (kind, absolute) = if value >= 0 {
            (tag::TYPE_POSITIVE_INTEGER_BYTE, value as u64)
        } else {
            // -1 maps to 0, so a negative byte covers -1..=-256.
            (tag::TYPE_NEGATIVE_INTEGER_BYTE, (-(value + 1)) as u64)
        };

        if is_byte(absolute) {
            if absolute < tag::INLINE_LIMIT {
                self.stream.put_byte(pack(kind, absolute as u8 + 1))?;
            } else {
                self.stream.put_byte(pack(kind, 0))?;
                self.stream.put_byte(absolute as u8)?;
            }
        } else {
            let subtype = if value >= 0 {
                tag::SUBTYPE_POSITIVE_INTEGER
            } else {
                tag::SUBTYPE_NEGATIVE_INTEGER
            };
            self.stream.put_byte(pack(tag::TYPE_OTHER, subtype))?;
            self.stream.put_varint(absolute)?;
        }
        Ok(())
    }

    fn any_real(&mut self, value: f64) -> Result<(), EncodeError> {
        // -0.0 passes this test and comes back as 0.0.
        if value.fract() == 0.0 && (0.0..=255.0).contains(&value) {
            self.stream
                .put_byte(pack(tag::TYPE_OTHER, tag::SUBTYPE_POSITIVE_REAL_INTEGER_BYTE))?;
            return Ok(self.stream.put_byte(value as u8)?);
        }
        self.stream
            .put_byte(pack(tag::TYPE_OTHER, tag::SUBTYPE_NUMBER))?;
        self.double_varint_tuple(value)
    }

    fn any_string(&mut self, value: &str) -> Result<(), EncodeError> {
        let size = value.len() as u64;
        let cached = self.cache.find(value, CacheKind::Standalone);

        if size < tag::INLINE_LIMIT {
            match cached {
                Some(offset) => {
                    self.stream
                        .put_byte(pack(tag::TYPE_SHARED_STRING, size as u8 + 1))?;
                    let distance = self.stream.position() - offset;
                    self.stream.put_varint(distance)?;
                }
                None => {
                    self.stream.put_byte(pack(tag::TYPE_STRING, size as u8 + 1))?;
                    self.cache
                        .record(value, self.stream.position(), CacheKind::Standalone);
                    self.stream.put_string_utf8(value)?;
                }
            }
        } else if size < tag::STRING_FLOOR_MINIMUM {
            self.stream
                .put_byte(pack(tag::TYPE_LONG_STRING, (size - tag::INLINE_LIMIT) as u8))?;
            self.stream.put_string_utf8(value)?;
        } else if size >= tag::LONG_STRING_BUCKET_MINIMUM && cached.is_none() {
            let exponent = closest_smallest_exponent(
                size,
                2,
                tag::SUBTYPE_LONG_STRING_BASE_EXPONENT_7,
                tag::SUBTYPE_LONG_STRING_BASE_EXPONENT_10,
            );
            self.stream.put_byte(pack(tag::TYPE_OTHER, exponent))?;
            self.stream.put_varint(size - (1u64 << exponent))?;
            self.stream.put_string_utf8(value)?;
        } else {
            // A cached string starts with the 0 sentinel, which doubles as
            // the TYPE_SHARED_STRING tag.
            if cached.is_none() {
                self.stream.put_byte(pack(tag::TYPE_STRING, 0))?;
            }
            self.floor_varint_prefix_utf8_string_shared(value, tag::STRING_FLOOR_MINIMUM)?;
        }
        Ok(())
    }
}

fn choice_index(
    encoding: &'static str,
    choices: &[Value],
    document: &Value,
) -> Result<usize, EncodeError> {
    choices
        .iter()
        .position(|choice| choice == document)
        .ok_or(EncodeError::NotAChoice {
            encoding,
            count: choices.len(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
