// Tag byte layout of the schema-less ANY_PACKED_TYPE_TAG_BYTE_PREFIX encoding.
//
// The low 3 bits carry the type, the high 5 bits a type-specific subtype.
// `TYPE_SHARED_STRING` must stay 0: a floor-prefixed shared string starts
// with a 0 byte, which then doubles as its tag.

pub const TYPE_SIZE: u32 = 3;
pub const SUBTYPE_SIZE: u32 = 8 - TYPE_SIZE;

pub const TYPE_SHARED_STRING: u8 = 0b000;
pub const TYPE_POSITIVE_INTEGER_BYTE: u8 = 0b001;
pub const TYPE_LONG_STRING: u8 = 0b010;
pub const TYPE_OBJECT: u8 = 0b011;
pub const TYPE_ARRAY: u8 = 0b100;
pub const TYPE_STRING: u8 = 0b101;
pub const TYPE_NEGATIVE_INTEGER_BYTE: u8 = 0b110;
pub const TYPE_OTHER: u8 = 0b111;

// Subtypes of TYPE_OTHER.
pub const SUBTYPE_FALSE: u8 = 0;
pub const SUBTYPE_TRUE: u8 = 1;
pub const SUBTYPE_NULL: u8 = 2;
pub const SUBTYPE_POSITIVE_INTEGER: u8 = 3;
pub const SUBTYPE_NEGATIVE_INTEGER: u8 = 4;
pub const SUBTYPE_NUMBER: u8 = 5;
pub const SUBTYPE_POSITIVE_REAL_INTEGER_BYTE: u8 = 6;
pub const SUBTYPE_LONG_STRING_BASE_EXPONENT_7: u8 = 7;
pub const SUBTYPE_LONG_STRING_BASE_EXPONENT_8: u8 = 8;
pub const SUBTYPE_LONG_STRING_BASE_EXPONENT_9: u8 = 9;
pub const SUBTYPE_LONG_STRING_BASE_EXPONENT_10: u8 = 10;

/// Values below this fit in the subtype bits once shifted by one (0 is
/// reserved for "size follows").
pub const INLINE_LIMIT: u64 = crate::numeric::uint_max(SUBTYPE_SIZE);

/// Strings at least this long and not cached use the exponent buckets.
pub const LONG_STRING_BUCKET_MINIMUM: u64 = 1 << SUBTYPE_LONG_STRING_BASE_EXPONENT_7;

/// Strings shorter than this use the inline or `TYPE_LONG_STRING` forms.
pub const STRING_FLOOR_MINIMUM: u64 = INLINE_LIMIT * 2;

#[inline]
pub const fn pack(kind: u8, subtype: u8) -> u8 {
    kind | (subtype << TYPE_SIZE)
}

#[inline]
pub const fn kind(tag: u8) -> u8 {
    tag & 0b111
}

#[inline]
pub const fn subtype(tag: u8) -> u8 {
    tag >> TYPE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_split() {
        assert_eq!(pack(TYPE_POSITIVE_INTEGER_BYTE, 6), 0b0011_0001);
        assert_eq!(kind(0b0011_0001), TYPE_POSITIVE_INTEGER_BYTE);
        assert_eq!(subtype(0b0011_0001), 6);
        assert_eq!(pack(TYPE_OTHER, SUBTYPE_NULL), 0x17);
        assert_eq!(INLINE_LIMIT, 31);
        assert_eq!(STRING_FLOOR_MINIMUM, 62);
        assert_eq!(LONG_STRING_BUCKET_MINIMUM, 128);
    }
}
