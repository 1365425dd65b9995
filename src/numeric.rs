// Integer and real-number helpers shared by the encoder and decoder.
//
// Division here is exact mathematical ceiling/floor, never truncation toward
// zero: bounded integer encodings rely on `divide_ceil(-7, 5) == -1` and
// `divide_floor(-7, 5) == -2`.

/// Ceiling of `dividend / divisor`. `divisor` must be non-zero.
#[inline]
pub fn divide_ceil(dividend: i64, divisor: u64) -> i64 {
    debug_assert!(divisor > 0);
    let quotient = -(-i128::from(dividend)).div_euclid(i128::from(divisor));
    // |quotient| <= |dividend| for any divisor >= 1.
    quotient as i64
}

/// Floor of `dividend / divisor`. `divisor` must be non-zero.
#[inline]
pub fn divide_floor(dividend: i64, divisor: u64) -> i64 {
    debug_assert!(divisor > 0);
    i128::from(dividend).div_euclid(i128::from(divisor)) as i64
}

/// True when `value` fits in a single unsigned byte.
#[inline]
pub const fn is_byte(value: u64) -> bool {
    value <= u8::MAX as u64
}

/// True when `lower <= value <= upper`.
#[inline]
pub fn is_within<T: PartialOrd>(value: T, lower: T, upper: T) -> bool {
    value >= lower && value <= upper
}

/// Largest unsigned integer representable in `bits` bits (`uint_max(5) == 31`).
#[inline]
pub const fn uint_max(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Largest exponent `e` in `[lower, upper]` with `base^e <= value`.
///
/// Values smaller than `base^lower` clamp to `lower`; values at or above
/// `base^(upper + 1)` clamp to `upper`.
pub fn closest_smallest_exponent(value: u64, base: u64, lower: u8, upper: u8) -> u8 {
    debug_assert!(base > 1 && lower <= upper);
    let mut power = base;
    for exponent in 1..upper {
        let next = power.saturating_mul(base);
        if next > value && exponent >= lower {
            return exponent;
        }
        power = next;
    }
    upper
}

/// Number of multiples of `multiplier` in `[minimum, maximum]`.
pub fn count_multiples(minimum: i64, maximum: i64, multiplier: u64) -> u64 {
    debug_assert!(multiplier > 0);
    if minimum > maximum {
        return 0;
    }
    let first = divide_ceil(minimum, multiplier);
    let last = divide_floor(maximum, multiplier);
    if last < first {
        0
    } else {
        (i128::from(last) - i128::from(first) + 1) as u64
    }
}

/// Split a finite real into its decimal digits and the position of the
/// decimal point counted from the right: `3.14 -> (314, 2)`,
/// `-0.000123 -> (-123, 6)`, `5.0 -> (5, 0)`.
///
/// Uses the shortest decimal representation that round-trips. Returns `None`
/// for non-finite values or when the digits do not fit an `i64`.
pub fn real_digits(value: f64) -> Option<(i64, u64)> {
    if !value.is_finite() {
        return None;
    }

    let text = value.abs().to_string();
    let (integral, fractional) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let point = fractional.len() as u64;

    let mut digits: i64 = 0;
    for byte in integral.bytes().chain(fractional.bytes()) {
        debug_assert!(byte.is_ascii_digit());
        digits = digits
            .checked_mul(10)?
            .checked_add(i64::from(byte - b'0'))?;
    }

    if value.is_sign_negative() {
        digits = -digits;
    }
    Some((digits, point))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_and_floor_are_exact() {
        let cases: &[(i64, u64, i64, i64)] = &[
            (10, 5, 2, 2),
            (11, 5, 3, 2),
            (-7, 5, -1, -2),
            (-10, 5, -2, -2),
            (0, 3, 0, 0),
            (-100, 5, -20, -20),
            (i64::MIN, 1, i64::MIN, i64::MIN),
            (i64::MAX, 2, i64::MAX / 2 + 1, i64::MAX / 2),
            (-1, u64::MAX, 0, -1),
        ];
        for &(dividend, divisor, ceil, floor) in cases {
            assert_eq!(divide_ceil(dividend, divisor), ceil, "ceil {dividend}/{divisor}");
            assert_eq!(divide_floor(dividend, divisor), floor, "floor {dividend}/{divisor}");
        }
    }

    #[test]
    fn byte_and_range_checks() {
        assert!(is_byte(0));
        assert!(is_byte(255));
        assert!(!is_byte(256));
        assert!(is_within(5, 1, 5));
        assert!(!is_within(6, 1, 5));
        assert!(is_within(-3i64, -3, 0));
    }

    #[test]
    fn uint_max_values() {
        assert_eq!(uint_max(0), 0);
        assert_eq!(uint_max(5), 31);
        assert_eq!(uint_max(8), 255);
        assert_eq!(uint_max(64), u64::MAX);
    }

    #[test]
    fn exponent_buckets() {
        assert_eq!(closest_smallest_exponent(128, 2, 7, 10), 7);
        assert_eq!(closest_smallest_exponent(255, 2, 7, 10), 7);
        assert_eq!(closest_smallest_exponent(256, 2, 7, 10), 8);
        assert_eq!(closest_smallest_exponent(1000, 2, 7, 10), 9);
        assert_eq!(closest_smallest_exponent(1024, 2, 7, 10), 10);
        assert_eq!(closest_smallest_exponent(1 << 20, 2, 7, 10), 10);
        // Below the lower bound clamps.
        assert_eq!(closest_smallest_exponent(5, 2, 7, 10), 7);
    }

    #[test]
    fn multiples_in_range() {
        assert_eq!(count_multiples(-100, 100, 5), 41);
        assert_eq!(count_multiples(1, 4, 5), 0);
        assert_eq!(count_multiples(0, 0, 7), 1);
        assert_eq!(count_multiples(5, 1, 1), 0);
    }

    #[test]
    fn real_digit_split() {
        assert_eq!(real_digits(3.14), Some((314, 2)));
        assert_eq!(real_digits(123.456), Some((123456, 3)));
        assert_eq!(real_digits(-0.000123), Some((-123, 6)));
        assert_eq!(real_digits(5.0), Some((5, 0)));
        assert_eq!(real_digits(0.0), Some((0, 0)));
        assert_eq!(real_digits(0.1235), Some((1235, 4)));
        assert_eq!(real_digits(1e300), None);
        assert_eq!(real_digits(f64::NAN), None);
    }
}
