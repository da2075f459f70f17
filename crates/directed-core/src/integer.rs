//! Arbitrary-precision integer support.
//!
//! Every accumulator, literal, and node-type parameter is an unbounded
//! signed integer backed by [`num_bigint::BigInt`]. Division and remainder
//! truncate toward zero, so the sign of a remainder matches its dividend --
//! `BigInt` implements exactly these semantics. Division by zero is never
//! applied; operator dispatch checks the divisor first (see
//! [`FoldOp::apply`](crate::ops::FoldOp::apply)).

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

/// The integer type carried along every edge of a program graph.
pub type Int = BigInt;

/// Parses a decimal literal (optionally signed) into an [`Int`].
pub fn parse_decimal(text: &str) -> Option<Int> {
    text.parse().ok()
}

/// Builds an [`Int`] from a single byte, as character literals produce.
pub fn from_byte(byte: u8) -> Int {
    Int::from(byte)
}

/// Narrows a value to a selector index.
///
/// Returns `None` for negative values and for values that do not fit in
/// `usize`.
pub fn to_index(value: &Int) -> Option<usize> {
    if value.is_negative() {
        return None;
    }
    value.to_usize()
}

/// Reduces a value to the byte an output node emits.
///
/// This is the mathematical residue modulo 256, so negative accumulators
/// wrap around: `-1` becomes `0xff`.
pub fn low_byte(value: &Int) -> u8 {
    let mut residue: Int = value % 256;
    if residue.is_negative() {
        residue += 256;
    }
    residue.to_u8().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal_accepts_signed_literals() {
        assert_eq!(parse_decimal("42"), Some(Int::from(42)));
        assert_eq!(parse_decimal("-17"), Some(Int::from(-17)));
        assert_eq!(parse_decimal("nope"), None);
    }

    #[test]
    fn parse_decimal_handles_values_beyond_machine_width() {
        let big = parse_decimal("123456789012345678901234567890").unwrap();
        assert_eq!(big.to_string(), "123456789012345678901234567890");
    }

    #[test]
    fn from_byte_is_unsigned() {
        assert_eq!(from_byte(0xff), Int::from(255));
    }

    #[test]
    fn to_index_rejects_negative_values() {
        assert_eq!(to_index(&Int::from(3)), Some(3));
        assert_eq!(to_index(&Int::from(-1)), None);
    }

    #[test]
    fn low_byte_wraps_negative_accumulators() {
        assert_eq!(low_byte(&Int::from(65)), 0x41);
        assert_eq!(low_byte(&Int::from(256 + 10)), 10);
        assert_eq!(low_byte(&Int::from(-1)), 0xff);
        assert_eq!(low_byte(&Int::from(-256)), 0);
    }
}
