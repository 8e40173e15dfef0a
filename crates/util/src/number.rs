//! Number helpers: value comparison across integer/float representations
//! and decimal-exact divisibility.

use std::cmp::Ordering;

use serde_json::Number;

/// Relative tolerance used by [`is_multiple_of`] when a number has no exact
/// decimal expansion that fits in an `i128`.
const FLOAT_TOLERANCE: f64 = 1e-9;

/// A finite decimal: `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    pub mantissa: i128,
    pub scale: u32,
}

impl Decimal {
    /// Decimal expansion of a JSON number.
    ///
    /// Floats use their shortest round-trip representation, so `2.5` is
    /// exactly `25 * 10^-1` rather than the binary approximation. Returns
    /// `None` when the expansion does not fit.
    pub fn from_number(n: &Number) -> Option<Self> {
        if let Some(i) = n.as_i64() {
            return Some(Self {
                mantissa: i as i128,
                scale: 0,
            });
        }
        if let Some(u) = n.as_u64() {
            return Some(Self {
                mantissa: u as i128,
                scale: 0,
            });
        }
        Self::from_f64(n.as_f64()?)
    }

    pub fn from_f64(f: f64) -> Option<Self> {
        if !f.is_finite() {
            return None;
        }
        // `Display` for f64 never uses exponent notation.
        let text = f.to_string();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.as_str()),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        let frac_part = frac_part.trim_end_matches('0');
        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa.checked_mul(10)?.checked_add((b - b'0') as i128)?;
        }
        Some(Self {
            mantissa: if negative { -mantissa } else { mantissa },
            scale: frac_part.len() as u32,
        })
    }

    fn rescale(self, scale: u32) -> Option<i128> {
        let factor = 10i128.checked_pow(scale - self.scale)?;
        self.mantissa.checked_mul(factor)
    }
}

/// Returns true when `value` is an integer multiple of `divisor`.
///
/// Both numbers are first expanded to exact decimals; if either expansion
/// overflows, the quotient is checked against the nearest integer with a
/// relative tolerance of `1e-9`.
///
/// ```
/// use jsv_util::is_multiple_of;
/// use serde_json::Number;
///
/// let n = |f: f64| Number::from_f64(f).unwrap();
/// assert!(is_multiple_of(&n(7.5), &n(2.5)));
/// assert!(is_multiple_of(&n(0.3), &n(0.1)));
/// assert!(!is_multiple_of(&Number::from(16), &n(2.5)));
/// ```
pub fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (Decimal::from_number(value), Decimal::from_number(divisor)) {
        if d.mantissa == 0 {
            return false;
        }
        let scale = v.scale.max(d.scale);
        if let (Some(vm), Some(dm)) = (v.rescale(scale), d.rescale(scale)) {
            return vm % dm == 0;
        }
    }
    let (Some(v), Some(d)) = (value.as_f64(), divisor.as_f64()) else {
        return false;
    };
    if d == 0.0 {
        return false;
    }
    let quotient = v / d;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= FLOAT_TOLERANCE * quotient.abs().max(1.0)
}

/// Compares two numbers by value.
pub fn number_cmp(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Numeric equality: `1` equals `1.0`.
pub fn number_equal(a: &Number, b: &Number) -> bool {
    number_cmp(a, b) == Some(Ordering::Equal)
}

/// True for integers and for floats with no fractional part (`1.0`).
pub fn is_integer(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn n(f: f64) -> Number {
        Number::from_f64(f).unwrap()
    }

    #[test]
    fn test_decimal_expansion() {
        assert_eq!(Decimal::from_f64(2.5), Some(Decimal { mantissa: 25, scale: 1 }));
        assert_eq!(Decimal::from_f64(-0.0001), Some(Decimal { mantissa: -1, scale: 4 }));
        assert_eq!(Decimal::from_f64(100.0), Some(Decimal { mantissa: 100, scale: 0 }));
        assert_eq!(Decimal::from_f64(1e300), None);
    }

    #[test]
    fn test_multiple_of_fractional_divisor() {
        assert!(is_multiple_of(&n(7.5), &n(2.5)));
        assert!(is_multiple_of(&n(-7.5), &n(2.5)));
        assert!(is_multiple_of(&Number::from(0), &n(2.5)));
        assert!(!is_multiple_of(&Number::from(16), &n(2.5)));
        assert!(is_multiple_of(&n(0.0075), &n(0.0001)));
        assert!(!is_multiple_of(&n(0.00751), &n(0.0001)));
    }

    #[test]
    fn test_multiple_of_overflow_falls_back() {
        // 1e308 / 0.123456789 is infinite
        assert!(!is_multiple_of(&n(1e308), &n(0.123456789)));
        assert!(is_multiple_of(&n(1e300), &n(1e299)));
    }

    #[test]
    fn test_number_equal() {
        assert!(number_equal(&Number::from(1), &n(1.0)));
        assert!(!number_equal(&Number::from(1), &n(1.5)));
        assert!(number_equal(&Number::from(u64::MAX), &Number::from(u64::MAX)));
        assert_eq!(
            number_cmp(&Number::from(-1), &Number::from(u64::MAX)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_is_integer() {
        assert!(is_integer(&Number::from(3)));
        assert!(is_integer(&n(3.0)));
        assert!(!is_integer(&n(3.5)));
    }

    proptest! {
        #[test]
        fn prop_scaled_integers_are_multiples(k in -100_000i64..100_000) {
            let value = n(k as f64 * 2.5);
            prop_assert!(is_multiple_of(&value, &n(2.5)));
        }

        #[test]
        fn prop_offset_values_are_not_multiples(k in -100_000i64..100_000) {
            let value = n(k as f64 * 2.5 + 1.0);
            prop_assert!(!is_multiple_of(&value, &n(2.5)));
        }
    }
}
