//! # Exact Decimals
//!
//! `Dec` is the monetary type of the workspace. It wraps a big rational so
//! that every add, subtract, multiply and divide is exact; rounding happens
//! only when a value is rendered or explicitly truncated to an integer.
//!
//! | Operation            | Behaviour                                   |
//! |----------------------|---------------------------------------------|
//! | `+ - *`              | exact                                       |
//! | `checked_div`        | exact, `None` on a zero divisor             |
//! | `round`/`truncate`   | to `BigInt`, half away from zero / toward 0 |
//! | `quantize`           | nearest multiple of `10^-N`                 |
//! | `Display`            | 18 places (or `{:.N}`), trailing zeros cut  |
//! | serde                | lossless string; numbers accepted on input  |
//!
//! The serialized form is the decimal rendering when the value has at most
//! 18 fractional digits and `numer/denom` otherwise, so a value written to
//! disk reads back identical. `FromStr` accepts both forms.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

/// Fractional places rendered when no precision is requested
pub const DISPLAY_PRECISION: usize = 18;

/// Malformed decimal literal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid decimal literal: {0:?}")]
pub struct ParseDecError(pub String);

/// Arbitrary-precision signed decimal with exact arithmetic
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(BigRational);

impl Dec {
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    pub fn from_int(value: i64) -> Self {
        Self(BigRational::from_integer(BigInt::from(value)))
    }

    /// `value × 10^-precision`, so `new_with_prec(97, 2)` is 0.97
    pub fn new_with_prec(value: i64, precision: u32) -> Self {
        let denom = num_traits::pow(BigInt::from(10u32), precision as usize);
        Self(BigRational::new(BigInt::from(value), denom))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Exact quotient, `None` when `rhs` is zero
    pub fn checked_div(&self, rhs: &Dec) -> Option<Dec> {
        if rhs.is_zero() {
            None
        } else {
            Some(Self(&self.0 / &rhs.0))
        }
    }

    /// Nearest integer, half-way cases away from zero
    pub fn round(&self) -> BigInt {
        self.0.round().to_integer()
    }

    /// Integer part, rounding toward zero
    pub fn truncate(&self) -> BigInt {
        self.0.trunc().to_integer()
    }

    pub fn round_i64(&self) -> Option<i64> {
        self.round().to_i64()
    }

    pub fn truncate_i64(&self) -> Option<i64> {
        self.truncate().to_i64()
    }

    /// Lossy view for charts and percentages; never feed it back into math
    pub fn to_f64(&self) -> Option<f64> {
        self.0.to_f64()
    }

    /// Render with exactly `places` fractional digits, rounding half away
    /// from zero
    pub fn to_fixed(&self, places: usize) -> String {
        let scale = num_traits::pow(BigInt::from(10u32), places);
        let scaled = (&self.0 * BigRational::from_integer(scale)).round().to_integer();
        let negative = scaled.is_negative();
        let digits = scaled.abs().to_string();

        let mut out = String::with_capacity(digits.len() + places + 2);
        if negative {
            out.push('-');
        }
        if places == 0 {
            out.push_str(&digits);
            return out;
        }

        let padded = format!("{:0>width$}", digits, width = places + 1);
        let split = padded.len() - places;
        out.push_str(&padded[..split]);
        out.push('.');
        out.push_str(&padded[split..]);
        out
    }

    /// Nearest multiple of `10^-places`, half-way cases away from zero
    pub fn quantize(&self, places: usize) -> Dec {
        let scale = BigRational::from_integer(num_traits::pow(BigInt::from(10u32), places));
        Self((&self.0 * &scale).round() / scale)
    }

    /// True when the value has at most `places` fractional digits
    pub fn fits_places(&self, places: usize) -> bool {
        self.quantize(places) == *self
    }

    /// Underlying rational
    pub fn as_rational(&self) -> &BigRational {
        &self.0
    }
}

impl Default for Dec {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<BigRational> for Dec {
    fn from(value: BigRational) -> Self {
        Self(value)
    }
}

impl From<BigInt> for Dec {
    fn from(value: BigInt) -> Self {
        Self(BigRational::from_integer(value))
    }
}

impl From<i64> for Dec {
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

impl From<u64> for Dec {
    fn from(value: u64) -> Self {
        Self::from(BigInt::from(value))
    }
}

impl From<u128> for Dec {
    fn from(value: u128) -> Self {
        Self::from(BigInt::from(value))
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(places) = f.precision() {
            return f.write_str(&self.to_fixed(places));
        }

        let fixed = self.to_fixed(DISPLAY_PRECISION);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        if trimmed == "-0" {
            f.write_str("0")
        } else {
            f.write_str(trimmed)
        }
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({})", self)
    }
}

impl FromStr for Dec {
    type Err = ParseDecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDecError(s.to_string());
        let trimmed = s.trim();

        if let Some((numer, denom)) = trimmed.split_once('/') {
            let numer = BigInt::from_str(numer.trim()).map_err(|_| invalid())?;
            let denom = BigInt::from_str(denom.trim()).map_err(|_| invalid())?;
            if !denom.is_positive() {
                return Err(invalid());
            }
            return Ok(Self(BigRational::new(numer, denom)));
        }

        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        let digits = format!("{}{}", int_part, frac_part);
        let numer = BigInt::from_str(&digits).map_err(|_| invalid())?;
        let denom = num_traits::pow(BigInt::from(10u32), frac_part.len());
        let value = BigRational::new(numer, denom);

        Ok(Self(if negative { -value } else { value }))
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.fits_places(DISPLAY_PRECISION) {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_str(&format!("{}/{}", self.0.numer(), self.0.denom()))
        }
    }
}

struct DecVisitor;

impl<'de> Visitor<'de> for DecVisitor {
    type Value = Dec;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Dec, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Dec, E> {
        Ok(Dec::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Dec, E> {
        Ok(Dec::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Dec, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("non-finite decimal {}", v)));
        }
        // f64 Display never uses exponent notation
        v.to_string().parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecVisitor)
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Dec> for Dec {
            type Output = Dec;
            fn $method(self, rhs: Dec) -> Dec {
                Dec($imp::$method(self.0, rhs.0))
            }
        }

        impl<'a> $imp<&'a Dec> for Dec {
            type Output = Dec;
            fn $method(self, rhs: &'a Dec) -> Dec {
                Dec($imp::$method(self.0, &rhs.0))
            }
        }

        impl<'a> $imp<Dec> for &'a Dec {
            type Output = Dec;
            fn $method(self, rhs: Dec) -> Dec {
                Dec($imp::$method(&self.0, rhs.0))
            }
        }

        impl<'a, 'b> $imp<&'b Dec> for &'a Dec {
            type Output = Dec;
            fn $method(self, rhs: &'b Dec) -> Dec {
                Dec($imp::$method(&self.0, &rhs.0))
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);

impl AddAssign<&Dec> for Dec {
    fn add_assign(&mut self, rhs: &Dec) {
        self.0 = &self.0 + &rhs.0;
    }
}

impl AddAssign<Dec> for Dec {
    fn add_assign(&mut self, rhs: Dec) {
        self.0 = &self.0 + rhs.0;
    }
}

impl SubAssign<&Dec> for Dec {
    fn sub_assign(&mut self, rhs: &Dec) {
        self.0 = &self.0 - &rhs.0;
    }
}

impl Neg for Dec {
    type Output = Dec;
    fn neg(self) -> Dec {
        Dec(-self.0)
    }
}

impl<'a> Neg for &'a Dec {
    type Output = Dec;
    fn neg(self) -> Dec {
        Dec(-&self.0)
    }
}

impl Sum for Dec {
    fn sum<I: Iterator<Item = Dec>>(iter: I) -> Dec {
        iter.fold(Dec::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Dec> for Dec {
    fn sum<I: Iterator<Item = &'a Dec>>(iter: I) -> Dec {
        iter.fold(Dec::zero(), |acc, x| acc + x)
    }
}
