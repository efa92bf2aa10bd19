//! Arbitrary precision numbers using dashu
//!
//! Uses dashu-float (DBig) for decimal arithmetic so that values such as
//! `12 / 5` stay exactly `2.4` and render back to the same literal when a
//! resolved formula is spliced into another one.

use dashu_float::DBig;
use dashu_float::ops::{Abs, SquareRoot};
use dashu_int::IBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for number operations
#[derive(Debug, Clone, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Overflow: result too large")]
    Overflow,
}

/// Working precision for calculations (decimal digits)
pub const DEFAULT_PRECISION: usize = 50;

/// Longest number literal accepted by `from_str`
const MAX_LITERAL_LEN: usize = 4096;

/// Largest exponent accepted by `pow` before it is reported as overflow
const MAX_INTEGER_EXPONENT: i64 = 10_000;

/// Arbitrary precision decimal number
///
/// All operations return Results or new Numbers - never panic.
#[derive(Debug, Clone)]
pub struct Number {
    inner: DBig,
}

impl Number {
    // ========== Construction ==========

    fn with_work_precision(val: DBig) -> DBig {
        val.with_precision(DEFAULT_PRECISION).value()
    }

    fn wrap(inner: DBig) -> Self {
        Self { inner }
    }

    /// Create from string representation
    /// Supports: "123", "3.14", "-42", "1.5e10", "602214076e15"
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NumberError::ParseError(s.to_string()));
        }
        if s.len() > MAX_LITERAL_LEN {
            return Err(NumberError::ParseError(format!("{}... ({} characters)", s.chars().take(16).collect::<String>(), s.len())));
        }

        // Integer mantissa with exponent: keep it exact instead of going
        // through the decimal parser
        if (s.contains('e') || s.contains('E')) && !s.contains('.') {
            let s_lower = s.to_lowercase();
            if let Some((mantissa, exp)) = s_lower.split_once('e') {
                let mantissa: IBig = mantissa
                    .parse()
                    .map_err(|_| NumberError::ParseError(s.to_string()))?;
                let exp: i32 = exp
                    .trim_start_matches('+')
                    .parse()
                    .map_err(|_| NumberError::ParseError(s.to_string()))?;
                let result = DBig::from_parts(mantissa, exp as isize);
                return Ok(Self::wrap(Self::with_work_precision(result)));
            }
        }

        let inner: DBig = s
            .parse()
            .map_err(|_| NumberError::ParseError(s.to_string()))?;
        Ok(Self::wrap(Self::with_work_precision(inner)))
    }

    /// Create from i64 with working precision
    pub fn from_i64(n: i64) -> Self {
        Self::wrap(Self::with_work_precision(DBig::from(n)))
    }

    /// Create from f64 using its shortest round-trip representation.
    /// NaN and infinities have no decimal form and are rejected.
    pub fn from_f64(f: f64) -> Result<Self, NumberError> {
        if !f.is_finite() {
            return Err(NumberError::DomainError(format!("{} is not a finite number", f)));
        }
        Self::from_str(&format!("{}", f))
    }

    // ========== Predicates ==========

    pub fn is_zero(&self) -> bool {
        self.inner == DBig::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.inner < DBig::ZERO
    }

    pub fn is_integer(&self) -> bool {
        self.inner == self.inner.clone().floor()
    }

    // ========== Basic Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        Self::wrap(&self.inner + &other.inner)
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::wrap(&self.inner - &other.inner)
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self::wrap(&self.inner * &other.inner)
    }

    pub fn neg(&self) -> Self {
        Self::wrap(-self.inner.clone())
    }

    /// Safe division (returns Result, never panics)
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            Err(NumberError::DivisionByZero)
        } else {
            Ok(Self::wrap(&self.inner / &other.inner))
        }
    }

    /// Remainder with the sign of the dividend (truncated division)
    pub fn checked_rem(&self, other: &Self) -> Result<Self, NumberError> {
        let quotient = self.checked_div(other)?.trunc();
        Ok(self.sub(&other.mul(&quotient)))
    }

    /// Integer power (exact)
    pub fn pow(&self, exp: i64) -> Result<Self, NumberError> {
        if exp.abs() > MAX_INTEGER_EXPONENT {
            return Err(NumberError::Overflow);
        }
        let mut result = Self::from_i64(1);
        for _ in 0..exp.unsigned_abs() {
            result = result.mul(self);
        }
        if exp < 0 {
            Self::from_i64(1).checked_div(&result)
        } else {
            Ok(result)
        }
    }

    /// Real-valued power: x^y = exp(y * ln(x))
    pub fn pow_real(&self, exp: &Self) -> Result<Self, NumberError> {
        if exp.is_integer() {
            if let Some(e) = exp.to_i64() {
                return self.pow(e);
            }
        }
        if self.is_zero() {
            return if exp.is_negative() {
                Err(NumberError::DivisionByZero)
            } else {
                Ok(Self::from_i64(0))
            };
        }
        if self.is_negative() {
            return Err(NumberError::DomainError(
                "negative base with non-integer exponent".to_string(),
            ));
        }

        let ln_x = self.inner.clone().with_precision(DEFAULT_PRECISION).value().ln();
        let product = &ln_x * &exp.inner;
        Ok(Self::wrap(product.exp()))
    }

    /// Square root
    pub fn sqrt(&self) -> Result<Self, NumberError> {
        if self.is_negative() {
            return Err(NumberError::DomainError(
                "square root of negative number".to_string(),
            ));
        }
        if self.is_zero() {
            return Ok(Self::from_i64(0));
        }
        let val = self.inner.clone().with_precision(DEFAULT_PRECISION).value();
        Ok(Self::wrap(val.sqrt()))
    }

    // ========== Rounding ==========

    pub fn abs(&self) -> Self {
        Self::wrap(Abs::abs(self.inner.clone()))
    }

    /// Largest integer <= x
    pub fn floor(&self) -> Self {
        Self::wrap(self.inner.clone().floor())
    }

    /// Smallest integer >= x
    pub fn ceil(&self) -> Self {
        Self::wrap(self.inner.clone().ceil())
    }

    /// Integer part, rounding toward zero
    pub fn trunc(&self) -> Self {
        if self.is_negative() { self.ceil() } else { self.floor() }
    }

    /// Round half away from zero to `places` decimal places
    pub fn round_to(&self, places: u32) -> Self {
        let scale = Self::from_i64(10).pow(places as i64).unwrap_or_else(|_| Self::from_i64(1));
        let half = Self::wrap(Self::with_work_precision(DBig::from_parts(IBig::from(5), -1)));
        let scaled = self.mul(&scale);
        let rounded = if scaled.is_negative() {
            scaled.sub(&half).ceil()
        } else {
            scaled.add(&half).floor()
        };
        rounded.checked_div(&scale).unwrap_or(rounded)
    }

    // ========== Conversion ==========

    /// Try to convert to i64
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        self.to_string().parse().ok()
    }

    /// Convert to f64 (may lose precision)
    pub fn to_f64(&self) -> Option<f64> {
        self.to_string().parse::<f64>().ok().filter(|f| f.is_finite())
    }
}

/// Runs of zeros longer than this switch the rendering to `<digits>e<exp>`
const MAX_PLAIN_ZEROS: usize = 64;

/// Decimal rendering of `significand * 10^exponent` with no trailing
/// fractional zeros and no decimal point for integers. Ordinary magnitudes
/// are written out in full (`2.4`, `1500`, `0.005`); values that would need
/// more than `MAX_PLAIN_ZEROS` padding zeros use an integer mantissa and an
/// exponent (`1e1000000`), which `Number::from_str` reads back exactly.
fn render_decimal(significand: &IBig, exponent: isize) -> String {
    let raw = significand.to_string();
    let negative = raw.starts_with('-');
    let mut digits = raw.trim_start_matches('-').to_string();
    if digits.chars().all(|c| c == '0') {
        return "0".to_string();
    }

    let mut exponent = exponent;
    while digits.ends_with('0') {
        digits.pop();
        exponent += 1;
    }

    let body = if exponent >= 0 {
        if exponent.unsigned_abs() > MAX_PLAIN_ZEROS {
            format!("{}e{}", digits, exponent)
        } else {
            format!("{}{}", digits, "0".repeat(exponent.unsigned_abs()))
        }
    } else {
        let point = exponent.unsigned_abs();
        if digits.len() > point {
            let (int_part, frac_part) = digits.split_at(digits.len() - point);
            format!("{}.{}", int_part, frac_part)
        } else if point - digits.len() > MAX_PLAIN_ZEROS {
            format!("{}e{}", digits, exponent)
        } else {
            format!("0.{}{}", "0".repeat(point - digits.len()), digits)
        }
    };

    if negative { format!("-{}", body) } else { body }
}

// ========== Trait Implementations ==========

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (significand, exponent) = self.inner.clone().into_repr().into_parts();
        f.write_str(&render_decimal(&significand, exponent))
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner.partial_cmp(&other.inner).unwrap_or(std::cmp::Ordering::Equal)
    }
}
