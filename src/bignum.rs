//! Arbitrary-precision integers and decimals as canonical decimal text.
//!
//! The wire format for these types is their decimal rendering inside a
//! length-delimited payload, so the codec carries them as validated text and
//! never does arithmetic on them.

use core::fmt;

use crate::error::Error;

/// An arbitrary-precision integer: optional sign, then digits with no
/// leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigInteger(String);

impl BigInteger {
    /// Parse and canonicalise decimal text: a leading `+` is dropped,
    /// leading zeros are stripped, and `-0` collapses to `0`.
    pub fn parse(text: &str) -> Result<BigInteger, Error> {
        let err = || Error::malformed("big integer", text);

        let (negative, digits) = if let Some(rest) = text.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = text.strip_prefix('+') {
            (false, rest)
        } else {
            (false, text)
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let digits = trim_leading_zeros(digits);
        let mut canonical = String::with_capacity(digits.len() + 1);
        if negative && digits != "0" {
            canonical.push('-');
        }
        canonical.push_str(digits);
        Ok(BigInteger(canonical))
    }

    pub fn zero() -> BigInteger {
        BigInteger("0".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for BigInteger {
    fn from(value: i64) -> BigInteger {
        BigInteger(value.to_string())
    }
}

impl fmt::Display for BigInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An arbitrary-precision decimal: integer part, optional fraction, optional
/// exponent (`-12.340E+5` style). The text is kept verbatim after validation
/// because trailing fraction zeros are significant to decimal scale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigDecimal(String);

impl BigDecimal {
    /// Validate decimal text; only a leading `+` is normalised away.
    pub fn parse(text: &str) -> Result<BigDecimal, Error> {
        let err = || Error::malformed("big decimal", text);

        let unsigned = text.strip_prefix('+').unwrap_or(text);
        let body = unsigned.strip_prefix('-').unwrap_or(unsigned);

        let (mantissa, exponent) = match body.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => (mantissa, Some(exponent)),
            None => (body, None),
        };

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (mantissa, None),
        };
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) {
            return Err(err());
        }
        if let Some(frac) = frac_part {
            if !all_digits(frac) {
                return Err(err());
            }
        }
        if let Some(exp) = exponent {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if !all_digits(exp) {
                return Err(err());
            }
        }

        Ok(BigDecimal(unsigned.to_owned()))
    }

    pub fn zero() -> BigDecimal {
        BigDecimal("0".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for BigDecimal {
    fn from(value: i64) -> BigDecimal {
        BigDecimal(value.to_string())
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn trim_leading_zeros(digits: &str) -> &str {
    let start = digits
        .bytes()
        .position(|b| b != b'0')
        .unwrap_or(digits.len() - 1);
    &digits[start..]
}
