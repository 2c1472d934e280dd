//! Minor-unit currency arithmetic.
//!
//! All monetary amounts in this crate are carried as an integer count of
//! centavos. Binary floating point is never used to compute shares or
//! balances; the only place an `f64` appears is at the serde boundary,
//! where the server speaks two-decimal numbers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A monetary amount in minor currency units (centavos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Construct from a raw count of minor units.
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// The raw count of minor units.
    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn abs(self) -> Money {
        Money(self.0.abs())
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Subtraction clamped at zero. Used where a residual amount must
    /// never go negative.
    pub fn saturating_sub_to_zero(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Convert to the server's two-decimal representation.
    ///
    /// Exact for every amount representable with two decimals (an `f64`
    /// holds integers up to 2^53 exactly, and `cents / 100` stays within
    /// the 53-bit mantissa for any realistic amount).
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Round a two-decimal wire value to the nearest centavo.
    pub fn from_decimal(value: f64) -> Option<Money> {
        if !value.is_finite() {
            return None;
        }
        let cents = (value * 100.0).round();
        if cents.abs() > i64::MAX as f64 {
            return None;
        }
        Some(Money(cents as i64))
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money(iter.map(|m| m.0).sum())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Error parsing a user-entered amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid monetary amount: {0:?}")]
pub struct ParseMoneyError(String);

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Parse `"100"`, `"100.5"` or `"100.50"` (optionally negative).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParseMoneyError(s.to_string());

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (units_part, frac_part) = match digits.split_once('.') {
            Some((u, f)) => (u, f),
            None => (digits, ""),
        };

        if units_part.is_empty() || frac_part.len() > 2 {
            return Err(err());
        }

        let units: i64 = units_part.parse().map_err(|_| err())?;
        let frac: i64 = if frac_part.is_empty() {
            0
        } else {
            let padded = format!("{:0<2}", frac_part);
            padded.parse().map_err(|_| err())?
        };

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(err)?;
        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_decimal(value)
            .ok_or_else(|| serde::de::Error::custom(format!("amount out of range: {}", value)))
    }
}
