//! Monetary amounts using decimal arithmetic.
//!
//! The store sells in a single currency (USD), so a price is just a
//! non-negative decimal with two fractional digits. Line totals and order
//! totals are computed with [`Money::times`] and `Sum`, never with floats.

use core::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Prices cannot be negative.
    #[error("amount cannot be negative")]
    Negative,
}

/// A non-negative USD amount rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a money value, rounding to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount.round_dp(2)))
    }

    /// Create a money value from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self((self.0 * Decimal::from(quantity)).round_dp(2))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn usd(s: &str) -> Money {
        Money::new(Decimal::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(
            Money::new(Decimal::from_str("-0.01").unwrap()),
            Err(MoneyError::Negative)
        );
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_rounds_to_cents() {
        assert_eq!(usd("19.999"), usd("20.00"));
    }

    #[test]
    fn test_times_and_sum() {
        let line_a = usd("49.99").times(3);
        let line_b = usd("24.99").times(1);
        assert_eq!(line_a, usd("149.97"));
        assert_eq!([line_a, line_b].into_iter().sum::<Money>(), usd("174.96"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(3499).to_string(), "$34.99");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_json_uses_string_amounts() {
        let json = serde_json::to_string(&usd("12.50")).unwrap();
        assert_eq!(json, "\"12.50\"");

        let parsed: Money = serde_json::from_str("\"7.25\"").unwrap();
        assert_eq!(parsed, usd("7.25"));
        assert!(serde_json::from_str::<Money>("\"-1\"").is_err());
    }
}
