//! Human-readable order numbers: `ORD-YYYYMMDD-XXXX`.
//!
//! The suffix is four random characters from `[A-Z0-9]`, so uniqueness is
//! only probabilistic (36^4 per day). The database enforces it with a unique
//! index; a collision fails the checkout instead of being retried.

use core::fmt;

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

const PREFIX: &str = "ORD";
const SUFFIX_LEN: usize = 4;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// Wrong prefix, segment count, or suffix alphabet.
    #[error("order number must look like ORD-YYYYMMDD-XXXX")]
    Format,
    /// The date segment is not a calendar date.
    #[error("order number has an invalid date")]
    Date,
}

/// A validated order number.
///
/// ```
/// use chrono::NaiveDate;
/// use pharmacorp_core::OrderNumber;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// let number = OrderNumber::generate(date, &mut rand::rng());
/// assert!(number.as_str().starts_with("ORD-20240309-"));
/// assert_eq!(number.date(), date);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a fresh order number for `date`.
    pub fn generate<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())]))
            .collect();
        Self(format!("{PREFIX}-{}-{suffix}", date.format("%Y%m%d")))
    }

    /// Parse an existing order number.
    ///
    /// # Errors
    ///
    /// Returns `OrderNumberError::Format` when the layout, prefix, or suffix
    /// alphabet is wrong, and `OrderNumberError::Date` when the date segment
    /// is not a real calendar date.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let mut parts = s.split('-');
        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(OrderNumberError::Format);
        };

        if prefix != PREFIX
            || date.len() != 8
            || !date.bytes().all(|b| b.is_ascii_digit())
            || suffix.len() != SUFFIX_LEN
            || !suffix.bytes().all(|b| SUFFIX_CHARSET.contains(&b))
        {
            return Err(OrderNumberError::Format);
        }

        NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| OrderNumberError::Date)?;
        Ok(Self(s.to_owned()))
    }

    /// The order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar date encoded in the number.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0
            .get(4..12)
            .and_then(|segment| NaiveDate::parse_from_str(segment, "%Y%m%d").ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn test_generate_format() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let number = OrderNumber::generate(date(), &mut rng);
            let s = number.as_str();
            assert_eq!(s.len(), "ORD-20250131-XXXX".len());
            assert!(s.starts_with("ORD-20250131-"));
            assert!(
                s[13..]
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
            );
            // generated numbers always parse back
            assert_eq!(OrderNumber::parse(s).unwrap(), number);
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(OrderNumber::parse("ORD-20250131"), Err(OrderNumberError::Format));
        assert_eq!(
            OrderNumber::parse("INV-20250131-AB12"),
            Err(OrderNumberError::Format)
        );
        assert_eq!(
            OrderNumber::parse("ORD-20250131-ab12"),
            Err(OrderNumberError::Format)
        );
        assert_eq!(
            OrderNumber::parse("ORD-20250131-AB12-X"),
            Err(OrderNumberError::Format)
        );
        assert_eq!(
            OrderNumber::parse("ORD-20251340-AB12"),
            Err(OrderNumberError::Date)
        );
    }

    #[test]
    fn test_date_roundtrip() {
        let number = OrderNumber::parse("ORD-20240229-Z9Z9").unwrap();
        assert_eq!(number.date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
