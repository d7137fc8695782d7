//! Integer primary keys, one newtype per table.

/// Declare an `i32` key newtype.
///
/// The generated type is `Copy`, ordered, serializes as a bare number and,
/// with the `postgres` feature, binds and decodes as `INTEGER`. Ordering
/// matters: checkout locks product rows in ascending id order.
///
/// ```rust
/// # use pharmacorp_core::define_id;
/// define_id!(ShipmentId);
///
/// let id = ShipmentId::new(7);
/// assert_eq!(i32::from(id), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(OrderItemId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_ids_sort_numerically() {
        let mut ids = vec![ProductId::new(10), ProductId::new(2), ProductId::new(7)];
        ids.sort();
        assert_eq!(
            ids,
            vec![ProductId::new(2), ProductId::new(7), ProductId::new(10)]
        );
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&OrderId::new(42)).ok().as_deref(), Some("42"));
        let parsed: Option<UserId> = serde_json::from_str("5").ok();
        assert_eq!(parsed, Some(UserId::new(5)));
    }
}
