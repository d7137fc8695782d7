//! Checkout request validation and order snapshots.
//!
//! Everything a checkout needs decided before the database transaction
//! opens: shipping details present, cart non-empty, quantities positive and
//! consolidated per product. Once stock has been reserved, [`LineSnapshot`]
//! and [`OrderTotals`] turn live product data into the immutable order rows.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CartLine;
use crate::types::{Email, Money, ProductId};

/// Shipping fields that must be filled in.
pub const SHIPPING_FIELDS: [&str; 7] = ["name", "email", "phone", "address", "city", "state", "zip"];

/// Errors raised before any stock is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutValidationError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid quantity for product {0}")]
    InvalidQuantity(ProductId),

    #[error("Please fill in all shipping details")]
    MissingShipping(Vec<&'static str>),

    #[error("Please enter a valid email address")]
    InvalidEmail,
}

/// Where to send the order. Cash on delivery, so this is also the billing
/// contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

impl ShippingDetails {
    fn fields(&self) -> [&str; 7] {
        [
            &self.name,
            &self.email,
            &self.phone,
            &self.address,
            &self.city,
            &self.state,
            &self.zip,
        ]
    }

    /// Trim every field and check they are all present.
    ///
    /// # Errors
    ///
    /// `MissingShipping` lists every blank field; `InvalidEmail` is returned
    /// when all fields are present but the email does not parse.
    pub fn validate(self) -> Result<Self, CheckoutValidationError> {
        let trimmed = Self {
            name: self.name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip: self.zip.trim().to_owned(),
        };

        let missing: Vec<&'static str> = SHIPPING_FIELDS
            .into_iter()
            .zip(trimmed.fields())
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();
        if !missing.is_empty() {
            return Err(CheckoutValidationError::MissingShipping(missing));
        }

        let email = Email::parse(&trimmed.email).map_err(|_| CheckoutValidationError::InvalidEmail)?;
        Ok(Self {
            email: email.into_inner(),
            ..trimmed
        })
    }
}

/// Body of `POST /checkout`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub shipping: ShippingDetails,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A checkout that passed validation and is ready for the stock transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    /// One line per product, ordered by product id.
    pub lines: Vec<CartLine>,
    pub shipping: ShippingDetails,
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Validate items and shipping.
    ///
    /// Item errors are reported before shipping errors, so an empty cart
    /// reads "Cart is empty" even when the form is blank too.
    ///
    /// # Errors
    ///
    /// Any [`CheckoutValidationError`].
    pub fn validate(self) -> Result<CheckoutPlan, CheckoutValidationError> {
        let lines = consolidate(&self.items)?;
        let shipping = self.shipping.validate()?;
        let notes = self
            .notes
            .map(|notes| notes.trim().to_owned())
            .filter(|notes| !notes.is_empty());
        Ok(CheckoutPlan {
            lines,
            shipping,
            notes,
        })
    }
}

/// Collapse requested items into one line per product.
///
/// Duplicate lines add up so the stock check sees the real total. The
/// result is sorted by product id, which is also the order rows are locked
/// in during checkout, so two concurrent checkouts cannot deadlock on each
/// other's products.
///
/// # Errors
///
/// `EmptyCart` for no items, `InvalidQuantity` for any quantity below one.
pub fn consolidate(items: &[CartLine]) -> Result<Vec<CartLine>, CheckoutValidationError> {
    if items.is_empty() {
        return Err(CheckoutValidationError::EmptyCart);
    }
    if let Some(bad) = items.iter().find(|line| line.quantity <= 0) {
        return Err(CheckoutValidationError::InvalidQuantity(bad.product_id));
    }

    let mut totals = std::collections::BTreeMap::<ProductId, i32>::new();
    for line in items {
        let total = totals.entry(line.product_id).or_default();
        *total = total.saturating_add(line.quantity);
    }
    Ok(totals
        .into_iter()
        .map(|(product_id, quantity)| CartLine::new(product_id, quantity))
        .collect())
}

/// Product data frozen into an order item at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSnapshot {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: String,
    pub product_price: Money,
    pub quantity: i32,
    pub total: Money,
}

impl LineSnapshot {
    #[must_use]
    pub fn new(
        product_id: ProductId,
        product_name: String,
        product_image: String,
        product_price: Money,
        quantity: i32,
    ) -> Self {
        let units = u32::try_from(quantity).unwrap_or_default();
        Self {
            product_id,
            product_name,
            product_image,
            product_price,
            quantity,
            total: product_price.times(units),
        }
    }
}

/// Order-level money. Shipping is free and prices include tax, so the
/// total equals the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub total: Money,
}

impl OrderTotals {
    #[must_use]
    pub fn from_lines(lines: &[LineSnapshot]) -> Self {
        let subtotal: Money = lines.iter().map(|line| line.total).sum();
        Self {
            subtotal,
            total: subtotal,
        }
    }
}
