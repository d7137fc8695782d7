//! Catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use pharmacorp_core::{Money, ProductId, StockLevel, in_stock};

/// Image used when an admin creates a product without one.
pub const DEFAULT_PRODUCT_IMAGE: &str = "/products/default.jpg";

/// A product in the catalog.
///
/// `quantity` is the authoritative stock count. `inStock` and `stockLevel`
/// appear in JSON but are computed on serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub image: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        in_stock(self.quantity)
    }

    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        StockLevel::of(self.quantity)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductJson<'a> {
    id: ProductId,
    name: &'a str,
    description: &'a str,
    price: Money,
    category: &'a str,
    image: &'a str,
    quantity: i32,
    in_stock: bool,
    stock_level: StockLevel,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ProductJson {
            id: self.id,
            name: &self.name,
            description: &self.description,
            price: self.price,
            category: &self.category,
            image: &self.image,
            quantity: self.quantity,
            in_stock: self.in_stock(),
            stock_level: self.stock_level(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .serialize(serializer)
    }
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    Price,
    Newest,
}

impl ProductSort {
    /// `ORDER BY` clause. Ties break on id so pages are stable.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Name => "name ASC, id ASC",
            Self::Price => "price ASC, id ASC",
            Self::Newest => "created_at DESC, id DESC",
        }
    }
}

/// Admin inventory filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductFilter {
    InStock,
    LowStock,
    OutOfStock,
}

/// Query-string parameters for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub sort: Option<ProductSort>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub filter: Option<ProductFilter>,
}

/// Validation failures for product writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductValidationError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Price must be zero or more")]
    NegativePrice,
    #[error("Quantity must be zero or more")]
    NegativeQuantity,
}

/// Body of `POST /admin/products`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
}

/// A product ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub image: String,
    pub quantity: i32,
}

impl NewProduct {
    /// Check required fields and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductValidationError`] for a blank name, description or
    /// category, a missing or negative price, or a negative quantity.
    pub fn validate(self) -> Result<ValidNewProduct, ProductValidationError> {
        let name = self.name.trim();
        let description = self.description.trim();
        let category = self.category.trim();
        if name.is_empty() || description.is_empty() || category.is_empty() {
            return Err(ProductValidationError::MissingFields);
        }
        let price = self.price.ok_or(ProductValidationError::MissingFields)?;
        let price = Money::new(price).map_err(|_| ProductValidationError::NegativePrice)?;

        let quantity = self.quantity.unwrap_or(0);
        if quantity < 0 {
            return Err(ProductValidationError::NegativeQuantity);
        }

        let image = self
            .image
            .map(|image| image.trim().to_owned())
            .filter(|image| !image.is_empty())
            .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_owned());

        Ok(ValidNewProduct {
            name: name.to_owned(),
            description: description.to_owned(),
            price,
            category: category.to_owned(),
            image,
            quantity,
        })
    }
}

/// Body of `PUT /admin/products/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub quantity: Option<i32>,
}

/// A partial update that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub quantity: Option<i32>,
}

impl ProductUpdate {
    /// Validate the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductValidationError`] when a present text field is
    /// blank, or when price or quantity is negative.
    pub fn validate(self) -> Result<ValidProductUpdate, ProductValidationError> {
        fn text(value: Option<String>) -> Result<Option<String>, ProductValidationError> {
            match value.map(|v| v.trim().to_owned()) {
                Some(v) if v.is_empty() => Err(ProductValidationError::MissingFields),
                other => Ok(other),
            }
        }

        let price = self
            .price
            .map(Money::new)
            .transpose()
            .map_err(|_| ProductValidationError::NegativePrice)?;
        if self.quantity.is_some_and(|q| q < 0) {
            return Err(ProductValidationError::NegativeQuantity);
        }

        Ok(ValidProductUpdate {
            name: text(self.name)?,
            description: text(self.description)?,
            price,
            category: text(self.category)?,
            image: text(self.image)?,
            quantity: self.quantity,
        })
    }
}

/// Dashboard inventory figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_products: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    /// Σ price × quantity over the catalog.
    pub total_inventory_value: Decimal,
}
