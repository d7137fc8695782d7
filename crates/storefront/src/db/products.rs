//! Product repository: catalog reads and admin writes.
//!
//! Stock is only ever changed here by admin edits. Checkout decrements it
//! inside its own transaction in [`super::orders`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use pharmacorp_core::{LOW_STOCK_THRESHOLD, Money, ProductId};

use super::RepositoryError;
use crate::models::{
    InventoryStats, Product, ProductFilter, ProductQuery, ValidNewProduct, ValidProductUpdate,
};

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category, image, quantity, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    image: String,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Money::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("product {} has invalid price: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            category: row.category,
            image: row.image,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

#[derive(sqlx::FromRow)]
struct InventoryStatsRow {
    total_products: i64,
    low_stock_count: i64,
    out_of_stock_count: i64,
    total_inventory_value: Decimal,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE TRUE"
        ));

        if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            builder.push(" AND category = ").push_bind(category.to_owned());
        }
        match query.in_stock {
            Some(true) => {
                builder.push(" AND quantity > 0");
            }
            Some(false) => {
                builder.push(" AND quantity = 0");
            }
            None => {}
        }
        match query.filter {
            Some(ProductFilter::InStock) => {
                builder.push(" AND quantity > 0");
            }
            Some(ProductFilter::LowStock) => {
                builder
                    .push(" AND quantity > 0 AND quantity <= ")
                    .push_bind(LOW_STOCK_THRESHOLD);
            }
            Some(ProductFilter::OutOfStock) => {
                builder.push(" AND quantity = 0");
            }
            None => {}
        }
        builder
            .push(" ORDER BY ")
            .push(query.sort.unwrap_or_default().order_by());

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;
        into_products(rows)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get every product whose ID is in `ids`. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        into_products(rows)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &ValidNewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO storefront.product (name, description, price, category, image, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.quantity)
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Apply a partial update. Absent fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ValidProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE storefront.product SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                category = COALESCE($5, category),
                image = COALESCE($6, image),
                quantity = COALESCE($7, quantity),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.price.map(|p| p.amount()))
        .bind(update.category.as_deref())
        .bind(update.image.as_deref())
        .bind(update.quantity)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    /// Delete a product. Cart rows go with it; order snapshots stay.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Distinct categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar(
            "SELECT DISTINCT category FROM storefront.product ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Inventory totals for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inventory_stats(&self) -> Result<InventoryStats, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryStatsRow>(
            r"
            SELECT
                COUNT(*) AS total_products,
                COUNT(*) FILTER (WHERE quantity > 0 AND quantity <= $1) AS low_stock_count,
                COUNT(*) FILTER (WHERE quantity = 0) AS out_of_stock_count,
                COALESCE(SUM(price * quantity), 0)::NUMERIC AS total_inventory_value
            FROM storefront.product
            ",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(self.pool)
        .await?;

        Ok(InventoryStats {
            total_products: row.total_products,
            low_stock_count: row.low_stock_count,
            out_of_stock_count: row.out_of_stock_count,
            total_inventory_value: row.total_inventory_value,
        })
    }

    /// Most recently added products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        into_products(rows)
    }
}
