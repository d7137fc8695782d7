//! Cart repository for signed-in users.
//!
//! Bulk writes (replace and guest merge) run in one transaction that first
//! locks the user's existing rows, so a concurrent reader sees either the
//! old cart or the new one and never an empty cart in between.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use pharmacorp_core::cart::{self, CartLine};
use pharmacorp_core::{Money, ProductId, UserId};

use super::RepositoryError;
use crate::models::CartViewLine;

#[derive(sqlx::FromRow)]
struct CartLineRow {
    product_id: ProductId,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self::new(row.product_id, row.quantity)
    }
}

#[derive(sqlx::FromRow)]
struct CartViewRow {
    product_id: ProductId,
    quantity: i32,
    name: String,
    image: String,
    price: Decimal,
    stock: i32,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart lines, ordered by product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT product_id, quantity
            FROM storefront.cart_item
            WHERE user_id = $1
            ORDER BY product_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// The user's cart joined with live product data, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a product price is invalid.
    pub async fn lines_with_products(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CartViewLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartViewRow>(
            r"
            SELECT c.product_id, c.quantity, p.name, p.image, p.price,
                   p.quantity AS stock
            FROM storefront.cart_item c
            JOIN storefront.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.created_at, c.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let price = Money::new(row.price).map_err(|e| {
                    RepositoryError::DataCorruption(format!(
                        "product {} has invalid price: {e}",
                        row.product_id
                    ))
                })?;
                Ok(CartViewLine::new(
                    row.product_id,
                    row.name,
                    row.image,
                    price,
                    row.quantity,
                    row.stock,
                ))
            })
            .collect()
    }

    /// Quantity of one product in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity_of(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<i32>, RepositoryError> {
        let quantity = sqlx::query_scalar(
            "SELECT quantity FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(quantity)
    }

    /// Insert or overwrite one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        line: CartLine,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        upsert_lines(&mut *conn, user_id, &[line]).await
    }

    /// Remove one line. Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Make the stored cart equal to `desired`.
    ///
    /// Rows missing from `desired` are deleted and the rest are upserted in
    /// one transaction. Lines for products that no longer exist are dropped.
    /// Returns the resulting cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// changed in that case.
    pub async fn replace(
        &self,
        user_id: UserId,
        desired: &[CartLine],
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_lines(&mut *tx, user_id).await?;
        let desired =
            retain_existing_products(&mut *tx, cart::normalize(desired.iter().copied())).await?;
        let plan = cart::diff(&current, &desired);

        if !plan.remove.is_empty() {
            sqlx::query(
                "DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = ANY($2)",
            )
            .bind(user_id)
            .bind(&plan.remove)
            .execute(&mut *tx)
            .await?;
        }
        upsert_lines(&mut *tx, user_id, &plan.upsert).await?;

        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            removed = plan.remove.len(),
            upserted = plan.upsert.len(),
            "cart replaced"
        );
        Ok(desired)
    }

    /// Add a guest cart into the stored cart, summing overlapping products.
    ///
    /// Returns the merged cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// changed in that case.
    pub async fn merge_guest(
        &self,
        user_id: UserId,
        guest: &[CartLine],
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = lock_lines(&mut *tx, user_id).await?;
        let guest = retain_existing_products(&mut *tx, guest.to_vec()).await?;
        let plan: Vec<CartLine> = cart::merge(&existing, &guest)
            .iter()
            .map(cart::CartMutation::line)
            .collect();
        upsert_lines(&mut *tx, user_id, &plan).await?;

        let merged = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT product_id, quantity
            FROM storefront.cart_item
            WHERE user_id = $1
            ORDER BY product_id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, merged_lines = plan.len(), "guest cart merged");
        Ok(merged.into_iter().map(CartLine::from).collect())
    }
}

/// Read and row-lock the user's cart.
async fn lock_lines(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r"
        SELECT product_id, quantity
        FROM storefront.cart_item
        WHERE user_id = $1
        ORDER BY product_id
        FOR UPDATE
        ",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(CartLine::from).collect())
}

/// Drop lines whose product has been deleted from the catalog.
async fn retain_existing_products(
    conn: &mut PgConnection,
    lines: Vec<CartLine>,
) -> Result<Vec<CartLine>, RepositoryError> {
    if lines.is_empty() {
        return Ok(lines);
    }
    let ids: Vec<ProductId> = lines.iter().map(|line| line.product_id).collect();
    let known: Vec<ProductId> =
        sqlx::query_scalar("SELECT id FROM storefront.product WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(conn)
            .await?;

    let (kept, dropped): (Vec<_>, Vec<_>) = lines
        .into_iter()
        .partition(|line| known.contains(&line.product_id));
    if !dropped.is_empty() {
        tracing::debug!(dropped = dropped.len(), "skipping cart lines for unknown products");
    }
    Ok(kept)
}

/// Insert or overwrite many lines in one statement.
async fn upsert_lines(
    conn: &mut PgConnection,
    user_id: UserId,
    lines: &[CartLine],
) -> Result<(), RepositoryError> {
    if lines.is_empty() {
        return Ok(());
    }
    let product_ids: Vec<ProductId> = lines.iter().map(|line| line.product_id).collect();
    let quantities: Vec<i32> = lines.iter().map(|line| line.quantity).collect();

    sqlx::query(
        r"
        INSERT INTO storefront.cart_item (user_id, product_id, quantity)
        SELECT $1, product_id, quantity
        FROM UNNEST($2::INTEGER[], $3::INTEGER[]) AS t (product_id, quantity)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
        ",
    )
    .bind(user_id)
    .bind(&product_ids)
    .bind(&quantities)
    .execute(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return RepositoryError::NotFound;
        }
        RepositoryError::Database(e)
    })?;
    Ok(())
}
