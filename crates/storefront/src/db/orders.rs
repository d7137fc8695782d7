//! Order repository, including the checkout transaction.
//!
//! # Checkout
//!
//! [`OrderRepository::create_from_checkout`] is the only place stock goes
//! down. In one transaction it:
//!
//! 1. decrements each product with a conditional update
//!    (`quantity = quantity - $n WHERE quantity >= $n`), in product-id order;
//! 2. inserts the order and its snapshot lines;
//! 3. empties the buyer's cart.
//!
//! The conditional update takes the row lock and checks stock in the same
//! statement, so two concurrent checkouts cannot both sell the last unit.
//! Any failure drops the transaction, which rolls everything back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use pharmacorp_core::cart::CartLine;
use pharmacorp_core::checkout::{LineSnapshot, OrderTotals, ShippingDetails};
use pharmacorp_core::{
    Money, OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, UserId,
};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Order, OrderItem, OrderStats, OrderSummary};

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, status, payment_status, payment_method,
    shipping_name, shipping_email, shipping_phone, shipping_address,
    shipping_city, shipping_state, shipping_zip,
    subtotal, total, notes, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, product_id, product_name, product_image, product_price, quantity, total";

const SUMMARY_SELECT: &str = r"
    SELECT o.id, o.order_number, o.status, o.payment_status, o.shipping_name,
           o.total, o.created_at,
           (SELECT COALESCE(SUM(i.quantity), 0)::BIGINT
              FROM storefront.order_item i
             WHERE i.order_id = o.id) AS item_count
    FROM storefront.customer_order o";

/// Why a checkout did not produce an order.
#[derive(Debug, Error)]
pub enum CheckoutFailure {
    /// A requested product does not exist.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// A requested quantity is more than is on hand.
    #[error("Insufficient stock for {name}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i32,
        requested: i32,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutFailure {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Everything the checkout transaction writes.
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub order_number: OrderNumber,
    /// Consolidated lines, one per product, sorted by product id.
    pub lines: &'a [CartLine],
    pub shipping: &'a ShippingDetails,
    pub notes: Option<&'a str>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    user_id: UserId,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    shipping_name: String,
    shipping_email: String,
    shipping_phone: String,
    shipping_address: String,
    shipping_city: String,
    shipping_state: String,
    shipping_zip: String,
    subtotal: Decimal,
    total: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    product_id: Option<ProductId>,
    product_name: String,
    product_image: String,
    product_price: Decimal,
    quantity: i32,
    total: Decimal,
}

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    order_number: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    shipping_name: String,
    total: Decimal,
    created_at: DateTime<Utc>,
    item_count: i64,
}

#[derive(sqlx::FromRow)]
struct ReservedProductRow {
    id: ProductId,
    name: String,
    image: String,
    price: Decimal,
}

#[derive(sqlx::FromRow)]
struct StockRow {
    name: String,
    quantity: i32,
}

#[derive(sqlx::FromRow)]
struct OrderStatsRow {
    total_orders: i64,
    pending_orders: i64,
    today_revenue: Decimal,
    total_revenue: Decimal,
}

fn money(value: Decimal, what: &str) -> Result<Money, RepositoryError> {
    Money::new(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {what} in database: {e}")))
}

fn order_number(value: &str) -> Result<OrderNumber, RepositoryError> {
    OrderNumber::parse(value).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid order number in database: {e}"))
    })
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_image: row.product_image,
            product_price: money(row.product_price, "item price")?,
            quantity: row.quantity,
            total: money(row.total, "item total")?,
        })
    }
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = RepositoryError;

    fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_number: order_number(&row.order_number)?,
            status: row.status,
            payment_status: row.payment_status,
            shipping_name: row.shipping_name,
            total: money(row.total, "order total")?,
            item_count: row.item_count,
            created_at: row.created_at,
        })
    }
}

fn assemble(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
    Ok(Order {
        id: row.id,
        order_number: order_number(&row.order_number)?,
        user_id: row.user_id,
        status: row.status,
        payment_status: row.payment_status,
        payment_method: row.payment_method,
        shipping_name: row.shipping_name,
        shipping_email: row.shipping_email,
        shipping_phone: row.shipping_phone,
        shipping_address: row.shipping_address,
        shipping_city: row.shipping_city,
        shipping_state: row.shipping_state,
        shipping_zip: row.shipping_zip,
        subtotal: money(row.subtotal, "order subtotal")?,
        total: money(row.total, "order total")?,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
        items: items
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<Result<_, _>>()?,
    })
}

fn summaries(rows: Vec<OrderSummaryRow>) -> Result<Vec<OrderSummary>, RepositoryError> {
    rows.into_iter().map(OrderSummary::try_from).collect()
}

/// Reserve stock for one line, returning the product data to snapshot.
async fn reserve_stock(
    conn: &mut PgConnection,
    line: CartLine,
) -> Result<LineSnapshot, CheckoutFailure> {
    let reserved = sqlx::query_as::<_, ReservedProductRow>(
        r"
        UPDATE storefront.product
        SET quantity = quantity - $2, updated_at = NOW()
        WHERE id = $1 AND quantity >= $2
        RETURNING id, name, image, price
        ",
    )
    .bind(line.product_id)
    .bind(line.quantity)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = reserved {
        let price = money(row.price, "product price")?;
        return Ok(LineSnapshot::new(
            row.id,
            row.name,
            row.image,
            price,
            line.quantity,
        ));
    }

    // Nothing updated: either the product is gone or stock is short.
    let stock = sqlx::query_as::<_, StockRow>(
        "SELECT name, quantity FROM storefront.product WHERE id = $1",
    )
    .bind(line.product_id)
    .fetch_optional(&mut *conn)
    .await?;

    Err(match stock {
        None => CheckoutFailure::ProductNotFound(line.product_id),
        Some(stock) => CheckoutFailure::InsufficientStock {
            product_id: line.product_id,
            name: stock.name,
            available: stock.quantity,
            requested: line.quantity,
        },
    })
}

async fn load_items(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItemRow>, RepositoryError> {
    let items = sqlx::query_as::<_, OrderItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM storefront.order_item WHERE order_id = $1 ORDER BY position"
    ))
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Run the checkout transaction. See the module docs.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutFailure::ProductNotFound` or
    /// `CheckoutFailure::InsufficientStock` for the first line that cannot
    /// be reserved, and `CheckoutFailure::Repository` for database failures
    /// (including an order-number collision). Nothing is written on error.
    pub async fn create_from_checkout(&self, order: NewOrder<'_>) -> Result<Order, CheckoutFailure> {
        let mut tx = self.pool.begin().await?;

        let mut snapshots = Vec::with_capacity(order.lines.len());
        for line in order.lines {
            snapshots.push(reserve_stock(&mut *tx, *line).await?);
        }
        let totals = OrderTotals::from_lines(&snapshots);

        let shipping = order.shipping;
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO storefront.customer_order (
                order_number, user_id, status, payment_status, payment_method,
                shipping_name, shipping_email, shipping_phone, shipping_address,
                shipping_city, shipping_state, shipping_zip,
                subtotal, total, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.order_number.as_str())
        .bind(order.user_id)
        .bind(OrderStatus::Pending)
        .bind(PaymentStatus::Unpaid)
        .bind(PaymentMethod::CashOnDelivery)
        .bind(&shipping.name)
        .bind(&shipping.email)
        .bind(&shipping.phone)
        .bind(&shipping.address)
        .bind(&shipping.city)
        .bind(&shipping.state)
        .bind(&shipping.zip)
        .bind(totals.subtotal.amount())
        .bind(totals.total.amount())
        .bind(order.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "order number"))?;

        let mut items = Vec::with_capacity(snapshots.len());
        for (position, snapshot) in (0_i32..).zip(&snapshots) {
            let item = sqlx::query_as::<_, OrderItemRow>(&format!(
                r"
                INSERT INTO storefront.order_item (
                    order_id, position, product_id, product_name, product_image,
                    product_price, quantity, total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {ITEM_COLUMNS}
                "
            ))
            .bind(row.id)
            .bind(position)
            .bind(snapshot.product_id)
            .bind(&snapshot.product_name)
            .bind(&snapshot.product_image)
            .bind(snapshot.product_price.amount())
            .bind(snapshot.quantity)
            .bind(snapshot.total.amount())
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(order.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(assemble(row, items)?)
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                let items = load_items(&mut *conn, row.id).await?;
                assemble(row, items).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Get an order only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self.get(id).await?.filter(|order| order.user_id == user_id))
    }

    /// Get an order by its human-readable number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let id: Option<OrderId> = sqlx::query_scalar(
            "SELECT id FROM storefront.customer_order WHERE order_number = $1",
        )
        .bind(number.as_str())
        .fetch_optional(self.pool)
        .await?;

        match id {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            "{SUMMARY_SELECT} WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        summaries(rows)
    }

    /// All orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            r"{SUMMARY_SELECT}
            WHERE ($1::storefront.order_status IS NULL OR o.status = $1)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        summaries(rows)
    }

    /// Number of orders, optionally with one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, status: Option<OrderStatus>) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM storefront.customer_order
            WHERE ($1::storefront.order_status IS NULL OR status = $1)
            ",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Move an order from `from` to `to`.
    ///
    /// The write only applies if the order is still in `from`, so two admins
    /// editing the same order cannot skip validation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the status changed since it was
    /// read (or the order is gone).
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE storefront.customer_order
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            ",
        )
        .bind(id)
        .bind(to)
        .bind(from)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "order status was changed by someone else".to_owned(),
            ));
        }

        tracing::info!(order_id = %id, from = %from, to = %to, "order status updated");
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Set the payment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE storefront.customer_order
            SET payment_status = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::info!(order_id = %id, payment_status = %status, "payment status updated");
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Order counts and revenue for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let row = sqlx::query_as::<_, OrderStatsRow>(
            r"
            SELECT
                COUNT(*) AS total_orders,
                COUNT(*) FILTER (WHERE status = 'PENDING') AS pending_orders,
                COALESCE(SUM(total) FILTER (
                    WHERE created_at >= date_trunc('day', NOW() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC'
                ), 0)::NUMERIC AS today_revenue,
                COALESCE(SUM(total), 0)::NUMERIC AS total_revenue
            FROM storefront.customer_order
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(OrderStats {
            total_orders: row.total_orders,
            pending_orders: row.pending_orders,
            today_revenue: row.today_revenue,
            total_revenue: row.total_revenue,
        })
    }

    /// Most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<OrderSummary>, RepositoryError> {
        self.list(None, limit, 0).await
    }
}
