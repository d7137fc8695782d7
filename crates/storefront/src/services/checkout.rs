//! Checkout: validate, run the stock transaction, notify.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use pharmacorp_core::checkout::{CheckoutRequest, CheckoutValidationError};
use pharmacorp_core::{OrderNumber, ProductId, UserId};

use super::email::EmailService;
use crate::db::{CheckoutFailure, NewOrder, OrderRepository, RepositoryError};
use crate::models::Order;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] CheckoutValidationError),

    #[error("Product {0} is no longer available")]
    ProductNotFound(ProductId),

    #[error("Insufficient stock for {name}. Only {available} available.")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i32,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CheckoutFailure> for CheckoutError {
    fn from(failure: CheckoutFailure) -> Self {
        match failure {
            CheckoutFailure::ProductNotFound(id) => Self::ProductNotFound(id),
            CheckoutFailure::InsufficientStock {
                product_id,
                name,
                available,
                ..
            } => Self::InsufficientStock {
                product_id,
                name,
                available,
            },
            CheckoutFailure::Repository(e) => Self::Repository(e),
        }
    }
}

pub struct CheckoutService<'a> {
    orders: OrderRepository<'a>,
    email: &'a EmailService,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: &'a EmailService) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            email,
        }
    }

    /// Place a cash-on-delivery order for `user_id`.
    ///
    /// On success the stock is decremented, the order and its items are
    /// stored, and the user's cart is empty. Order emails are sent in the
    /// background after commit; their failure does not affect the result.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` before touching the database,
    /// `CheckoutError::ProductNotFound` / `CheckoutError::InsufficientStock`
    /// when a line cannot be reserved, and `CheckoutError::Repository` for
    /// database failures. Nothing is written on error.
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        let plan = request.validate()?;
        let order_number = OrderNumber::generate(Utc::now().date_naive(), &mut rand::rng());

        let order = self
            .orders
            .create_from_checkout(NewOrder {
                user_id,
                order_number,
                lines: &plan.lines,
                shipping: &plan.shipping,
                notes: plan.notes.as_deref(),
            })
            .await?;

        tracing::info!(
            order_number = %order.order_number,
            user_id = %user_id,
            lines = order.items.len(),
            total = %order.total,
            "order placed"
        );

        let email = self.email.clone();
        let placed = order.clone();
        tokio::spawn(async move {
            email.notify_order_placed(&placed).await;
        });

        Ok(order)
    }
}
