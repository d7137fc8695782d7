//! Cart operations with stock checks.
//!
//! Adding to the cart checks `in cart + requested <= stock`. That is advisory:
//! stock can still change before checkout, which re-checks under lock.

use sqlx::PgPool;
use thiserror::Error;

use pharmacorp_core::cart::{self, CartLine, StockExceeded};
use pharmacorp_core::{ProductId, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{CartView, CartViewLine};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Product not found")]
    ProductNotFound(ProductId),

    #[error(transparent)]
    StockExceeded(#[from] StockExceeded),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Cart service for signed-in users, plus guest-cart lookup.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// The user's cart with live prices and stock.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, CartError> {
        Ok(CartView::new(self.carts.lines_with_products(user_id).await?))
    }

    /// Add `quantity` units on top of what is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a quantity below 1,
    /// `CartError::ProductNotFound` for an unknown product and
    /// `CartError::StockExceeded` when the new total is more than is on hand.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let in_cart = self
            .carts
            .quantity_of(user_id, product_id)
            .await?
            .unwrap_or(0);
        let total = in_cart.saturating_add(quantity);
        cart::ensure_within_stock(total, product.quantity)?;

        self.store(user_id, CartLine::new(product_id, total)).await?;
        tracing::debug!(user_id = %user_id, product_id = %product_id, quantity = total, "cart item added");
        self.view(user_id).await
    }

    /// Set the quantity of one line. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a negative quantity,
    /// `CartError::ProductNotFound` for an unknown product and
    /// `CartError::StockExceeded` when the quantity is more than is on hand.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity);
        }
        if quantity == 0 {
            return self.remove(user_id, product_id).await;
        }
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;
        cart::ensure_within_stock(quantity, product.quantity)?;

        self.store(user_id, CartLine::new(product_id, quantity)).await?;
        self.view(user_id).await
    }

    /// Remove one line. Removing a product that is not in the cart is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<CartView, CartError> {
        self.carts.remove(user_id, product_id).await?;
        self.view(user_id).await
    }

    /// Replace the whole cart. An empty list clears it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the transaction fails.
    pub async fn replace(&self, user_id: UserId, items: &[CartLine]) -> Result<CartView, CartError> {
        self.carts.replace(user_id, items).await?;
        self.view(user_id).await
    }

    /// Fold a guest cart into the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the transaction fails.
    pub async fn merge(&self, user_id: UserId, guest: &[CartLine]) -> Result<CartView, CartError> {
        self.carts.merge_guest(user_id, guest).await?;
        self.view(user_id).await
    }

    /// Reconcile a guest cart against the catalog without storing it.
    ///
    /// Unknown products and non-positive quantities are dropped; duplicate
    /// lines keep the last quantity. Lines keep the caller's order.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn lookup(&self, items: &[CartLine]) -> Result<CartView, CartError> {
        let normalized = cart::normalize(items.iter().copied());
        let ids: Vec<ProductId> = normalized.iter().map(|line| line.product_id).collect();
        let products = self.products.get_many(&ids).await?;

        let mut seen = Vec::with_capacity(normalized.len());
        let lines = items
            .iter()
            .filter_map(|item| {
                if seen.contains(&item.product_id) {
                    return None;
                }
                let line = normalized
                    .iter()
                    .find(|line| line.product_id == item.product_id)?;
                let product = products.iter().find(|p| p.id == line.product_id)?;
                seen.push(item.product_id);
                Some(CartViewLine::new(
                    product.id,
                    product.name.clone(),
                    product.image.clone(),
                    product.price,
                    line.quantity,
                    product.quantity,
                ))
            })
            .collect();

        Ok(CartView::new(lines))
    }

    async fn store(&self, user_id: UserId, line: CartLine) -> Result<(), CartError> {
        self.carts
            .set_quantity(user_id, line)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound(line.product_id),
                other => CartError::Repository(other),
            })
    }
}
