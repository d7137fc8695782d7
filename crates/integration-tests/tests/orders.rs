//! Admin order updates.
//!
//! Requires `DATABASE_URL`. Run with: `cargo test -p pharmacorp-integration-tests -- --ignored`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use pharmacorp_core::cart::CartLine;
use pharmacorp_core::{OrderStatus, PaymentStatus};
use pharmacorp_integration_tests::{checkout_request, create_product, create_user, test_pool};
use pharmacorp_storefront::db::{OrderRepository, RepositoryError};
use pharmacorp_storefront::services::{CheckoutService, EmailService};

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_status_update_detects_concurrent_change() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let product = create_product(&pool, 1000, 5).await;

    let email = EmailService::disabled();
    let order = CheckoutService::new(&pool, &email)
        .place_order(user, checkout_request(vec![CartLine::new(product.id, 1)]))
        .await
        .unwrap();

    let orders = OrderRepository::new(&pool);
    let confirmed = orders
        .update_status(order.id, OrderStatus::Pending, OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    // A second admin still looking at the pending order.
    let stale = orders
        .update_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await;
    assert!(matches!(stale, Err(RepositoryError::Conflict(_))));

    let current = orders.get(order.id).await.unwrap().expect("order exists");
    assert_eq!(current.status, OrderStatus::Confirmed);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_payment_status_is_independent_of_status() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let product = create_product(&pool, 1000, 5).await;

    let email = EmailService::disabled();
    let order = CheckoutService::new(&pool, &email)
        .place_order(user, checkout_request(vec![CartLine::new(product.id, 1)]))
        .await
        .unwrap();

    let paid = OrderRepository::new(&pool)
        .update_payment_status(order.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatus::Pending);
}
