//! Checkout against a real database.
//!
//! Requires `DATABASE_URL`. Run with: `cargo test -p pharmacorp-integration-tests -- --ignored`

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use pharmacorp_core::cart::CartLine;
use pharmacorp_core::{Money, OrderStatus, PaymentStatus};
use pharmacorp_integration_tests::{
    checkout_request, create_product, create_user, stock_of, test_pool,
};
use pharmacorp_storefront::db::{CartRepository, OrderRepository};
use pharmacorp_storefront::services::{CheckoutError, CheckoutService, EmailService};

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_checkout_reserves_stock_and_clears_cart() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let a = create_product(&pool, 1000, 5).await;
    let b = create_product(&pool, 250, 10).await;

    let carts = CartRepository::new(&pool);
    carts
        .replace(user, &[CartLine::new(a.id, 2), CartLine::new(b.id, 4)])
        .await
        .unwrap();

    let email = EmailService::disabled();
    let order = CheckoutService::new(&pool, &email)
        .place_order(
            user,
            checkout_request(vec![CartLine::new(a.id, 2), CartLine::new(b.id, 4)]),
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total, Money::from_cents(3000));
    assert_eq!(order.subtotal, order.total);

    assert_eq!(stock_of(&pool, a.id).await, 3);
    assert_eq!(stock_of(&pool, b.id).await, 6);
    assert!(carts.list_for_user(user).await.unwrap().is_empty());

    let stored = OrderRepository::new(&pool)
        .get_by_number(&order.order_number)
        .await
        .unwrap()
        .expect("order stored");
    assert_eq!(stored.id, order.id);
    assert_eq!(stored.items[0].product_name, order.items[0].product_name);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_insufficient_stock_rolls_back_everything() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let plenty = create_product(&pool, 1000, 50).await;
    let scarce = create_product(&pool, 1000, 1).await;

    let carts = CartRepository::new(&pool);
    carts
        .replace(user, &[CartLine::new(plenty.id, 3), CartLine::new(scarce.id, 2)])
        .await
        .unwrap();

    let email = EmailService::disabled();
    let result = CheckoutService::new(&pool, &email)
        .place_order(
            user,
            checkout_request(vec![
                CartLine::new(plenty.id, 3),
                CartLine::new(scarce.id, 2),
            ]),
        )
        .await;

    match result {
        Err(CheckoutError::InsufficientStock {
            product_id,
            available,
            ..
        }) => {
            assert_eq!(product_id, scarce.id);
            assert_eq!(available, 1);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    // The first line was reserved before the failure; it must be undone.
    assert_eq!(stock_of(&pool, plenty.id).await, 50);
    assert_eq!(stock_of(&pool, scarce.id).await, 1);
    assert_eq!(carts.list_for_user(user).await.unwrap().len(), 2);
    assert!(
        OrderRepository::new(&pool)
            .list_for_user(user)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_order_snapshot_survives_price_change() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let product = create_product(&pool, 4999, 10).await;

    let email = EmailService::disabled();
    let order = CheckoutService::new(&pool, &email)
        .place_order(user, checkout_request(vec![CartLine::new(product.id, 1)]))
        .await
        .unwrap();

    sqlx::query("UPDATE storefront.product SET price = 1.00 WHERE id = $1")
        .bind(product.id)
        .execute(&pool)
        .await
        .unwrap();

    let stored = OrderRepository::new(&pool)
        .get(order.id)
        .await
        .unwrap()
        .expect("order stored");
    assert_eq!(stored.items[0].product_price, Money::from_cents(4999));
    assert_eq!(stored.total, Money::from_cents(4999));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_concurrent_checkouts_never_oversell() {
    let pool = test_pool().await;
    let product_id = create_product(&pool, 500, 3).await.id;
    let email = EmailService::disabled();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let pool = pool.clone();
        let email = email.clone();
        let user = create_user(&pool).await;
        handles.push(tokio::spawn(async move {
            CheckoutService::new(&pool, &email)
                .place_order(user, checkout_request(vec![CartLine::new(product_id, 1)]))
                .await
                .is_ok()
        }));
    }

    let mut placed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            placed += 1;
        }
    }

    assert_eq!(placed, 3);
    assert_eq!(stock_of(&pool, product_id).await, 0);
}
