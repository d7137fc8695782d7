//! Signed-in cart persistence.
//!
//! Requires `DATABASE_URL`. Run with: `cargo test -p pharmacorp-integration-tests -- --ignored`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use pharmacorp_core::cart::CartLine;
use pharmacorp_core::ProductId;
use pharmacorp_integration_tests::{checkout_request, create_product, create_user, test_pool};
use pharmacorp_storefront::db::ProductRepository;
use pharmacorp_storefront::services::{CartError, CartService, CheckoutService, EmailService};

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_guest_merge_adds_quantities() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let a = create_product(&pool, 1000, 100).await;
    let b = create_product(&pool, 1000, 100).await;

    let carts = CartService::new(&pool);
    carts.add_item(user, a.id, 2).await.unwrap();

    let view = carts
        .merge(
            user,
            &[
                CartLine::new(a.id, 3),
                CartLine::new(b.id, 1),
                CartLine::new(ProductId::new(i32::MAX), 4),
            ],
        )
        .await
        .unwrap();

    let quantity = |id| view.items.iter().find(|l| l.product_id == id).map(|l| l.quantity);
    assert_eq!(quantity(a.id), Some(5));
    assert_eq!(quantity(b.id), Some(1));
    assert_eq!(view.items.len(), 2);
    assert_eq!(view.item_count, 6);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_replace_with_empty_list_clears_cart() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let a = create_product(&pool, 1000, 10).await;
    let b = create_product(&pool, 1000, 10).await;

    let carts = CartService::new(&pool);
    carts
        .replace(user, &[CartLine::new(a.id, 1), CartLine::new(b.id, 2)])
        .await
        .unwrap();

    let view = carts.replace(user, &[CartLine::new(b.id, 5)]).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.item_count, 5);

    let view = carts.replace(user, &[]).await.unwrap();
    assert!(view.items.is_empty());
    assert_eq!(view.item_count, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_add_beyond_stock_is_rejected() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let product = create_product(&pool, 1000, 3).await;

    let carts = CartService::new(&pool);
    carts.add_item(user, product.id, 2).await.unwrap();

    let result = carts.add_item(user, product.id, 2).await;
    assert!(matches!(result, Err(CartError::StockExceeded(_))));

    let view = carts.view(user).await.unwrap();
    assert_eq!(view.item_count, 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_product_out_of_stock_after_last_unit_sold() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let product = create_product(&pool, 1000, 1).await;

    let email = EmailService::disabled();
    CheckoutService::new(&pool, &email)
        .place_order(user, checkout_request(vec![CartLine::new(product.id, 1)]))
        .await
        .unwrap();

    let reloaded = ProductRepository::new(&pool)
        .get(product.id)
        .await
        .unwrap()
        .expect("product exists");
    assert_eq!(reloaded.quantity, 0);
    assert!(!reloaded.in_stock());
}
