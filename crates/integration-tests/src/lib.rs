//! Integration tests for PharmaCorp.
//!
//! # Running Tests
//!
//! ```bash
//! # Point at a disposable database; migrations are applied automatically
//! export DATABASE_URL=postgres://localhost/pharmacorp_test
//!
//! cargo test -p pharmacorp-integration-tests -- --ignored
//!
//! # The HTTP tests also need a running server
//! export STOREFRONT_BASE_URL=http://localhost:3000
//! ```
//!
//! # Test Categories
//!
//! - `checkout` - Stock reservation, rollback, order snapshots
//! - `cart` - Guest merge, replace, stock flags
//! - `orders` - Status updates under concurrent edits
//! - `storefront_api` - End-to-end flow over HTTP

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use pharmacorp_core::{Email, ProductId, UserId};
use pharmacorp_core::checkout::{CheckoutRequest, ShippingDetails};
use pharmacorp_core::cart::CartLine;
use pharmacorp_storefront::db::{ProductRepository, UserRepository, create_pool};
use pharmacorp_storefront::models::{NewProduct, Product};

/// Connect to `DATABASE_URL` and apply migrations.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Base URL of a running storefront server.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// A unique address so tests can share one database.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}

/// Insert a customer account.
pub async fn create_user(pool: &PgPool) -> UserId {
    let email = Email::parse(&unique_email()).expect("generated email is valid");
    UserRepository::new(pool)
        .create(&email, "not-a-real-hash", Some("Test Customer"), false)
        .await
        .expect("Failed to create test user")
        .id
}

/// Insert a product with the given price (in cents) and stock.
pub async fn create_product(pool: &PgPool, price_cents: i64, quantity: i32) -> Product {
    let product = NewProduct {
        name: format!("Test Product {}", Uuid::new_v4().simple()),
        description: "Integration test product".to_owned(),
        price: Some(Decimal::new(price_cents, 2)),
        category: "Testing".to_owned(),
        image: None,
        quantity: Some(quantity),
    }
    .validate()
    .expect("test product is valid");

    ProductRepository::new(pool)
        .create(&product)
        .await
        .expect("Failed to create test product")
}

/// Current stock of a product.
pub async fn stock_of(pool: &PgPool, id: ProductId) -> i32 {
    ProductRepository::new(pool)
        .get(id)
        .await
        .expect("Failed to load product")
        .expect("product exists")
        .quantity
}

/// Filled-in shipping form.
#[must_use]
pub fn shipping() -> ShippingDetails {
    ShippingDetails {
        name: "Test Customer".to_owned(),
        email: "customer@example.com".to_owned(),
        phone: "555-0100".to_owned(),
        address: "1 Test Street".to_owned(),
        city: "Springfield".to_owned(),
        state: "IL".to_owned(),
        zip: "62701".to_owned(),
    }
}

/// A checkout request for `items`.
#[must_use]
pub fn checkout_request(items: Vec<CartLine>) -> CheckoutRequest {
    CheckoutRequest {
        items,
        shipping: shipping(),
        notes: None,
    }
}
