//! End-to-end storefront flow over HTTP.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database with the sample catalog (`pc-cli seed products`)
//! - The storefront running (`cargo run -p pharmacorp-storefront`)
//!
//! Run with: `cargo test -p pharmacorp-integration-tests -- --ignored`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use pharmacorp_integration_tests::{shipping, storefront_base_url, unique_email};

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", storefront_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_register_merge_and_checkout() {
    let base = storefront_base_url();
    let client = client();

    let products: Value = client
        .get(format!("{base}/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let product_id = products
        .as_array()
        .and_then(|list| list.iter().find(|p| p["inStock"] == json!(true)))
        .map(|p| p["id"].clone())
        .expect("catalog has a product in stock");

    let email = unique_email();
    let resp = client
        .post(format!("{base}/auth/register"))
        .json(&json!({ "email": email, "password": "correct horse", "name": "Test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base}/auth/login"))
        .json(&json!({
            "email": email,
            "password": "correct horse",
            "guestItems": [{ "productId": product_id, "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["cart"]["itemCount"], json!(1));

    let resp = client
        .post(format!("{base}/checkout"))
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": 1 }],
            "shipping": shipping(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], json!(true));

    let cart: Value = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], json!(0));
}
