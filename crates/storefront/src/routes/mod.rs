//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database reachable)
//!
//! # Auth
//! POST /auth/register          - Create account and sign in
//! POST /auth/login             - Sign in, merging `guestItems`
//! POST /auth/logout            - Sign out
//! GET  /auth/me                - Current user or null
//!
//! # Products
//! GET  /products               - Listing (?sort, ?category, ?in_stock)
//! GET  /products/categories    - Distinct categories
//! GET  /products/{id}          - Detail
//!
//! # Cart
//! GET    /cart                 - Current cart (empty for guests)
//! PUT    /cart                 - Replace cart
//! POST   /cart/merge           - Merge a guest cart
//! POST   /cart/items           - Add units (stock checked)
//! PATCH  /cart/items/{id}      - Set quantity (0 removes)
//! DELETE /cart/items/{id}      - Remove line
//! POST   /cart/lookup          - Price a guest cart, nothing stored
//!
//! # Orders
//! POST /checkout               - Place order (sign-in required)
//! GET  /orders                 - Order history
//! GET  /orders/{id}            - Order detail (owner only)
//!
//! # Contact
//! POST /contact                - Forward a message to the shop
//!
//! # Admin (see `admin`)
//! /admin/...
//! ```
//!
//! The session layer is not applied here; the binary adds it (with the
//! `PostgreSQL` store) and tests add it with an in-memory store.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/categories", get(products::categories))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).put(cart::replace))
        .route("/merge", post(cart::merge))
        .route("/items", post(cart::add))
        .route("/items/{product_id}", patch(cart::update).delete(cart::remove))
        .route("/lookup", post(cart::lookup))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .nest("/orders", order_routes())
        .route("/contact", post(contact::submit))
        .nest("/admin", admin::admin_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Json,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, Session};

    use pharmacorp_core::{Email, UserId};

    use super::*;
    use crate::config::tests::test_config;
    use crate::middleware::{session_layer, set_current_user};
    use crate::models::CurrentUser;
    use crate::services::EmailService;

    /// Sign in whoever is posted. Test-only; real sign-in needs the database.
    async fn sign_in_as(session: Session, Json(user): Json<CurrentUser>) -> StatusCode {
        set_current_user(&session, &user).await.unwrap();
        StatusCode::NO_CONTENT
    }

    fn app() -> Router {
        let config = test_config();
        // Never connects: every request below resolves before a query runs.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pharmacorp_test")
            .unwrap();
        let state = AppState::with_email(config.clone(), pool, EmailService::disabled());

        routes()
            .route("/test/sign-in", post(sign_in_as))
            .layer(session_layer(MemoryStore::default(), &config))
            .with_state(state)
    }

    fn customer(is_admin: bool) -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            email: Email::parse("customer@example.com").unwrap(),
            name: Some("Casey".into()),
            is_admin,
        }
    }

    async fn cookie_for(app: &Router, user: &CurrentUser) -> String {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/test/sign-in", None, &json!(user)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_owned()
    }

    fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn valid_shipping() -> Value {
        json!({
            "name": "Casey Jones",
            "email": "casey@example.com",
            "phone": "555-0100",
            "address": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "zip": "62701"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(empty_request("GET", "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_guest_cart_is_empty() {
        let response = app()
            .oneshot(empty_request("GET", "/cart", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["items"], json!([]));
        assert_eq!(body["itemCount"], 0);
    }

    #[tokio::test]
    async fn test_me_without_session_is_null() {
        let response = app()
            .oneshot(empty_request("GET", "/auth/me", None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["user"], Value::Null);
    }

    #[tokio::test]
    async fn test_me_reports_signed_in_user() {
        let app = app();
        let cookie = cookie_for(&app, &customer(false)).await;
        let response = app
            .oneshot(empty_request("GET", "/auth/me", Some(&cookie)))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["user"]["email"], "customer@example.com");
        assert_eq!(body["user"]["isAdmin"], false);
    }

    #[tokio::test]
    async fn test_checkout_requires_sign_in() {
        let body = json!({ "items": [{ "productId": 1, "quantity": 1 }], "shipping": valid_shipping() });
        let response = app()
            .oneshot(json_request("POST", "/checkout", None, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Please sign in to checkout");
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let app = app();
        let cookie = cookie_for(&app, &customer(false)).await;
        let body = json!({ "items": [], "shipping": valid_shipping() });
        let response = app
            .oneshot(json_request("POST", "/checkout", Some(&cookie), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Cart is empty");
    }

    #[tokio::test]
    async fn test_checkout_rejects_missing_shipping() {
        let app = app();
        let cookie = cookie_for(&app, &customer(false)).await;
        let body = json!({
            "items": [{ "productId": 1, "quantity": 2 }],
            "shipping": { "name": "Casey Jones", "email": "casey@example.com" }
        });
        let response = app
            .oneshot(json_request("POST", "/checkout", Some(&cookie), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "Please fill in all shipping details"
        );
    }

    #[tokio::test]
    async fn test_cart_writes_require_sign_in() {
        let app = app();
        let requests = [
            json_request("PUT", "/cart", None, &json!({ "items": [] })),
            json_request("POST", "/cart/merge", None, &json!({ "guestItems": [] })),
            json_request("POST", "/cart/items", None, &json!({ "productId": 1 })),
            json_request("PATCH", "/cart/items/1", None, &json!({ "quantity": 2 })),
            empty_request("DELETE", "/cart/items/1", None),
            empty_request("GET", "/orders", None),
        ];
        for request in requests {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_cart_rejects_bad_quantities() {
        let app = app();
        let cookie = cookie_for(&app, &customer(false)).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/cart/items",
                Some(&cookie),
                &json!({ "productId": 1, "quantity": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(json_request(
                "PATCH",
                "/cart/items/1",
                Some(&cookie),
                &json!({ "quantity": -1 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_requires_sign_in() {
        let response = app()
            .oneshot(empty_request("GET", "/admin/dashboard", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_forbids_customers() {
        let app = app();
        let cookie = cookie_for(&app, &customer(false)).await;
        for uri in ["/admin/dashboard", "/admin/products", "/admin/orders"] {
            let response = app
                .clone()
                .oneshot(empty_request("GET", uri, Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(json_body(response).await["error"], "Admin access required");
        }
    }

    #[tokio::test]
    async fn test_admin_product_create_validates() {
        let app = app();
        let cookie = cookie_for(&app, &customer(true)).await;
        let response = app
            .oneshot(json_request(
                "POST",
                "/admin/products",
                Some(&cookie),
                &json!({ "name": "NeuroCalm", "price": "42.99" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn test_admin_status_rejects_unknown_status() {
        let app = app();
        let cookie = cookie_for(&app, &customer(true)).await;
        let request = Request::builder()
            .method("POST")
            .uri("/admin/orders/1/status")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, &cookie)
            .body(Body::from("status=LOST"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_order_list_rejects_unknown_status() {
        let app = app();
        let cookie = cookie_for(&app, &customer(true)).await;
        let response = app
            .oneshot(empty_request("GET", "/admin/orders?status=LOST", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/auth/register",
                None,
                &json!({ "email": "new@example.com", "password": "short" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "Password must be at least 8 characters"
        );
    }

    #[tokio::test]
    async fn test_contact_requires_all_fields() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/contact",
                None,
                &json!({ "firstName": "Ada", "email": "ada@example.com" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "All fields are required");
    }

    #[tokio::test]
    async fn test_contact_without_email_configured() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/contact",
                None,
                &json!({
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "email": "ada@example.com",
                    "subject": "Stock question",
                    "message": "When is VitaWell back?"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let app = app();
        let cookie = cookie_for(&app, &customer(false)).await;
        let response = app
            .clone()
            .oneshot(empty_request("POST", "/auth/logout", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(empty_request("GET", "/orders", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
