//! Back-office routes under `/admin`.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin):
//! anonymous requests get 401 and signed-in customers get 403.

pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::show))
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
        .route("/orders/{id}/payment", post(orders::update_payment))
}
