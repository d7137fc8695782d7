//! Public catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use pharmacorp_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::{Product, ProductQuery};
use crate::state::AppState;

/// Product listing with optional sort, category and stock filters.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list(&query).await?;
    Ok(Json(products))
}

/// Distinct categories.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}
