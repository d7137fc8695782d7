//! Cart route handlers.
//!
//! Signed-in carts live in the database. Guests keep their cart on the
//! client and can price it with `POST /cart/lookup`; it is merged in when
//! they sign in.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use pharmacorp_core::ProductId;
use pharmacorp_core::cart::CartLine;

use crate::error::Result;
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::CartView;
use crate::services::CartService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CartItemsRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeCartRequest {
    #[serde(default)]
    pub guest_items: Vec<CartLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// The current cart. Guests get an empty one.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Json<CartView>> {
    let Some(user) = user else {
        return Ok(Json(CartView::default()));
    };
    Ok(Json(CartService::new(state.pool()).view(user.id).await?))
}

/// Replace the whole cart.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn replace(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CartItemsRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool())
        .replace(user.id, &body.items)
        .await?;
    Ok(Json(cart))
}

/// Fold a guest cart into the stored cart.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn merge(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<MergeCartRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool())
        .merge(user.id, &body.guest_items)
        .await?;
    Ok(Json(cart))
}

/// Add units of one product.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool())
        .add_item(user.id, body.product_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// Set the quantity of one line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool())
        .set_quantity(user.id, product_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove one line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    Ok(Json(cart))
}

/// Price a guest cart against live stock. Nothing is stored.
#[instrument(skip(state, body))]
pub async fn lookup(
    State(state): State<AppState>,
    Json(body): Json<CartItemsRequest>,
) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(state.pool()).lookup(&body.items).await?))
}
