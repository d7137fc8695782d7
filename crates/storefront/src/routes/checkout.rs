//! Checkout handler.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use pharmacorp_core::checkout::CheckoutRequest;

use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::services::CheckoutService;
use crate::state::AppState;

/// Place a cash-on-delivery order.
#[instrument(skip(state, user, body))]
pub async fn checkout(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = user.ok_or_else(|| AppError::Unauthorized("Please sign in to checkout".to_owned()))?;

    let order = CheckoutService::new(state.pool(), state.email())
        .place_order(user.id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "orderId": order.id,
            "orderNumber": order.order_number,
            "order": order,
        })),
    ))
}
