//! Admin order management.
//!
//! Status changes follow the order lifecycle: forward only, cancel from any
//! open state, nothing out of `DELIVERED` or `CANCELLED`. Stock is never
//! touched here.

use axum::{
    Form, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pharmacorp_core::{OrderId, OrderStatus, PaymentStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Order, OrderSummary};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    pub payment_status: String,
}

fn not_found() -> AppError {
    AppError::NotFound("Order not found".to_owned())
}

/// Orders, newest first, optionally filtered by status.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderPage>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty() && !s.eq_ignore_ascii_case("all"))
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let repo = OrderRepository::new(state.pool());
    let (orders, total) = tokio::try_join!(repo.list(status, limit, offset), repo.count(status))?;

    Ok(Json(OrderPage {
        orders,
        total,
        limit,
        offset,
    }))
}

/// One order with its items.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Move an order to a new status.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Json<Order>> {
    let next: OrderStatus = form.status.parse()?;

    let repo = OrderRepository::new(state.pool());
    let order = repo.get(id).await?.ok_or_else(not_found)?;
    let current = order.status;
    current.transition_to(next)?;

    if current == next {
        return Ok(Json(order));
    }
    Ok(Json(repo.update_status(id, current, next).await?))
}

/// Record a payment outcome.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_payment(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<PaymentForm>,
) -> Result<Json<Order>> {
    let status: PaymentStatus = form.payment_status.parse()?;
    let order = OrderRepository::new(state.pool())
        .update_payment_status(id, status)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::NotFound(_) => not_found(),
            other => other,
        })?;
    Ok(Json(order))
}
