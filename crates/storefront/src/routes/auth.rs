//! Account route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use pharmacorp_core::cart::CartLine;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthService, CartService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Cart built while signed out, folded in after sign-in.
    #[serde(default)]
    pub guest_items: Vec<CartLine>,
}

/// Create an account and sign it in.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = AuthService::new(state.pool())
        .register(&body.email, &body.password, body.name.as_deref())
        .await?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok((StatusCode::CREATED, Json(json!({ "user": current }))))
}

/// Sign in, merging any guest cart sent along.
///
/// A failed merge is logged and does not undo the sign-in; the client can
/// retry with `POST /cart/merge`.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "signed in");

    let carts = CartService::new(state.pool());
    let cart = if body.guest_items.is_empty() {
        carts.view(user.id).await
    } else {
        carts.merge(user.id, &body.guest_items).await
    };
    let cart = match cart {
        Ok(cart) => Some(cart),
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "could not load cart after sign-in");
            None
        }
    };

    Ok(Json(json!({ "user": current, "cart": cart })))
}

/// Sign out.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "success": true })))
}

/// The signed-in user, or `null`.
pub async fn me(OptionalUser(user): OptionalUser) -> Json<Value> {
    Json(json!({ "user": user }))
}
