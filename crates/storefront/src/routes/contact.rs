//! Contact form.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::instrument;

use pharmacorp_core::Email;

use crate::error::{AppError, Result};
use crate::services::ContactMessage;
use crate::state::AppState;

/// Forward a contact-form message to the shop inbox.
#[instrument(skip(state, message))]
pub async fn submit(
    State(state): State<AppState>,
    Json(message): Json<ContactMessage>,
) -> Result<Json<Value>> {
    let message = validate(message)?;
    state.email().send_contact(&message).await?;
    tracing::info!(subject = %message.subject, "contact message forwarded");
    Ok(Json(json!({ "success": true })))
}

fn validate(message: ContactMessage) -> Result<ContactMessage> {
    let trimmed = ContactMessage {
        first_name: message.first_name.trim().to_owned(),
        last_name: message.last_name.trim().to_owned(),
        email: message.email.trim().to_owned(),
        subject: message.subject.trim().to_owned(),
        message: message.message.trim().to_owned(),
    };
    let fields = [
        &trimmed.first_name,
        &trimmed.last_name,
        &trimmed.email,
        &trimmed.subject,
        &trimmed.message,
    ];
    if fields.iter().any(|field| field.is_empty()) {
        return Err(AppError::BadRequest("All fields are required".to_owned()));
    }
    Email::parse(&trimmed.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_owned()))?;
    Ok(trimmed)
}
