//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! pc-cli admin create -e admin@example.com -n "Admin Name" -p 'a long password'
//! pc-cli admin promote -e someone@example.com
//! ```

use thiserror::Error;

use pharmacorp_core::{Email, UserId};
use pharmacorp_storefront::db::{RepositoryError, UserRepository};
use pharmacorp_storefront::services::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Account creation failed.
    #[error("Could not create account: {0}")]
    Auth(#[from] AuthError),

    /// No account for this email.
    #[error("No account found with email: {0}")]
    UserNotFound(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Create a new admin account.
///
/// # Errors
///
/// Returns `AdminError::Auth` for an invalid email, a short password or an
/// existing account, and `AdminError::Connect` if the database is unreachable.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let pool = connect().await?;

    let user = AuthService::new(&pool)
        .create_account(email, password, Some(name), true)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

/// Grant admin access to an existing account.
///
/// Takes effect the next time the user signs in.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account uses this email.
pub async fn promote(email: &str) -> Result<UserId, AdminError> {
    let parsed = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_admin(&parsed, true)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!("Granted admin access to {} (ID: {})", user.email, user.id);
    tracing::warn!("The user must sign in again for admin access to apply.");
    Ok(user.id)
}
