//! Errors from account creation and sign-in.

use thiserror::Error;

use pharmacorp_core::EmailError;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The address failed [`pharmacorp_core::Email`] validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Unknown email or wrong password. The two are not told apart.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Carries the message shown to the user.
    #[error("{0}")]
    WeakPassword(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Argon2 could not produce or read a hash.
    #[error("password hashing failed")]
    PasswordHash,
}
