//! Shared handler state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{EmailError, EmailService};

/// Config, database pool and mail sender, behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    shared: Arc<Shared>,
}

struct Shared {
    config: StorefrontConfig,
    pool: PgPool,
    email: EmailService,
}

impl AppState {
    /// Build state from configuration, creating the mail sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the Resend client cannot be built from
    /// `RESEND_API_KEY`.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, EmailError> {
        let email = EmailService::new(&config.email)?;
        if email.is_enabled() {
            tracing::info!(from = %config.email.from, "email delivery enabled");
        } else {
            tracing::warn!("RESEND_API_KEY not set, order and contact emails are disabled");
        }
        Ok(Self::with_email(config, pool, email))
    }

    /// Build state around an existing mail sender (tests use
    /// [`EmailService::disabled`]).
    #[must_use]
    pub fn with_email(config: StorefrontConfig, pool: PgPool, email: EmailService) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                pool,
                email,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.shared.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.shared.pool
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.shared.email
    }
}
