//! Cookie sessions backed by `tower-sessions`.
//!
//! Production uses [`PostgresStore`] (table `tower_sessions.session`, created
//! by migration). Router tests pass an in-memory store to [`session_layer`].

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

pub const SESSION_COOKIE_NAME: &str = "pc_session";

/// Idle time after which a session is dropped.
const SESSION_IDLE_DAYS: i64 = 7;

/// Session layer over the `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    session_layer(PostgresStore::new(pool.clone()), config)
}

/// Session layer over any store. Cookies are `Secure` when the public base
/// URL is https.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(
    store: S,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_IDLE_DAYS)))
        .with_secure(config.is_https())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
