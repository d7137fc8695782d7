//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pharmacorp_core::{Email, UserId};

use super::CurrentUser;

/// A storefront account. Admins are ordinary users with `is_admin` set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_admin: user.is_admin,
        }
    }
}
