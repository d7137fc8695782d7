//! What the session remembers about a signed-in user.

use serde::{Deserialize, Serialize};

use pharmacorp_core::{Email, UserId};

/// Identity copied into the session at sign-in.
///
/// `is_admin` is a snapshot: promoting or demoting a user only takes effect
/// the next time they sign in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub is_admin: bool,
}

pub mod keys {
    pub const CURRENT_USER: &str = "current_user";
}
