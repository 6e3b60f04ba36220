//! Public profiles and the accounts that own them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entitlement::Tier;

/// Display data attached to rendered comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:    Uuid,
  pub full_name:  String,
  pub avatar_url: Option<String>,
}

/// Name shown for a user whose profile could not be found.
pub fn fallback_display_name(user_id: Uuid) -> String {
  let id = user_id.simple().to_string();
  format!("User {}...", &id[..8])
}

/// Upper-cased first character of `name`, used as an avatar placeholder.
pub fn initial(name: &str) -> char {
  name
    .chars()
    .find(|c| c.is_alphanumeric())
    .map(|c| c.to_uppercase().next().unwrap_or(c))
    .unwrap_or('?')
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// A sign-in identity. Only the server ever sees `password_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
  pub user_id:       Uuid,
  pub email:         String,
  /// argon2 PHC string.
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::AccountStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub password_hash: String,
  pub full_name:     String,
}

/// Partial profile update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
  pub full_name:  Option<String>,
  pub avatar_url: Option<String>,
}

/// What a signed-in user learns about themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Me {
  pub user_id:    Uuid,
  pub email:      String,
  pub full_name:  String,
  pub avatar_url: Option<String>,
  pub tier:       Tier,
}
