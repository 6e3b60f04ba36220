//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! tiers their lowercase names.

use chrono::{DateTime, Utc};
use ngestream_core::{
  collection::{Collection, SavedTitle},
  comment::Comment,
  entitlement::{Subscription, Tier},
  profile::{Account, Profile},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tier ────────────────────────────────────────────────────────────────────

pub fn encode_tier(tier: Tier) -> String { tier.as_ref().to_owned() }

pub fn decode_tier(s: &str) -> Result<Tier> { Ok(Tier::parse(s)?) }

// ─── Collection ──────────────────────────────────────────────────────────────

/// Table backing each collection.
pub fn collection_table(collection: Collection) -> &'static str {
  match collection {
    Collection::Likes => "likes",
    Collection::Wishlist => "wishlists",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub id:         String,
  pub movie_id:   String,
  pub user_id:    String,
  pub comment:    String,
  pub parent_id:  Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawComment {
  pub const COLUMNS: &'static str =
    "id, movie_id, user_id, comment, parent_id, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      movie_id:   row.get(1)?,
      user_id:    row.get(2)?,
      comment:    row.get(3)?,
      parent_id:  row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:         decode_uuid(&self.id)?,
      movie_id:   self.movie_id,
      user_id:    decode_uuid(&self.user_id)?,
      comment:    self.comment,
      parent_id:  self.parent_id.as_deref().map(decode_uuid).transpose()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `user_profiles` row.
pub struct RawProfile {
  pub user_id:    String,
  pub full_name:  String,
  pub avatar_url: Option<String>,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      user_id:    decode_uuid(&self.user_id)?,
      full_name:  self.full_name,
      avatar_url: self.avatar_url,
    })
  }
}

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub user_id:    String,
  pub tier:       String,
  pub is_active:  bool,
  pub created_at: String,
  pub expires_at: Option<String>,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      tier:       row.get(1)?,
      is_active:  row.get(2)?,
      created_at: row.get(3)?,
      expires_at: row.get(4)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      user_id:    decode_uuid(&self.user_id)?,
      tier:       decode_tier(&self.tier)?,
      is_active:  self.is_active,
      created_at: decode_dt(&self.created_at)?,
      expires_at: self.expires_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read from a `likes` or `wishlists` row.
pub struct RawSavedTitle {
  pub user_id:    String,
  pub movie_id:   String,
  pub created_at: String,
}

impl RawSavedTitle {
  pub fn into_saved_title(self) -> Result<SavedTitle> {
    Ok(SavedTitle {
      user_id:    decode_uuid(&self.user_id)?,
      movie_id:   self.movie_id,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
