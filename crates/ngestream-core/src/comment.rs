//! Comment rows — the flat, persisted unit of a movie's discussion.
//!
//! A comment is either a root (no `parent_id`) or a reply to another comment.
//! The nested view is never stored; it is rebuilt from these rows by
//! [`crate::tree::build_forest`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Comment ─────────────────────────────────────────────────────────────────

/// A persisted comment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         Uuid,
  /// The subject this comment belongs to (a TMDB movie or TV id).
  pub movie_id:   String,
  /// The author. Never changes after creation.
  pub user_id:    Uuid,
  pub comment:    String,
  /// `None` for a root comment.
  pub parent_id:  Option<Uuid>,
  /// Store-assigned on insert.
  pub created_at: DateTime<Utc>,
  /// Equal to `created_at` until the first edit.
  pub updated_at: DateTime<Utc>,
}

impl Comment {
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }

  /// Whether the body was changed after the comment was posted.
  pub fn is_edited(&self) -> bool { self.updated_at != self.created_at }
}

// ─── NewComment ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::CommentStore::insert`].
/// `id`, `created_at` and `updated_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
  pub user_id:   Uuid,
  pub movie_id:  String,
  pub comment:   String,
  pub parent_id: Option<Uuid>,
}

// ─── CommentPatch ────────────────────────────────────────────────────────────

/// Input to [`crate::store::CommentStore::update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPatch {
  pub comment:    String,
  pub updated_at: DateTime<Utc>,
}

// ─── Body validation ─────────────────────────────────────────────────────────

/// Trim a comment body, rejecting it if nothing is left.
pub fn normalize_body(body: &str) -> Result<String> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation("comment body is empty".into()));
  }
  Ok(trimmed.to_owned())
}
