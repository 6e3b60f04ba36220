//! Error types for `ngestream-core`.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::collection::Collection;

#[derive(Debug, Error)]
pub enum Error {
  /// Rejected before any store call, e.g. an empty body.
  #[error("invalid input: {0}")]
  Validation(String),

  /// The viewer's tier does not allow writing, or there is no viewer.
  #[error("permission denied: a premium subscription is required")]
  PermissionDenied,

  #[error("comment {0} was not written by the current user")]
  NotAuthorOfComment(Uuid),

  #[error("comment not found: {0}")]
  CommentNotFound(Uuid),

  /// Likes and wishlists need a paid tier.
  #[error("upgrade to basic or premium to use {0}")]
  UpgradeRequired(Collection),

  #[error("unknown subscription tier: {0:?}")]
  UnknownTier(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store call timed out after {0:?}")]
  Timeout(Duration),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Whether this came from talking to a store rather than from a local
  /// precondition. Store failures are retryable by refreshing.
  pub fn is_store_failure(&self) -> bool {
    matches!(self, Self::Store(_) | Self::Timeout(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
