//! Per-user title collections: liked titles and the wishlist.
//!
//! Both are sets of movie ids keyed by user. Adding or removing a title needs
//! a paid tier; reading a collection or a title's like count does not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};
use uuid::Uuid;

use crate::{Error, Result, entitlement::Tier};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
  Likes,
  Wishlist,
}

impl Collection {
  pub fn allows(self, tier: Tier) -> bool {
    match self {
      Self::Likes => tier.can_like(),
      Self::Wishlist => tier.can_wishlist(),
    }
  }

  /// Fail with [`Error::UpgradeRequired`] unless `tier` may change this
  /// collection.
  pub fn check(self, tier: Tier) -> Result<()> {
    if self.allows(tier) { Ok(()) } else { Err(Error::UpgradeRequired(self)) }
  }
}

/// One title in a user's collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTitle {
  pub user_id:    Uuid,
  pub movie_id:   String,
  pub created_at: DateTime<Utc>,
}

/// Public like count for a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeSummary {
  pub movie_id: String,
  pub likes:    u64,
}

/// The caller's relationship to one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleStatus {
  pub movie_id:   String,
  pub likes:      u64,
  pub liked:      bool,
  pub wishlisted: bool,
}

/// Newest first; ties broken by movie id so the order is stable.
pub fn sort_newest_first(titles: &mut [SavedTitle]) {
  titles.sort_by(|a, b| {
    b.created_at
      .cmp(&a.created_at)
      .then_with(|| a.movie_id.cmp(&b.movie_id))
  });
}
