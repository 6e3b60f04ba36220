//! Subscription tiers and the rules that gate features on them.
//!
//! Every rule here is a pure function of a [`Tier`]. Reads are never gated;
//! only writes consult the gate. Comments need premium; likes and the
//! wishlist need any paid tier.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Tier ────────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
  #[default]
  Free,
  Basic,
  Premium,
}

impl Tier {
  /// Parse the lowercase wire/storage form.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownTier(s.to_owned()))
  }

  pub fn can_like(self) -> bool { self != Self::Free }

  pub fn can_wishlist(self) -> bool { self != Self::Free }
}

/// The comment write gate. Consulted before every mutating comment operation.
pub fn can_write(tier: Tier) -> bool { tier == Tier::Premium }

// ─── Subscription ────────────────────────────────────────────────────────────

/// A user's subscription record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub user_id:    Uuid,
  pub tier:       Tier,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
  pub expires_at: Option<DateTime<Utc>>,
}

impl Subscription {
  /// The tier that actually applies at `now`: inactive or expired
  /// subscriptions fall back to [`Tier::Free`].
  pub fn effective_tier(&self, now: DateTime<Utc>) -> Tier {
    if !self.is_active {
      return Tier::Free;
    }
    match self.expires_at {
      Some(at) if at <= now => Tier::Free,
      _ => self.tier,
    }
  }
}

/// Resolve the acting tier from an optional subscription record.
pub fn effective_tier(sub: Option<&Subscription>, now: DateTime<Utc>) -> Tier {
  sub.map_or(Tier::Free, |s| s.effective_tier(now))
}
