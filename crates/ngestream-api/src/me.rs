//! Handlers for the caller's own account.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/me` | Identity, profile and effective tier |
//! | `PUT`   | `/me/subscription` | Body: `{"tier":"premium"}` |
//! | `PATCH` | `/me/profile` | Body: `{"full_name":"…","avatar_url":"…"}`, both optional |

use std::{collections::BTreeSet, sync::Arc};

use axum::{Json, extract::State};
use ngestream_core::{
  entitlement::{Subscription, Tier},
  profile::{Me, Profile, ProfilePatch, fallback_display_name},
  store::{AccountStore, ProfileLookup},
};
use serde::Deserialize;
use tracing::info;

use crate::{auth::AuthUser, error::ApiError};

/// `GET /me`
pub async fn get_me<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
) -> Result<Json<Me>, ApiError>
where
  S: ProfileLookup,
{
  let user_id = user.account.user_id;
  let profile = store
    .select_profiles(&BTreeSet::from([user_id]))
    .await
    .map_err(ApiError::store)?
    .remove(&user_id);

  let (full_name, avatar_url) = match profile {
    Some(p) => (p.full_name, p.avatar_url),
    None => (fallback_display_name(user_id), None),
  };
  Ok(Json(Me {
    user_id,
    email: user.account.email,
    full_name,
    avatar_url,
    tier: user.tier,
  }))
}

#[derive(Debug, Deserialize)]
pub struct TierBody {
  pub tier: Tier,
}

/// `PUT /me/subscription`
pub async fn set_tier<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Json(body): Json<TierBody>,
) -> Result<Json<Subscription>, ApiError>
where
  S: AccountStore,
{
  let sub = store
    .set_subscription_tier(user.account.user_id, body.tier)
    .await
    .map_err(ApiError::store)?;
  info!(user_id = %sub.user_id, tier = %sub.tier, "plan changed");
  Ok(Json(sub))
}

/// `PATCH /me/profile`
pub async fn patch_profile<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Json(mut patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, ApiError>
where
  S: AccountStore,
{
  if let Some(name) = patch.full_name.as_mut() {
    *name = name.trim().to_owned();
    if name.is_empty() {
      return Err(ApiError::BadRequest("full_name cannot be blank".into()));
    }
  }

  let user_id = user.account.user_id;
  let profile = store
    .update_profile(user_id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile for {user_id} not found")))?;
  Ok(Json(profile))
}
