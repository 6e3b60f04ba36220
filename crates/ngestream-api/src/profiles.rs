//! `GET /profiles?ids=<uuid>,<uuid>` — public display data for comment authors.

use std::{collections::BTreeSet, sync::Arc};

use axum::{
  Json,
  extract::{Query, State},
};
use ngestream_core::{profile::Profile, store::ProfileLookup};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Upper bound on ids per request.
pub const MAX_IDS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Comma-separated user ids.
  #[serde(default)]
  pub ids: String,
}

fn parse_ids(raw: &str) -> Result<BTreeSet<Uuid>, ApiError> {
  let ids = raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| {
      Uuid::parse_str(s).map_err(|_| ApiError::BadRequest(format!("invalid user id {s:?}")))
    })
    .collect::<Result<BTreeSet<_>, _>>()?;
  if ids.len() > MAX_IDS {
    return Err(ApiError::BadRequest(format!("at most {MAX_IDS} ids per request")));
  }
  Ok(ids)
}

/// Profiles sorted by user id. Unknown ids are left out.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Profile>>, ApiError>
where
  S: ProfileLookup,
{
  let ids = parse_ids(&params.ids)?;
  if ids.is_empty() {
    return Ok(Json(Vec::new()));
  }

  let mut profiles: Vec<Profile> = store
    .select_profiles(&ids)
    .await
    .map_err(ApiError::store)?
    .into_values()
    .collect();
  profiles.sort_by_key(|p| p.user_id);
  Ok(Json(profiles))
}
