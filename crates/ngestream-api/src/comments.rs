//! Handlers for `/comments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/comments?movie_id=<id>` | Flat rows; clients build the tree |
//! | `POST`   | `/comments` | Body: `{"movie_id":"550","comment":"…","parent_id":null}` |
//! | `PATCH`  | `/comments/{id}` | Body: `{"comment":"…"}` |
//! | `DELETE` | `/comments/{id}` | Replies are removed with it |
//!
//! Writes need a premium plan. PATCH and DELETE answer 404 both for missing
//! comments and for comments the caller did not write.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use ngestream_core::{
  comment::{Comment, CommentPatch, NewComment, normalize_body},
  entitlement::can_write,
  store::CommentStore,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
  auth::AuthUser,
  error::{ApiError, PREMIUM_REQUIRED},
};

fn require_writer(user: &AuthUser) -> Result<(), ApiError> {
  if can_write(user.tier) {
    Ok(())
  } else {
    Err(ApiError::Forbidden(PREMIUM_REQUIRED.to_owned()))
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub movie_id: String,
}

/// `GET /comments?movie_id=<id>`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: CommentStore,
{
  let comments = store
    .select(&params.movie_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(comments))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub movie_id:  String,
  pub comment:   String,
  #[serde(default)]
  pub parent_id: Option<Uuid>,
}

/// `POST /comments`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CommentStore,
{
  require_writer(&user)?;
  let comment = normalize_body(&body.comment)?;
  let movie_id = body.movie_id.trim().to_owned();
  if movie_id.is_empty() {
    return Err(ApiError::BadRequest("movie_id is required".into()));
  }

  // A reply must point at a comment on the same movie.
  if let Some(parent_id) = body.parent_id {
    let siblings = store.select(&movie_id).await.map_err(ApiError::store)?;
    if !siblings.iter().any(|c| c.id == parent_id) {
      return Err(ApiError::NotFound(format!("comment {parent_id} not found")));
    }
  }

  let created = store
    .insert(NewComment {
      user_id: user.account.user_id,
      movie_id,
      comment,
      parent_id: body.parent_id,
    })
    .await
    .map_err(ApiError::store)?;

  info!(comment_id = %created.id, user_id = %created.user_id, "comment created");
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Edit ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EditBody {
  pub comment: String,
}

/// `PATCH /comments/{id}`
pub async fn edit<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Path(id): Path<Uuid>,
  Json(body): Json<EditBody>,
) -> Result<StatusCode, ApiError>
where
  S: CommentStore,
{
  require_writer(&user)?;
  let comment = normalize_body(&body.comment)?;

  let patch = CommentPatch { comment, updated_at: Utc::now() };
  let applied = store
    .update(id, user.account.user_id, patch)
    .await
    .map_err(ApiError::store)?;
  if !applied {
    return Err(ApiError::NotFound(format!("comment {id} not found")));
  }

  info!(comment_id = %id, "comment edited");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /comments/{id}`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: CommentStore,
{
  require_writer(&user)?;

  let applied = store
    .delete(id, user.account.user_id)
    .await
    .map_err(ApiError::store)?;
  if !applied {
    return Err(ApiError::NotFound(format!("comment {id} not found")));
  }

  info!(comment_id = %id, "comment deleted");
  Ok(StatusCode::NO_CONTENT)
}
