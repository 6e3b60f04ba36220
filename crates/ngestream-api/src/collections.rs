//! Handlers for liked titles and the wishlist.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/likes` | Caller's liked titles, newest first |
//! | `GET`    | `/likes/{movie_id}` | Public like count |
//! | `POST`   | `/likes/{movie_id}` | 201 when added, 200 when already liked |
//! | `DELETE` | `/likes/{movie_id}` | 204, or 404 when not liked |
//! | `GET`    | `/wishlist` | Caller's wishlist, newest first |
//! | `POST`   | `/wishlist/{movie_id}` | As for likes |
//! | `DELETE` | `/wishlist/{movie_id}` | As for likes |
//! | `GET`    | `/me/titles/{movie_id}` | Like count plus the caller's flags |
//!
//! Adding and removing need a basic or premium plan. Listing does not.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use ngestream_core::{
  collection::{Collection, LikeSummary, SavedTitle, TitleStatus},
  store::CollectionStore,
};
use tracing::info;

use crate::{auth::AuthUser, error::ApiError};

fn movie_id(raw: String) -> Result<String, ApiError> {
  let id = raw.trim();
  if id.is_empty() {
    return Err(ApiError::BadRequest("movie_id is required".into()));
  }
  Ok(id.to_owned())
}

async fn add<S: CollectionStore>(
  store: &S,
  user: &AuthUser,
  collection: Collection,
  movie_id: String,
) -> Result<StatusCode, ApiError> {
  collection.check(user.tier)?;
  let added = store
    .add_title(collection, user.account.user_id, &movie_id)
    .await
    .map_err(ApiError::store)?;
  if added {
    info!(%collection, %movie_id, user_id = %user.account.user_id, "title added");
    Ok(StatusCode::CREATED)
  } else {
    Ok(StatusCode::OK)
  }
}

async fn remove<S: CollectionStore>(
  store: &S,
  user: &AuthUser,
  collection: Collection,
  movie_id: String,
) -> Result<StatusCode, ApiError> {
  collection.check(user.tier)?;
  let removed = store
    .remove_title(collection, user.account.user_id, &movie_id)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("{movie_id} is not in {collection}")));
  }
  Ok(StatusCode::NO_CONTENT)
}

async fn list<S: CollectionStore>(
  store: &S,
  user: &AuthUser,
  collection: Collection,
) -> Result<Json<Vec<SavedTitle>>, ApiError> {
  let titles = store
    .list_titles(collection, user.account.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(titles))
}

// ─── Likes ───────────────────────────────────────────────────────────────────

/// `GET /likes`
pub async fn liked<S: CollectionStore>(
  State(store): State<Arc<S>>,
  user: AuthUser,
) -> Result<Json<Vec<SavedTitle>>, ApiError> {
  list(&*store, &user, Collection::Likes).await
}

/// `GET /likes/{movie_id}`
pub async fn like_count<S: CollectionStore>(
  State(store): State<Arc<S>>,
  Path(raw): Path<String>,
) -> Result<Json<LikeSummary>, ApiError> {
  let movie_id = movie_id(raw)?;
  let likes = store.like_count(&movie_id).await.map_err(ApiError::store)?;
  Ok(Json(LikeSummary { movie_id, likes }))
}

/// `POST /likes/{movie_id}`
pub async fn like<S: CollectionStore>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
  add(&*store, &user, Collection::Likes, movie_id(raw)?).await
}

/// `DELETE /likes/{movie_id}`
pub async fn unlike<S: CollectionStore>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
  remove(&*store, &user, Collection::Likes, movie_id(raw)?).await
}

// ─── Wishlist ────────────────────────────────────────────────────────────────

/// `GET /wishlist`
pub async fn wishlist<S: CollectionStore>(
  State(store): State<Arc<S>>,
  user: AuthUser,
) -> Result<Json<Vec<SavedTitle>>, ApiError> {
  list(&*store, &user, Collection::Wishlist).await
}

/// `POST /wishlist/{movie_id}`
pub async fn wish<S: CollectionStore>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
  add(&*store, &user, Collection::Wishlist, movie_id(raw)?).await
}

/// `DELETE /wishlist/{movie_id}`
pub async fn unwish<S: CollectionStore>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
  remove(&*store, &user, Collection::Wishlist, movie_id(raw)?).await
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// `GET /me/titles/{movie_id}`
pub async fn status<S: CollectionStore>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Path(raw): Path<String>,
) -> Result<Json<TitleStatus>, ApiError> {
  let movie_id = movie_id(raw)?;
  let user_id = user.account.user_id;

  let likes = store.like_count(&movie_id).await.map_err(ApiError::store)?;
  let liked = store
    .contains_title(Collection::Likes, user_id, &movie_id)
    .await
    .map_err(ApiError::store)?;
  let wishlisted = store
    .contains_title(Collection::Wishlist, user_id, &movie_id)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(TitleStatus { movie_id, likes, liked, wishlisted }))
}
