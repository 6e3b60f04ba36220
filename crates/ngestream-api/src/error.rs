//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub(crate) const PREMIUM_REQUIRED: &str = "commenting requires a premium subscription";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// Missing or invalid credentials.
  #[error("unauthorized")]
  Unauthorized,

  /// Authenticated, but the plan does not allow this.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<ngestream_core::Error> for ApiError {
  fn from(e: ngestream_core::Error) -> Self {
    use ngestream_core::Error as Core;
    match e {
      Core::Validation(m) => Self::BadRequest(m),
      Core::UnknownTier(t) => Self::BadRequest(format!("unknown tier {t:?}")),
      Core::PermissionDenied => Self::Forbidden(PREMIUM_REQUIRED.to_owned()),
      upgrade @ Core::UpgradeRequired(_) => Self::Forbidden(upgrade.to_string()),
      Core::NotAuthorOfComment(id) | Core::CommentNotFound(id) => {
        Self::NotFound(format!("comment {id} not found"))
      }
      other @ (Core::Store(_) | Core::Timeout(_)) => Self::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"ngestream\""),
      );
    }
    res
  }
}
