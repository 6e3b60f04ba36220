//! Async HTTP client wrapping the ngestream JSON API.
//!
//! [`ApiClient`] implements the core store traits, so a
//! [`ngestream_core::CommentThread`] can run against a remote server exactly
//! as it would against a local store.

use std::{
  collections::{BTreeSet, HashMap},
  time::Duration,
};

use ngestream_core::{
  comment::{Comment, CommentPatch, NewComment},
  profile::{Me, Profile},
  store::{CommentStore, ProfileLookup, StoreBackend},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Ids per `/profiles` request.
const PROFILE_CHUNK: usize = 100;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {path} → {status}: {message}")]
  Status {
    method:  &'static str,
    path:    String,
    status:  StatusCode,
    message: String,
  },
}

/// Connection settings for the ngestream API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

impl ApiConfig {
  pub fn has_credentials(&self) -> bool { !self.username.is_empty() }
}

/// Async HTTP client for the ngestream JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.has_credentials() {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    } else {
      req
    }
  }

  /// Turn a non-success response into [`ClientError::Status`], using the
  /// server's `{"error": …}` body as the message when there is one.
  async fn check(
    method: &'static str,
    path: &str,
    resp: Response,
  ) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
      .map(|b| b.error)
      .unwrap_or(text);
    Err(ClientError::Status { method, path: path.to_owned(), status, message })
  }

  /// `GET /api/me`. `None` when no credentials are configured.
  pub async fn me(&self) -> Result<Option<Me>, ClientError> {
    if !self.config.has_credentials() {
      return Ok(None);
    }
    let resp = self.auth(self.client.get(self.url("/me"))).send().await?;
    let resp = Self::check("GET", "/me", resp).await?;
    Ok(Some(resp.json().await?))
  }

  /// Shared by PATCH and DELETE: 204 means applied, 404 means the comment is
  /// missing or not ours.
  async fn applied(
    method: &'static str,
    path: &str,
    resp: Response,
  ) -> Result<bool, ClientError> {
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    Self::check(method, path, resp).await?;
    Ok(true)
  }
}

impl StoreBackend for ApiClient {
  type Error = ClientError;
}

// ─── Comments ────────────────────────────────────────────────────────────────

impl CommentStore for ApiClient {
  /// `GET /api/comments?movie_id=<id>`
  async fn select(&self, movie_id: &str) -> Result<Vec<Comment>, ClientError> {
    let resp = self
      .client
      .get(self.url("/comments"))
      .query(&[("movie_id", movie_id)])
      .send()
      .await?;
    let resp = Self::check("GET", "/comments", resp).await?;
    Ok(resp.json().await?)
  }

  /// `POST /api/comments`. The server takes the author from the credentials.
  async fn insert(&self, input: NewComment) -> Result<Comment, ClientError> {
    let body = json!({
      "movie_id":  input.movie_id,
      "comment":   input.comment,
      "parent_id": input.parent_id,
    });
    let resp = self
      .auth(self.client.post(self.url("/comments")))
      .json(&body)
      .send()
      .await?;
    let resp = Self::check("POST", "/comments", resp).await?;
    Ok(resp.json().await?)
  }

  /// `PATCH /api/comments/{id}`. The server stamps `updated_at` itself.
  async fn update(
    &self,
    id: Uuid,
    _acting_user: Uuid,
    patch: CommentPatch,
  ) -> Result<bool, ClientError> {
    let path = format!("/comments/{id}");
    let resp = self
      .auth(self.client.patch(self.url(&path)))
      .json(&json!({ "comment": patch.comment }))
      .send()
      .await?;
    Self::applied("PATCH", &path, resp).await
  }

  /// `DELETE /api/comments/{id}`
  async fn delete(&self, id: Uuid, _acting_user: Uuid) -> Result<bool, ClientError> {
    let path = format!("/comments/{id}");
    let resp = self.auth(self.client.delete(self.url(&path))).send().await?;
    Self::applied("DELETE", &path, resp).await
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

impl ProfileLookup for ApiClient {
  /// `GET /api/profiles?ids=<a>,<b>,…`, batched.
  async fn select_profiles(
    &self,
    user_ids: &BTreeSet<Uuid>,
  ) -> Result<HashMap<Uuid, Profile>, ClientError> {
    let ids: Vec<Uuid> = user_ids.iter().copied().collect();
    let mut out = HashMap::with_capacity(ids.len());

    for chunk in ids.chunks(PROFILE_CHUNK) {
      let joined = chunk
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
      let resp = self
        .client
        .get(self.url("/profiles"))
        .query(&[("ids", joined)])
        .send()
        .await?;
      let resp = Self::check("GET", "/profiles", resp).await?;
      let profiles: Vec<Profile> = resp.json().await?;
      out.extend(profiles.into_iter().map(|p| (p.user_id, p)));
    }
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base_url: &str) -> ApiClient {
    ApiClient::new(ApiConfig {
      base_url: base_url.into(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap()
  }

  #[test]
  fn urls_are_rooted_under_api() {
    assert_eq!(
      client("http://localhost:8080/").url("/comments"),
      "http://localhost:8080/api/comments"
    );
    assert_eq!(client("http://h").url("/me"), "http://h/api/me");
  }

  #[tokio::test]
  async fn anonymous_client_has_no_identity() {
    let c = client("http://localhost:1");
    assert!(!c.config.has_credentials());
    assert!(c.me().await.unwrap().is_none());
  }
}
