//! JSON REST API for ngestream comments, profiles, accounts and title
//! collections.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `ngestream_core::store` traits. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ngestream_api::api_router(store.clone()))
//! ```

pub mod accounts;
pub mod auth;
pub mod collections;
pub mod comments;
pub mod error;
pub mod me;
pub mod profiles;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use ngestream_core::store::{AccountStore, CollectionStore, CommentStore, ProfileLookup};

pub use auth::AuthUser;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CommentStore + ProfileLookup + AccountStore + CollectionStore + 'static,
{
  Router::new()
    // Comments
    .route("/comments", get(comments::list::<S>).post(comments::create::<S>))
    .route(
      "/comments/{id}",
      patch(comments::edit::<S>).delete(comments::remove::<S>),
    )
    // Profiles
    .route("/profiles", get(profiles::list::<S>))
    // Accounts
    .route("/accounts", post(accounts::create::<S>))
    .route("/me", get(me::get_me::<S>))
    .route("/me/subscription", put(me::set_tier::<S>))
    .route("/me/profile", patch(me::patch_profile::<S>))
    .route("/me/titles/{movie_id}", get(collections::status::<S>))
    // Collections
    .route("/likes", get(collections::liked::<S>))
    .route(
      "/likes/{movie_id}",
      get(collections::like_count::<S>)
        .post(collections::like::<S>)
        .delete(collections::unlike::<S>),
    )
    .route("/wishlist", get(collections::wishlist::<S>))
    .route(
      "/wishlist/{movie_id}",
      post(collections::wish::<S>).delete(collections::unwish::<S>),
    )
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use ngestream_core::{
    collection::{LikeSummary, SavedTitle, TitleStatus},
    comment::Comment,
    entitlement::Tier,
    profile::Me,
  };
  use ngestream_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const PASSWORD: &str = "correct horse";

  async fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  async fn send(
    store: &Arc<SqliteStore>,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(email) = auth {
      let creds = B64.encode(format!("{email}:{PASSWORD}"));
      builder = builder.header(header::AUTHORIZATION, format!("Basic {creds}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(store.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json_body<T: serde::de::DeserializeOwned>(res: Response) -> T {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Sign up through the API and optionally upgrade the plan.
  async fn sign_up(store: &Arc<SqliteStore>, email: &str, tier: Tier) -> Uuid {
    let res = send(
      store,
      "POST",
      "/accounts",
      None,
      Some(json!({ "email": email, "password": PASSWORD, "full_name": email })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: accounts::Created = json_body(res).await;

    if tier != Tier::Free {
      let res = send(
        store,
        "PUT",
        "/me/subscription",
        Some(email),
        Some(json!({ "tier": tier })),
      )
      .await;
      assert_eq!(res.status(), StatusCode::OK);
    }
    created.user_id
  }

  async fn post_comment(
    store: &Arc<SqliteStore>,
    email: &str,
    body: &str,
    parent: Option<Uuid>,
  ) -> Response {
    send(
      store,
      "POST",
      "/comments",
      Some(email),
      Some(json!({ "movie_id": "550", "comment": body, "parent_id": parent })),
    )
    .await
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn duplicate_sign_up_conflicts() {
    let store = store().await;
    sign_up(&store, "alice@example.com", Tier::Free).await;

    let res = send(
      &store,
      "POST",
      "/accounts",
      None,
      Some(json!({ "email": "alice@example.com", "password": PASSWORD, "full_name": "A" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn short_passwords_are_rejected() {
    let store = store().await;
    let res = send(
      &store,
      "POST",
      "/accounts",
      None,
      Some(json!({ "email": "a@example.com", "password": "short", "full_name": "A" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn me_reports_effective_tier() {
    let store = store().await;
    let alice = sign_up(&store, "alice@example.com", Tier::Basic).await;

    let res = send(&store, "GET", "/me", Some("alice@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Me = json_body(res).await;
    assert_eq!(me.user_id, alice);
    assert_eq!(me.tier, Tier::Basic);
    assert_eq!(me.full_name, "alice@example.com");
  }

  #[tokio::test]
  async fn blank_profile_name_is_rejected() {
    let store = store().await;
    sign_up(&store, "alice@example.com", Tier::Free).await;

    let res = send(
      &store,
      "PATCH",
      "/me/profile",
      Some("alice@example.com"),
      Some(json!({ "full_name": "   " })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send(
      &store,
      "PATCH",
      "/me/profile",
      Some("alice@example.com"),
      Some(json!({ "full_name": " Alice L. " })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let profile: ngestream_core::profile::Profile = json_body(res).await;
    assert_eq!(profile.full_name, "Alice L.");
  }

  // ── Comment gating ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn anonymous_writes_are_unauthorized() {
    let store = store().await;
    let res = send(
      &store,
      "POST",
      "/comments",
      None,
      Some(json!({ "movie_id": "550", "comment": "hi" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));

    let res = send(&store, "DELETE", &format!("/comments/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn non_premium_writes_are_forbidden() {
    let store = store().await;
    sign_up(&store, "free@example.com", Tier::Free).await;
    sign_up(&store, "basic@example.com", Tier::Basic).await;

    for email in ["free@example.com", "basic@example.com"] {
      let res = post_comment(&store, email, "hi", None).await;
      assert_eq!(res.status(), StatusCode::FORBIDDEN);
      let body: Value = json_body(res).await;
      assert!(body["error"].as_str().unwrap().contains("premium"));
    }
  }

  #[tokio::test]
  async fn blank_comment_is_a_bad_request() {
    let store = store().await;
    sign_up(&store, "alice@example.com", Tier::Premium).await;
    let res = post_comment(&store, "alice@example.com", "   ", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  // ── Comment lifecycle ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn post_reply_and_list() {
    let store = store().await;
    sign_up(&store, "alice@example.com", Tier::Premium).await;

    let res = post_comment(&store, "alice@example.com", "  Great film ", None).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let root: Comment = json_body(res).await;
    assert_eq!(root.comment, "Great film");

    let res = post_comment(&store, "alice@example.com", "Agreed", Some(root.id)).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = send(&store, "GET", "/comments?movie_id=550", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let rows: Vec<Comment> = json_body(res).await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|c| c.parent_id == Some(root.id)));
  }

  #[tokio::test]
  async fn reply_to_unknown_parent_is_not_found() {
    let store = store().await;
    sign_up(&store, "alice@example.com", Tier::Premium).await;
    let res =
      post_comment(&store, "alice@example.com", "hello?", Some(Uuid::new_v4())).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn reply_to_parent_on_another_movie_is_not_found() {
    let store = store().await;
    sign_up(&store, "alice@example.com", Tier::Premium).await;

    let res = post_comment(&store, "alice@example.com", "Fight Club thoughts", None).await;
    let root: Comment = json_body(res).await;

    let res = send(
      &store,
      "POST",
      "/comments",
      Some("alice@example.com"),
      Some(json!({ "movie_id": "603", "comment": "wrong thread", "parent_id": root.id })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(&store, "GET", "/comments?movie_id=603", None, None).await;
    let rows: Vec<Comment> = json_body(res).await;
    assert!(rows.is_empty());
  }

  #[tokio::test]
  async fn non_owner_edit_and_delete_are_not_found() {
    let store = store().await;
    sign_up(&store, "alice@example.com", Tier::Premium).await;
    sign_up(&store, "bob@example.com", Tier::Premium).await;

    let res = post_comment(&store, "alice@example.com", "mine", None).await;
    let root: Comment = json_body(res).await;
    let uri = format!("/comments/{}", root.id);

    let res = send(
      &store,
      "PATCH",
      &uri,
      Some("bob@example.com"),
      Some(json!({ "comment": "yours now" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(&store, "DELETE", &uri, Some("bob@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(
      &store,
      "PATCH",
      &uri,
      Some("alice@example.com"),
      Some(json!({ "comment": "mine, edited" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = send(&store, "DELETE", &uri, Some("alice@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = send(&store, "GET", "/comments?movie_id=550", None, None).await;
    let rows: Vec<Comment> = json_body(res).await;
    assert!(rows.is_empty());
  }

  #[tokio::test]
  async fn profiles_lookup_skips_unknown_ids() {
    let store = store().await;
    let alice = sign_up(&store, "alice@example.com", Tier::Free).await;
    let ghost = Uuid::new_v4();

    let res = send(&store, "GET", &format!("/profiles?ids={alice},{ghost}"), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let profiles: Vec<ngestream_core::profile::Profile> = json_body(res).await;
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].user_id, alice);
  }

  // ── Collections ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn free_plan_cannot_like_or_wishlist() {
    let store = store().await;
    sign_up(&store, "free@example.com", Tier::Free).await;

    for uri in ["/likes/550", "/wishlist/550"] {
      let res = send(&store, "POST", uri, Some("free@example.com"), None).await;
      assert_eq!(res.status(), StatusCode::FORBIDDEN);
      let body: Value = json_body(res).await;
      assert!(body["error"].as_str().unwrap().contains("basic or premium"));
    }

    let res = send(&store, "POST", "/likes/550", None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Reads stay open.
    let res = send(&store, "GET", "/likes", Some("free@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn like_toggle_and_count() {
    let store = store().await;
    sign_up(&store, "alice@example.com", Tier::Basic).await;
    sign_up(&store, "bob@example.com", Tier::Premium).await;

    let res = send(&store, "POST", "/likes/550", Some("alice@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = send(&store, "POST", "/likes/550", Some("alice@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = send(&store, "POST", "/likes/550", Some("bob@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = send(&store, "GET", "/likes/550", None, None).await;
    let summary: LikeSummary = json_body(res).await;
    assert_eq!(summary.likes, 2);

    let res = send(&store, "DELETE", "/likes/550", Some("alice@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = send(&store, "DELETE", "/likes/550", Some("alice@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(&store, "GET", "/me/titles/550", Some("bob@example.com"), None).await;
    let status: TitleStatus = json_body(res).await;
    assert_eq!(status.likes, 1);
    assert!(status.liked);
    assert!(!status.wishlisted);
  }

  #[tokio::test]
  async fn wishlist_lists_only_the_callers_titles() {
    let store = store().await;
    let alice = sign_up(&store, "alice@example.com", Tier::Basic).await;
    sign_up(&store, "bob@example.com", Tier::Basic).await;

    send(&store, "POST", "/wishlist/550", Some("alice@example.com"), None).await;
    send(&store, "POST", "/wishlist/603", Some("bob@example.com"), None).await;

    let res = send(&store, "GET", "/wishlist", Some("alice@example.com"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let titles: Vec<SavedTitle> = json_body(res).await;
    assert_eq!(titles.len(), 1);
    assert_eq!(titles[0].movie_id, "550");
    assert_eq!(titles[0].user_id, alice);

    let res = send(&store, "GET", "/me/titles/550", Some("alice@example.com"), None).await;
    let status: TitleStatus = json_body(res).await;
    assert!(status.wishlisted);
    assert!(!status.liked);
  }
}
