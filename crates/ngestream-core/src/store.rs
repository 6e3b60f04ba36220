//! Store traits consumed by the comment engine and the API.
//!
//! The traits are implemented by storage backends (`ngestream-store-sqlite`)
//! and by remote clients (the terminal client's HTTP client). Higher layers
//! depend on these abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{
  collections::{BTreeSet, HashMap},
  future::Future,
};

use uuid::Uuid;

use crate::{
  collection::{Collection, SavedTitle},
  comment::{Comment, CommentPatch, NewComment},
  entitlement::{Subscription, Tier},
  profile::{Account, NewAccount, Profile, ProfilePatch},
};

// ─── Backend ─────────────────────────────────────────────────────────────────

/// The error type shared by every store trait a backend implements, so that a
/// type implementing several of them exposes a single `Error`.
pub trait StoreBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// Flat comment persistence.
///
/// `update` and `delete` are scoped by both the comment id and the acting
/// user; they report `false` when no row matched, which is how a store
/// rejects a non-author. Whether `delete` also removes replies is up to the
/// backend.
pub trait CommentStore: StoreBackend {
  /// All comments for `movie_id`, in no particular order.
  fn select<'a>(
    &'a self,
    movie_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + 'a;

  /// Persist a new comment. The store assigns `id` and both timestamps.
  fn insert(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Replace the body of `id` if it belongs to `acting_user`.
  fn update(
    &self,
    id: Uuid,
    acting_user: Uuid,
    patch: CommentPatch,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete `id` if it belongs to `acting_user`.
  fn delete(
    &self,
    id: Uuid,
    acting_user: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// Display-name and avatar lookup for comment authors.
pub trait ProfileLookup: StoreBackend {
  /// Profiles for the given users. Users without a profile are simply
  /// absent from the returned map.
  fn select_profiles<'a>(
    &'a self,
    user_ids: &'a BTreeSet<Uuid>,
  ) -> impl Future<Output = Result<HashMap<Uuid, Profile>, Self::Error>> + Send + 'a;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Server-side account, profile, and subscription management.
pub trait AccountStore: StoreBackend {
  /// Create an account together with its profile and a `free` subscription.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Look up an account by (case-insensitive) email.
  fn find_account_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Apply `patch` to a profile. Returns `None` if the user has no profile.
  fn update_profile(
    &self,
    user_id: Uuid,
    patch: ProfilePatch,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn get_subscription(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Switch a user to `tier`, activating the subscription.
  fn set_subscription_tier(
    &self,
    user_id: Uuid,
    tier: Tier,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;
}

// ─── Collections ─────────────────────────────────────────────────────────────

/// Per-user liked titles and wishlists.
pub trait CollectionStore: StoreBackend {
  /// Add `movie_id` to the user's collection. `false` if it was already there.
  fn add_title<'a>(
    &'a self,
    collection: Collection,
    user_id: Uuid,
    movie_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Remove `movie_id` from the user's collection. `false` if it was absent.
  fn remove_title<'a>(
    &'a self,
    collection: Collection,
    user_id: Uuid,
    movie_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn contains_title<'a>(
    &'a self,
    collection: Collection,
    user_id: Uuid,
    movie_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// The user's titles, newest first.
  fn list_titles(
    &self,
    collection: Collection,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SavedTitle>, Self::Error>> + Send + '_;

  /// How many users like `movie_id`.
  fn like_count<'a>(
    &'a self,
    movie_id: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}
