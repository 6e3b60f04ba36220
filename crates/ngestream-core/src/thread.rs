//! [`CommentThread`] — one movie's discussion as seen by one viewer.
//!
//! The thread is the single source of truth the rendering layer reads from
//! and mutates through. Every mutation follows the same protocol: check the
//! entitlement gate, validate input, write to the store, then resynchronize
//! the whole forest. The in-memory forest is never patched locally, so a
//! failed write leaves exactly what was displayed before.
//!
//! Operations take `&mut self`, so at most one is in flight per thread.
//! Dropping an in-flight future discards its result without touching state.

use std::{
  collections::{BTreeSet, HashMap, HashSet},
  future::Future,
  time::Duration,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  comment::{Comment, CommentPatch, NewComment, normalize_body},
  entitlement::{Tier, can_write},
  focus::InteractionFocus,
  profile::{Profile, fallback_display_name},
  store::{CommentStore, ProfileLookup},
  tree::{self, CommentNode},
};

/// Upper bound on any single store call made by a thread.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The signed-in user looking at a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
  pub user_id: Uuid,
  pub tier:    Tier,
}

// ─── CommentThread ───────────────────────────────────────────────────────────

pub struct CommentThread<S> {
  store:    S,
  movie_id: String,
  viewer:   Option<Viewer>,
  forest:   Vec<CommentNode>,
  profiles: HashMap<Uuid, Profile>,
  focus:    InteractionFocus,
  expanded: HashSet<Uuid>,
  timeout:  Duration,
  /// Set when the last synchronize failed; the forest may be out of date.
  stale:    bool,
}

impl<S> CommentThread<S>
where
  S: CommentStore + ProfileLookup,
{
  /// An empty thread; call [`Self::synchronize`] to load it.
  pub fn new(store: S, movie_id: impl Into<String>, viewer: Option<Viewer>) -> Self {
    Self {
      store,
      movie_id: movie_id.into(),
      viewer,
      forest: Vec::new(),
      profiles: HashMap::new(),
      focus: InteractionFocus::None,
      expanded: HashSet::new(),
      timeout: DEFAULT_TIMEOUT,
      stale: false,
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn movie_id(&self) -> &str { &self.movie_id }

  pub fn viewer(&self) -> Option<Viewer> { self.viewer }

  pub fn forest(&self) -> &[CommentNode] { &self.forest }

  pub fn focus(&self) -> InteractionFocus { self.focus }

  pub fn is_stale(&self) -> bool { self.stale }

  /// Roots plus every reply, for the section header.
  pub fn total_comments(&self) -> usize { tree::total_comments(&self.forest) }

  /// Nodes in display order, skipping replies of collapsed nodes.
  pub fn visible(&self) -> Vec<(usize, &CommentNode)> {
    tree::walk_visible(&self.forest, |n| self.expanded.contains(&n.comment.id))
      .collect()
  }

  pub fn find(&self, id: Uuid) -> Option<&CommentNode> { tree::find(&self.forest, id) }

  pub fn profile(&self, user_id: Uuid) -> Option<&Profile> { self.profiles.get(&user_id) }

  pub fn display_name(&self, user_id: Uuid) -> String {
    self
      .profile(user_id)
      .map(|p| p.full_name.trim())
      .filter(|name| !name.is_empty())
      .map(str::to_owned)
      .unwrap_or_else(|| fallback_display_name(user_id))
  }

  pub fn avatar_url(&self, user_id: Uuid) -> Option<&str> {
    self.profile(user_id).and_then(|p| p.avatar_url.as_deref())
  }

  /// Whether the viewer passes the comment write gate.
  pub fn can_write(&self) -> bool { self.viewer.is_some_and(|v| can_write(v.tier)) }

  pub fn is_author(&self, comment: &Comment) -> bool {
    self.viewer.is_some_and(|v| v.user_id == comment.user_id)
  }

  // ── Sync ──────────────────────────────────────────────────────────────────

  /// Re-fetch every row and profile and rebuild the forest.
  ///
  /// The forest and profile cache are replaced together, and only when both
  /// fetches succeed; on failure the previous state is kept.
  pub async fn synchronize(&mut self) -> Result<()> {
    match self.fetch().await {
      Ok((forest, profiles)) => {
        self.forest = forest;
        self.profiles = profiles;
        self.stale = false;
        self.prune_interaction_state();
        Ok(())
      }
      Err(e) => {
        warn!(movie_id = %self.movie_id, error = %e, "comment sync failed");
        self.stale = true;
        Err(e)
      }
    }
  }

  async fn fetch(&self) -> Result<(Vec<CommentNode>, HashMap<Uuid, Profile>)> {
    let rows = bounded(self.timeout, self.store.select(&self.movie_id)).await?;

    let user_ids: BTreeSet<Uuid> = rows.iter().map(|c| c.user_id).collect();
    let profiles = if user_ids.is_empty() {
      HashMap::new()
    } else {
      bounded(self.timeout, self.store.select_profiles(&user_ids)).await?
    };

    debug!(
      movie_id = %self.movie_id,
      rows = rows.len(),
      profiles = profiles.len(),
      "fetched comments"
    );
    Ok((tree::build_forest(rows), profiles))
  }

  /// Resync after a successful write. A failure here is already logged and
  /// recorded as staleness; the write itself still succeeded.
  async fn resync(&mut self) { self.synchronize().await.ok(); }

  /// Drop focus and expansion entries for comments that no longer exist.
  fn prune_interaction_state(&mut self) {
    let present: HashSet<Uuid> =
      tree::walk(&self.forest).map(|(_, n)| n.comment.id).collect();
    self.expanded.retain(|id| present.contains(id));
    if let Some(id) = self.focus.target()
      && !present.contains(&id)
    {
      self.focus = InteractionFocus::None;
    }
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Post a new top-level comment.
  pub async fn submit_root(&mut self, body: &str) -> Result<Comment> {
    let viewer = self.writer()?;
    let comment = normalize_body(body)?;

    let input = NewComment {
      user_id: viewer.user_id,
      movie_id: self.movie_id.clone(),
      comment,
      parent_id: None,
    };
    let created = bounded(self.timeout, self.store.insert(input)).await?;
    info!(comment_id = %created.id, movie_id = %self.movie_id, "posted comment");

    self.resync().await;
    Ok(created)
  }

  /// Reply to `parent_id`. On success the parent and its ancestors are
  /// expanded so the new reply is visible.
  pub async fn submit_reply(&mut self, parent_id: Uuid, body: &str) -> Result<Comment> {
    let viewer = self.writer()?;
    let comment = normalize_body(body)?;
    if self.find(parent_id).is_none() {
      return Err(Error::CommentNotFound(parent_id));
    }

    let input = NewComment {
      user_id: viewer.user_id,
      movie_id: self.movie_id.clone(),
      comment,
      parent_id: Some(parent_id),
    };
    let created = bounded(self.timeout, self.store.insert(input)).await?;
    info!(
      comment_id = %created.id,
      parent_id = %parent_id,
      movie_id = %self.movie_id,
      "posted reply"
    );

    if self.focus.replying().is_some() {
      self.focus = InteractionFocus::None;
    }
    self.resync().await;
    self.reveal(parent_id);
    Ok(created)
  }

  /// Replace the body of one of the viewer's own comments.
  pub async fn edit(&mut self, comment_id: Uuid, body: &str) -> Result<()> {
    let viewer = self.writer()?;
    let comment = normalize_body(body)?;
    self.check_author(comment_id, viewer)?;

    let patch = CommentPatch { comment, updated_at: Utc::now() };
    let applied = bounded(
      self.timeout,
      self.store.update(comment_id, viewer.user_id, patch),
    )
    .await?;
    if !applied {
      warn!(comment_id = %comment_id, "store rejected comment update");
      return Err(Error::NotAuthorOfComment(comment_id));
    }
    info!(comment_id = %comment_id, "edited comment");

    if self.focus.editing() == Some(comment_id) {
      self.focus = InteractionFocus::None;
    }
    self.resync().await;
    Ok(())
  }

  /// Delete one of the viewer's own comments. Whether its replies go with it
  /// depends on the store; replies left behind show up as roots.
  pub async fn delete(&mut self, comment_id: Uuid) -> Result<()> {
    let viewer = self.writer()?;
    self.check_author(comment_id, viewer)?;

    let applied =
      bounded(self.timeout, self.store.delete(comment_id, viewer.user_id)).await?;
    if !applied {
      warn!(comment_id = %comment_id, "store rejected comment delete");
      return Err(Error::NotAuthorOfComment(comment_id));
    }
    info!(comment_id = %comment_id, "deleted comment");

    if self.focus.target() == Some(comment_id) {
      self.focus = InteractionFocus::None;
    }
    self.resync().await;
    Ok(())
  }

  fn writer(&self) -> Result<Viewer> {
    match self.viewer {
      Some(v) if can_write(v.tier) => Ok(v),
      _ => Err(Error::PermissionDenied),
    }
  }

  fn check_author(&self, comment_id: Uuid, viewer: Viewer) -> Result<()> {
    let node = self
      .find(comment_id)
      .ok_or(Error::CommentNotFound(comment_id))?;
    if node.comment.user_id != viewer.user_id {
      return Err(Error::NotAuthorOfComment(comment_id));
    }
    Ok(())
  }

  // ── Interaction ───────────────────────────────────────────────────────────

  /// Open the reply composer under `id`, closing any open editor.
  pub fn start_reply(&mut self, id: Uuid) -> Result<()> {
    if self.find(id).is_none() {
      return Err(Error::CommentNotFound(id));
    }
    self.focus = InteractionFocus::Replying(id);
    Ok(())
  }

  /// Open the editor on `id`, closing any open reply composer. Returns the
  /// current body to pre-fill the editor with.
  pub fn start_edit(&mut self, id: Uuid) -> Result<String> {
    let viewer = self.viewer.ok_or(Error::PermissionDenied)?;
    let node = self.find(id).ok_or(Error::CommentNotFound(id))?;
    if node.comment.user_id != viewer.user_id {
      return Err(Error::NotAuthorOfComment(id));
    }
    let body = node.comment.comment.clone();
    self.focus = InteractionFocus::Editing(id);
    Ok(body)
  }

  pub fn cancel_focus(&mut self) { self.focus = InteractionFocus::None; }

  pub fn is_expanded(&self, id: Uuid) -> bool { self.expanded.contains(&id) }

  pub fn expand(&mut self, id: Uuid) { self.expanded.insert(id); }

  /// Flip a node between expanded and collapsed; returns the new state.
  pub fn toggle_expanded(&mut self, id: Uuid) -> bool {
    if self.expanded.remove(&id) {
      false
    } else {
      self.expanded.insert(id);
      true
    }
  }

  /// Expand `id` and every ancestor of it.
  fn reveal(&mut self, id: Uuid) {
    if let Some(path) = tree::ancestors(&self.forest, id) {
      self.expanded.extend(path);
      self.expanded.insert(id);
    }
  }
}

/// Run one store call under `timeout`, mapping its error into [`Error`].
async fn bounded<T, E, F>(timeout: Duration, fut: F) -> Result<T>
where
  F: Future<Output = Result<T, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  match tokio::time::timeout(timeout, fut).await {
    Ok(result) => result.map_err(Error::store),
    Err(_) => Err(Error::Timeout(timeout)),
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex, MutexGuard};

  use chrono::DateTime;

  use super::*;
  use crate::store::StoreBackend;

  // ─── In-memory store ───────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("mock store failure")]
  struct MockError;

  #[derive(Default)]
  struct MockState {
    rows:          Vec<Comment>,
    profiles:      HashMap<Uuid, Profile>,
    /// Number of insert/update/delete calls that reached the store.
    writes:        usize,
    fail_reads:    bool,
    reject_writes: bool,
    cascade:       bool,
    read_delay:    Option<Duration>,
  }

  #[derive(Clone, Default)]
  struct MockStore(Arc<Mutex<MockState>>);

  impl MockStore {
    fn state(&self) -> MutexGuard<'_, MockState> { self.0.lock().unwrap() }
  }

  impl StoreBackend for MockStore {
    type Error = MockError;
  }

  impl CommentStore for MockStore {
    async fn select<'a>(&'a self, movie_id: &'a str) -> Result<Vec<Comment>, MockError> {
      let delay = self.state().read_delay;
      if let Some(d) = delay {
        tokio::time::sleep(d).await;
      }
      let st = self.state();
      if st.fail_reads {
        return Err(MockError);
      }
      Ok(st.rows.iter().filter(|c| c.movie_id == movie_id).cloned().collect())
    }

    async fn insert(&self, input: NewComment) -> Result<Comment, MockError> {
      let mut st = self.state();
      st.writes += 1;
      let now = Utc::now();
      let comment = Comment {
        id:         Uuid::new_v4(),
        movie_id:   input.movie_id,
        user_id:    input.user_id,
        comment:    input.comment,
        parent_id:  input.parent_id,
        created_at: now,
        updated_at: now,
      };
      st.rows.push(comment.clone());
      Ok(comment)
    }

    async fn update(
      &self,
      id: Uuid,
      acting_user: Uuid,
      patch: CommentPatch,
    ) -> Result<bool, MockError> {
      let mut st = self.state();
      st.writes += 1;
      if st.reject_writes {
        return Ok(false);
      }
      match st
        .rows
        .iter_mut()
        .find(|c| c.id == id && c.user_id == acting_user)
      {
        Some(c) => {
          c.comment = patch.comment;
          c.updated_at = patch.updated_at;
          Ok(true)
        }
        None => Ok(false),
      }
    }

    async fn delete(&self, id: Uuid, acting_user: Uuid) -> Result<bool, MockError> {
      let mut st = self.state();
      st.writes += 1;
      if st.reject_writes {
        return Ok(false);
      }
      let before = st.rows.len();
      st.rows.retain(|c| !(c.id == id && c.user_id == acting_user));
      if st.rows.len() == before {
        return Ok(false);
      }
      if st.cascade {
        loop {
          let ids: HashSet<Uuid> = st.rows.iter().map(|c| c.id).collect();
          let len = st.rows.len();
          st.rows.retain(|c| c.parent_id.is_none_or(|p| ids.contains(&p)));
          if st.rows.len() == len {
            break;
          }
        }
      }
      Ok(true)
    }
  }

  impl ProfileLookup for MockStore {
    async fn select_profiles<'a>(
      &'a self,
      user_ids: &'a BTreeSet<Uuid>,
    ) -> Result<HashMap<Uuid, Profile>, MockError> {
      let st = self.state();
      if st.fail_reads {
        return Err(MockError);
      }
      Ok(
        st.profiles
          .iter()
          .filter(|(id, _)| user_ids.contains(id))
          .map(|(id, p)| (*id, p.clone()))
          .collect(),
      )
    }
  }

  // ─── Fixtures ──────────────────────────────────────────────────────────────

  const ALICE: Uuid = Uuid::from_u128(0xa11ce);
  const BOB: Uuid = Uuid::from_u128(0xb0b);

  fn id(n: u128) -> Uuid { Uuid::from_u128(n) }

  fn row(n: u128, parent: Option<u128>, t: i64, author: Uuid) -> Comment {
    let at = DateTime::from_timestamp(t, 0).unwrap();
    Comment {
      id:         id(n),
      movie_id:   "550".into(),
      user_id:    author,
      comment:    format!("comment {n}"),
      parent_id:  parent.map(id),
      created_at: at,
      updated_at: at,
    }
  }

  /// A / B / C / D: two roots, A has a reply chain two deep. Alice wrote A
  /// and C, Bob wrote B and D.
  fn scenario_rows() -> Vec<Comment> {
    vec![
      row(1, None, 10, ALICE),
      row(2, Some(1), 20, BOB),
      row(3, Some(2), 30, ALICE),
      row(4, None, 25, BOB),
    ]
  }

  fn viewer(user_id: Uuid, tier: Tier) -> Option<Viewer> { Some(Viewer { user_id, tier }) }

  async fn thread_with(
    rows: Vec<Comment>,
    viewer: Option<Viewer>,
  ) -> (MockStore, CommentThread<MockStore>) {
    let store = MockStore::default();
    store.state().rows = rows;
    store.state().profiles.insert(
      ALICE,
      Profile { user_id: ALICE, full_name: "Alice".into(), avatar_url: None },
    );
    let mut thread = CommentThread::new(store.clone(), "550", viewer);
    thread.synchronize().await.unwrap();
    (store, thread)
  }

  fn root_ids(thread: &CommentThread<MockStore>) -> Vec<Uuid> {
    thread.forest().iter().map(|n| n.comment.id).collect()
  }

  // ─── Sync ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn sync_builds_forest_and_resolves_names() {
    let (_, thread) = thread_with(scenario_rows(), None).await;

    assert_eq!(root_ids(&thread), vec![id(4), id(1)]);
    assert_eq!(thread.total_comments(), 4);
    assert_eq!(thread.forest()[1].reply_count, 2);
    assert_eq!(thread.display_name(ALICE), "Alice");
    assert_eq!(thread.display_name(BOB), fallback_display_name(BOB));
    assert!(!thread.can_write());
  }

  #[tokio::test]
  async fn profile_details_come_from_the_last_sync() {
    let store = MockStore::default();
    store.state().rows = scenario_rows();
    store.state().profiles.insert(
      BOB,
      Profile {
        user_id:    BOB,
        full_name:  "  ".into(),
        avatar_url: Some("https://img.example/bob.png".into()),
      },
    );
    let mut thread = CommentThread::new(store.clone(), "550", None);
    thread.synchronize().await.unwrap();

    assert_eq!(thread.avatar_url(BOB), Some("https://img.example/bob.png"));
    assert_eq!(thread.display_name(BOB), fallback_display_name(BOB));
    assert!(thread.profile(ALICE).is_none());
    assert!(thread.avatar_url(ALICE).is_none());
  }

  #[tokio::test]
  async fn sync_ignores_other_movies() {
    let mut rows = scenario_rows();
    rows.push(Comment { movie_id: "603".into(), ..row(9, None, 1, BOB) });
    let (_, thread) = thread_with(rows, None).await;
    assert_eq!(thread.total_comments(), 4);
  }

  #[tokio::test]
  async fn failed_sync_keeps_previous_forest() {
    let (store, mut thread) = thread_with(scenario_rows(), None).await;
    store.state().rows.push(row(5, None, 50, BOB));
    store.state().fail_reads = true;

    let err = thread.synchronize().await.unwrap_err();
    assert!(err.is_store_failure());
    assert!(thread.is_stale());
    assert_eq!(root_ids(&thread), vec![id(4), id(1)]);

    store.state().fail_reads = false;
    thread.synchronize().await.unwrap();
    assert!(!thread.is_stale());
    assert_eq!(root_ids(&thread), vec![id(5), id(4), id(1)]);
  }

  #[tokio::test]
  async fn slow_store_times_out() {
    let store = MockStore::default();
    store.state().read_delay = Some(Duration::from_millis(500));
    let mut thread = CommentThread::new(store, "550", None)
      .with_timeout(Duration::from_millis(20));

    let err = thread.synchronize().await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
  }

  // ─── Gating and validation ─────────────────────────────────────────────────

  #[tokio::test]
  async fn writes_require_premium() {
    for who in [None, viewer(ALICE, Tier::Free), viewer(ALICE, Tier::Basic)] {
      let (store, mut thread) = thread_with(scenario_rows(), who).await;

      assert!(matches!(
        thread.submit_root("hello").await,
        Err(Error::PermissionDenied)
      ));
      assert!(matches!(
        thread.submit_reply(id(1), "hello").await,
        Err(Error::PermissionDenied)
      ));
      assert!(matches!(
        thread.edit(id(1), "hello").await,
        Err(Error::PermissionDenied)
      ));
      assert!(matches!(thread.delete(id(1)).await, Err(Error::PermissionDenied)));
      assert_eq!(store.state().writes, 0);
    }
  }

  #[tokio::test]
  async fn blank_bodies_are_rejected_before_the_store() {
    let (store, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;

    for body in ["", "   ", "\n\t"] {
      assert!(matches!(thread.submit_root(body).await, Err(Error::Validation(_))));
      assert!(matches!(
        thread.submit_reply(id(1), body).await,
        Err(Error::Validation(_))
      ));
      assert!(matches!(thread.edit(id(1), body).await, Err(Error::Validation(_))));
    }
    assert_eq!(store.state().writes, 0);
  }

  #[tokio::test]
  async fn non_authors_cannot_edit_or_delete() {
    let (store, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;

    assert!(matches!(
      thread.edit(id(2), "mine now").await,
      Err(Error::NotAuthorOfComment(c)) if c == id(2)
    ));
    assert!(matches!(
      thread.delete(id(4)).await,
      Err(Error::NotAuthorOfComment(c)) if c == id(4)
    ));
    assert_eq!(store.state().writes, 0);
  }

  #[tokio::test]
  async fn store_rejection_is_surfaced_and_forest_kept() {
    let (store, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;
    store.state().reject_writes = true;
    let before = thread.forest().to_vec();

    assert!(matches!(
      thread.edit(id(1), "changed").await,
      Err(Error::NotAuthorOfComment(_))
    ));
    assert!(matches!(thread.delete(id(1)).await, Err(Error::NotAuthorOfComment(_))));
    assert_eq!(store.state().writes, 2);
    assert_eq!(thread.forest(), before.as_slice());
  }

  #[tokio::test]
  async fn unknown_targets_are_not_found() {
    let (store, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;

    assert!(matches!(
      thread.submit_reply(id(99), "hi").await,
      Err(Error::CommentNotFound(_))
    ));
    assert!(matches!(thread.edit(id(99), "hi").await, Err(Error::CommentNotFound(_))));
    assert_eq!(store.state().writes, 0);
  }

  // ─── Successful mutations ──────────────────────────────────────────────────

  #[tokio::test]
  async fn new_root_comment_appears_first() {
    let (_, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;

    let created = thread.submit_root("  Loved it  ").await.unwrap();
    assert_eq!(created.comment, "Loved it");
    assert_eq!(root_ids(&thread)[0], created.id);
    assert_eq!(thread.total_comments(), 5);
  }

  #[tokio::test]
  async fn reply_expands_the_whole_chain() {
    let (_, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;
    thread.start_reply(id(3)).unwrap();

    let created = thread.submit_reply(id(3), "deep reply").await.unwrap();

    assert!(thread.focus().is_idle());
    for ancestor in [id(1), id(2), id(3)] {
      assert!(thread.is_expanded(ancestor));
    }
    let visible: Vec<Uuid> =
      thread.visible().iter().map(|(_, n)| n.comment.id).collect();
    assert!(visible.contains(&created.id));
    assert_eq!(thread.find(id(1)).unwrap().reply_count, 3);
  }

  #[tokio::test]
  async fn edit_replaces_body_and_marks_edited() {
    let (_, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;
    let current = thread.start_edit(id(1)).unwrap();
    assert_eq!(current, "comment 1");

    thread.edit(id(1), "comment 1, revised").await.unwrap();

    let node = thread.find(id(1)).unwrap();
    assert_eq!(node.comment.comment, "comment 1, revised");
    assert!(node.comment.is_edited());
    assert!(thread.focus().is_idle());
  }

  #[tokio::test]
  async fn delete_without_cascade_promotes_orphans() {
    let (_, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;

    thread.delete(id(1)).await.unwrap();

    // B lost its parent and surfaces as a root, still carrying C.
    assert_eq!(root_ids(&thread), vec![id(4), id(2)]);
    assert_eq!(thread.find(id(2)).unwrap().reply_count, 1);
  }

  #[tokio::test]
  async fn delete_with_cascade_removes_subtree() {
    let (store, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;
    store.state().cascade = true;

    thread.delete(id(1)).await.unwrap();

    assert_eq!(root_ids(&thread), vec![id(4)]);
    assert_eq!(thread.total_comments(), 1);
  }

  // ─── Interaction focus ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn focus_is_a_single_slot() {
    let (_, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;

    thread.start_reply(id(2)).unwrap();
    assert_eq!(thread.focus(), InteractionFocus::Replying(id(2)));

    thread.start_edit(id(3)).unwrap();
    assert_eq!(thread.focus(), InteractionFocus::Editing(id(3)));

    thread.start_reply(id(4)).unwrap();
    assert_eq!(thread.focus(), InteractionFocus::Replying(id(4)));

    thread.cancel_focus();
    assert!(thread.focus().is_idle());
  }

  #[tokio::test]
  async fn only_authors_may_open_the_editor() {
    let (_, mut thread) =
      thread_with(scenario_rows(), viewer(ALICE, Tier::Premium)).await;
    assert!(matches!(thread.start_edit(id(2)), Err(Error::NotAuthorOfComment(_))));
    assert!(thread.focus().is_idle());
  }

  #[tokio::test]
  async fn toggling_expansion() {
    let (_, mut thread) = thread_with(scenario_rows(), None).await;
    assert_eq!(thread.visible().len(), 2);

    assert!(thread.toggle_expanded(id(1)));
    assert_eq!(thread.visible().len(), 3);

    assert!(!thread.toggle_expanded(id(1)));
    assert_eq!(thread.visible().len(), 2);
  }

  #[tokio::test]
  async fn deleted_targets_drop_out_of_focus() {
    let (store, mut thread) =
      thread_with(scenario_rows(), viewer(BOB, Tier::Premium)).await;
    thread.expand(id(1));
    thread.start_reply(id(1)).unwrap();

    store.state().rows.retain(|c| c.id != id(1));
    thread.synchronize().await.unwrap();

    assert!(thread.focus().is_idle());
    assert!(!thread.is_expanded(id(1)));
  }
}
