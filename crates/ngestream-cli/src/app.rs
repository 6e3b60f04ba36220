//! Application state machine and event dispatcher.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ngestream_core::{
  CommentThread, Error,
  focus::InteractionFocus,
  store::{CommentStore, ProfileLookup},
  tree::CommentNode,
};
use tracing::debug;
use uuid::Uuid;

/// Shown instead of composer hints when the viewer cannot comment.
pub const PREMIUM_NOTICE: &str = "Premium feature: upgrade to join the discussion";

// ─── Mode ────────────────────────────────────────────────────────────────────

/// What the keyboard currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  /// Moving through the comment list.
  Browse,
  /// Typing a new top-level comment. Replies and edits are tracked by the
  /// thread's own focus instead.
  ComposeRoot,
  /// Typing into the reply or edit composer named by the thread focus.
  ComposeFocused,
  /// Waiting for y/n before deleting a comment.
  ConfirmDelete(Uuid),
}

// ─── App ─────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S> {
  pub thread:     CommentThread<S>,
  pub mode:       Mode,
  /// Text of whichever composer is open.
  pub composer:   String,
  /// Cursor position within the visible comment list.
  pub cursor:     usize,
  /// Name shown in the header for the signed-in viewer.
  pub viewer_name: Option<String>,
  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl<S> App<S>
where
  S: CommentStore + ProfileLookup,
{
  pub fn new(thread: CommentThread<S>) -> Self {
    Self {
      thread,
      mode: Mode::Browse,
      composer: String::new(),
      cursor: 0,
      viewer_name: None,
      status_msg: String::new(),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Re-fetch the thread. Failures land in the status bar.
  pub async fn refresh(&mut self) {
    let selected = self.selected_id();
    self.status_msg = "Loading comments…".into();
    match self.thread.synchronize().await {
      Ok(()) => self.status_msg.clear(),
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
    self.reselect(selected);
  }

  // ── Selection ─────────────────────────────────────────────────────────────

  pub fn visible(&self) -> Vec<(usize, &CommentNode)> { self.thread.visible() }

  pub fn selected(&self) -> Option<&CommentNode> {
    self.visible().get(self.cursor).map(|(_, n)| *n)
  }

  pub fn selected_id(&self) -> Option<Uuid> { self.selected().map(|n| n.comment.id) }

  /// Put the cursor back on `id` after the list changed, or clamp it.
  fn reselect(&mut self, id: Option<Uuid>) {
    let visible = self.visible();
    let found = id.and_then(|id| visible.iter().position(|(_, n)| n.comment.id == id));
    let len = visible.len();
    self.cursor = match found {
      Some(i) => i,
      None => self.cursor.min(len.saturating_sub(1)),
    };
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    match self.mode {
      Mode::Browse => return self.handle_browse_key(key).await,
      Mode::ComposeRoot | Mode::ComposeFocused => self.handle_composer_key(key).await,
      Mode::ConfirmDelete(id) => self.handle_confirm_key(key, id).await,
    }
    true
  }

  async fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.visible().len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Char(' ') => {
        if let Some(node) = self.selected()
          && !node.replies.is_empty()
        {
          let id = node.comment.id;
          self.thread.toggle_expanded(id);
        }
      }

      KeyCode::Char('R') => self.refresh().await,

      KeyCode::Char('n') => {
        if self.require_writer() {
          self.thread.cancel_focus();
          self.composer.clear();
          self.mode = Mode::ComposeRoot;
        }
      }

      KeyCode::Char('r') => {
        if self.require_writer()
          && let Some(id) = self.selected_id()
        {
          match self.thread.start_reply(id) {
            Ok(()) => {
              self.composer.clear();
              self.mode = Mode::ComposeFocused;
            }
            Err(e) => self.status_msg = format!("Error: {e}"),
          }
        }
      }

      KeyCode::Char('e') => {
        if self.require_writer()
          && let Some(id) = self.selected_id()
        {
          match self.thread.start_edit(id) {
            Ok(body) => {
              self.composer = body;
              self.mode = Mode::ComposeFocused;
            }
            Err(Error::NotAuthorOfComment(_)) => {
              self.status_msg = "You can only edit your own comments".into();
            }
            Err(e) => self.status_msg = format!("Error: {e}"),
          }
        }
      }

      KeyCode::Char('d') => {
        if self.require_writer()
          && let Some((id, mine)) = self
            .selected()
            .map(|n| (n.comment.id, self.thread.is_author(&n.comment)))
        {
          if mine {
            self.mode = Mode::ConfirmDelete(id);
          } else {
            self.status_msg = "You can only delete your own comments".into();
          }
        }
      }

      _ => {}
    }
    true
  }

  async fn handle_composer_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => self.close_composer(),
      KeyCode::Enter => self.submit().await,
      KeyCode::Backspace => {
        self.composer.pop();
      }
      KeyCode::Char(c) => self.composer.push(c),
      _ => {}
    }
  }

  async fn handle_confirm_key(&mut self, key: KeyEvent, id: Uuid) {
    self.mode = Mode::Browse;
    if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
      self.status_msg = "Delete cancelled".into();
      return;
    }

    let selected = self.selected_id();
    match self.thread.delete(id).await {
      Ok(()) => self.status_msg = self.after_write("Comment deleted"),
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
    self.reselect(selected);
  }

  // ── Composer ──────────────────────────────────────────────────────────────

  /// Send whatever the open composer holds. On failure the composer stays
  /// open with its text intact.
  async fn submit(&mut self) {
    let body = self.composer.clone();
    let selected = self.selected_id();

    let result = match (self.mode, self.thread.focus()) {
      (Mode::ComposeRoot, _) => self.thread.submit_root(&body).await.map(|c| {
        debug!(comment_id = %c.id, "posted from composer");
        "Comment posted"
      }),
      (Mode::ComposeFocused, InteractionFocus::Replying(parent)) => self
        .thread
        .submit_reply(parent, &body)
        .await
        .map(|_| "Reply posted"),
      (Mode::ComposeFocused, InteractionFocus::Editing(id)) => {
        self.thread.edit(id, &body).await.map(|()| "Comment updated")
      }
      _ => {
        // The focused comment disappeared underneath the composer.
        self.close_composer();
        self.status_msg = "That comment is no longer there".into();
        return;
      }
    };

    match result {
      Ok(done) => {
        self.composer.clear();
        self.mode = Mode::Browse;
        self.thread.cancel_focus();
        self.status_msg = self.after_write(done);
        self.reselect(selected);
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  fn close_composer(&mut self) {
    self.composer.clear();
    self.thread.cancel_focus();
    self.mode = Mode::Browse;
  }

  /// Status text after a successful write, noting a failed resync.
  fn after_write(&self, done: &str) -> String {
    if self.thread.is_stale() {
      format!("{done}; refresh failed, press R to retry")
    } else {
      done.to_owned()
    }
  }

  fn require_writer(&mut self) -> bool {
    if self.thread.can_write() {
      true
    } else {
      self.status_msg = PREMIUM_NOTICE.into();
      false
    }
  }
}
