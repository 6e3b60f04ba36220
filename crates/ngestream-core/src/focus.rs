//! The single-slot interaction focus shared by a whole comment thread.
//!
//! At most one comment is being edited and at most one is being replied to,
//! and never both at once: starting one replaces the other.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionFocus {
  #[default]
  None,
  Editing(Uuid),
  Replying(Uuid),
}

impl InteractionFocus {
  pub fn is_idle(self) -> bool { matches!(self, Self::None) }

  pub fn editing(self) -> Option<Uuid> {
    match self {
      Self::Editing(id) => Some(id),
      _ => None,
    }
  }

  pub fn replying(self) -> Option<Uuid> {
    match self {
      Self::Replying(id) => Some(id),
      _ => None,
    }
  }

  /// The comment the focus points at, whatever the mode.
  pub fn target(self) -> Option<Uuid> {
    match self {
      Self::None => None,
      Self::Editing(id) | Self::Replying(id) => Some(id),
    }
  }
}
