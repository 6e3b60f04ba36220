//! Error type for `ngestream-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ngestream_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A reply named a parent comment that does not exist.
  #[error("comment not found: {0}")]
  CommentNotFound(uuid::Uuid),

  #[error("account not found: {0}")]
  AccountNotFound(uuid::Uuid),

  #[error("an account with email {0:?} already exists")]
  EmailTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
