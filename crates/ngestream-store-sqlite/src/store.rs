//! [`SqliteStore`] — the SQLite implementation of the ngestream store traits.

use std::{
  collections::{BTreeSet, HashMap},
  path::Path,
};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use ngestream_core::{
  collection::{Collection, SavedTitle, sort_newest_first},
  comment::{Comment, CommentPatch, NewComment},
  entitlement::{Subscription, Tier},
  profile::{Account, NewAccount, Profile, ProfilePatch},
  store::{AccountStore, CollectionStore, CommentStore, ProfileLookup, StoreBackend},
};

use crate::{
  Error, Result,
  encode::{
    RawAccount, RawComment, RawProfile, RawSavedTitle, RawSubscription, collection_table,
    encode_dt, encode_tier, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An ngestream store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_subscription(&self, user_id: Uuid) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, tier, is_active, created_at, expires_at
               FROM subscriptions WHERE user_id = ?1",
              rusqlite::params![id_str],
              RawSubscription::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }
}

impl StoreBackend for SqliteStore {
  type Error = Error;
}

// ─── CommentStore impl ───────────────────────────────────────────────────────

impl CommentStore for SqliteStore {
  async fn select(&self, movie_id: &str) -> Result<Vec<Comment>> {
    let movie_id = movie_id.to_owned();

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM comments WHERE movie_id = ?1",
          RawComment::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![movie_id], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn insert(&self, input: NewComment) -> Result<Comment> {
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

    let id_str     = encode_uuid(comment.id);
    let movie_id   = comment.movie_id.clone();
    let user_str   = encode_uuid(comment.user_id);
    let body       = comment.comment.clone();
    let parent_str = comment.parent_id.map(encode_uuid);
    let at_str     = encode_dt(now);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(parent) = &parent_str {
          let exists = tx
            .query_row(
              "SELECT 1 FROM comments WHERE id = ?1",
              rusqlite::params![parent],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if !exists {
            return Ok(false);
          }
        }
        tx.execute(
          "INSERT INTO comments (
             id, movie_id, user_id, comment, parent_id, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![id_str, movie_id, user_str, body, parent_str, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    match (inserted, comment.parent_id) {
      (false, Some(parent)) => Err(Error::CommentNotFound(parent)),
      _ => {
        debug!(comment_id = %comment.id, "inserted comment");
        Ok(comment)
      }
    }
  }

  async fn update(&self, id: Uuid, acting_user: Uuid, patch: CommentPatch) -> Result<bool> {
    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(acting_user);
    let at_str   = encode_dt(patch.updated_at);
    let body     = patch.comment;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE comments SET comment = ?3, updated_at = ?4
           WHERE id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str, body, at_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete(&self, id: Uuid, acting_user: Uuid) -> Result<bool> {
    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(acting_user);

    // Ownership is checked on the target only; replies by other users go
    // with it.
    let removed: Option<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let owned = tx
          .query_row(
            "SELECT 1 FROM comments WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![id_str, user_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !owned {
          return Ok(None);
        }
        let n = tx.execute(
          "WITH RECURSIVE subtree(id) AS (
             SELECT ?1
             UNION
             SELECT c.id FROM comments c JOIN subtree ON c.parent_id = subtree.id
           )
           DELETE FROM comments WHERE id IN (SELECT id FROM subtree)",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(Some(n))
      })
      .await?;

    match removed {
      Some(n) => {
        debug!(comment_id = %id, removed = n, "deleted comment subtree");
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

// ─── ProfileLookup impl ──────────────────────────────────────────────────────

impl ProfileLookup for SqliteStore {
  async fn select_profiles(&self, user_ids: &BTreeSet<Uuid>) -> Result<HashMap<Uuid, Profile>> {
    if user_ids.is_empty() {
      return Ok(HashMap::new());
    }
    let ids: Vec<String> = user_ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let placeholders = (1..=ids.len())
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");
        let mut stmt = conn.prepare(&format!(
          "SELECT user_id, full_name, avatar_url FROM user_profiles
           WHERE user_id IN ({placeholders})"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok(RawProfile {
              user_id:    row.get(0)?,
              full_name:  row.get(1)?,
              avatar_url: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| raw.into_profile().map(|p| (p.user_id, p)))
      .collect()
  }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let account = Account {
      user_id:       Uuid::new_v4(),
      email:         input.email.trim().to_owned(),
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    let id_str    = encode_uuid(account.user_id);
    let email     = account.email.clone();
    let hash      = account.password_hash.clone();
    let at_str    = encode_dt(account.created_at);
    let full_name = input.full_name;
    let free      = encode_tier(Tier::Free);

    let created: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM accounts WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO accounts (user_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email, hash, at_str],
        )?;
        tx.execute(
          "INSERT INTO user_profiles (user_id, full_name, avatar_url)
           VALUES (?1, ?2, NULL)",
          rusqlite::params![id_str, full_name],
        )?;
        tx.execute(
          "INSERT INTO subscriptions (user_id, tier, is_active, created_at, expires_at)
           VALUES (?1, ?2, 1, ?3, NULL)",
          rusqlite::params![id_str, free, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(Error::EmailTaken(account.email));
    }
    debug!(user_id = %account.user_id, "created account");
    Ok(account)
  }

  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
    let email = email.trim().to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash, created_at
               FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok(RawAccount {
                  user_id:       row.get(0)?,
                  email:         row.get(1)?,
                  password_hash: row.get(2)?,
                  created_at:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<Option<Profile>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE user_profiles
           SET full_name  = COALESCE(?2, full_name),
               avatar_url = COALESCE(?3, avatar_url)
           WHERE user_id = ?1",
          rusqlite::params![id_str, patch.full_name, patch.avatar_url],
        )?;
        Ok(
          conn
            .query_row(
              "SELECT user_id, full_name, avatar_url FROM user_profiles WHERE user_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawProfile {
                  user_id:    row.get(0)?,
                  full_name:  row.get(1)?,
                  avatar_url: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn get_subscription(&self, user_id: Uuid) -> Result<Option<Subscription>> {
    self.select_subscription(user_id).await
  }

  async fn set_subscription_tier(&self, user_id: Uuid, tier: Tier) -> Result<Subscription> {
    let id_str   = encode_uuid(user_id);
    let tier_str = encode_tier(tier);
    let at_str   = encode_dt(Utc::now());

    let known: bool = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM accounts WHERE user_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO subscriptions (user_id, tier, is_active, created_at, expires_at)
           VALUES (?1, ?2, 1, ?3, NULL)
           ON CONFLICT (user_id) DO UPDATE
             SET tier = excluded.tier, is_active = 1, expires_at = NULL",
          rusqlite::params![id_str, tier_str, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !known {
      return Err(Error::AccountNotFound(user_id));
    }
    debug!(user_id = %user_id, tier = %tier, "changed subscription tier");
    self
      .select_subscription(user_id)
      .await?
      .ok_or(Error::AccountNotFound(user_id))
  }
}

// ─── CollectionStore impl ────────────────────────────────────────────────────

impl CollectionStore for SqliteStore {
  async fn add_title(
    &self,
    collection: Collection,
    user_id: Uuid,
    movie_id: &str,
  ) -> Result<bool> {
    let table    = collection_table(collection);
    let user_str = encode_uuid(user_id);
    let movie_id = movie_id.to_owned();
    let at_str   = encode_dt(Utc::now());

    let added = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!(
            "INSERT OR IGNORE INTO {table} (user_id, movie_id, created_at)
             VALUES (?1, ?2, ?3)"
          ),
          rusqlite::params![user_str, movie_id, at_str],
        )?)
      })
      .await?;

    debug!(%collection, user_id = %user_id, added = added > 0, "add title");
    Ok(added > 0)
  }

  async fn remove_title(
    &self,
    collection: Collection,
    user_id: Uuid,
    movie_id: &str,
  ) -> Result<bool> {
    let table    = collection_table(collection);
    let user_str = encode_uuid(user_id);
    let movie_id = movie_id.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("DELETE FROM {table} WHERE user_id = ?1 AND movie_id = ?2"),
          rusqlite::params![user_str, movie_id],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn contains_title(
    &self,
    collection: Collection,
    user_id: Uuid,
    movie_id: &str,
  ) -> Result<bool> {
    let table    = collection_table(collection);
    let user_str = encode_uuid(user_id);
    let movie_id = movie_id.to_owned();

    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT 1 FROM {table} WHERE user_id = ?1 AND movie_id = ?2"),
              rusqlite::params![user_str, movie_id],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;

    Ok(found)
  }

  async fn list_titles(&self, collection: Collection, user_id: Uuid) -> Result<Vec<SavedTitle>> {
    let table    = collection_table(collection);
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawSavedTitle> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT user_id, movie_id, created_at FROM {table} WHERE user_id = ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawSavedTitle {
              user_id:    row.get(0)?,
              movie_id:   row.get(1)?,
              created_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // RFC 3339 text with varying fractional digits does not sort
    // lexically, so order after decoding.
    let mut titles = raws
      .into_iter()
      .map(RawSavedTitle::into_saved_title)
      .collect::<Result<Vec<_>>>()?;
    sort_newest_first(&mut titles);
    Ok(titles)
  }

  async fn like_count(&self, movie_id: &str) -> Result<u64> {
    let movie_id = movie_id.to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM likes WHERE movie_id = ?1",
          rusqlite::params![movie_id],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(u64::try_from(count).unwrap_or_default())
  }
}
