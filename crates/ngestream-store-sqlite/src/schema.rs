//! SQL schema for the ngestream SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_profiles (
    user_id    TEXT PRIMARY KEY REFERENCES accounts(user_id) ON DELETE CASCADE,
    full_name  TEXT NOT NULL,
    avatar_url TEXT
);

-- One row per user; plan changes overwrite it.
CREATE TABLE IF NOT EXISTS subscriptions (
    user_id    TEXT PRIMARY KEY REFERENCES accounts(user_id) ON DELETE CASCADE,
    tier       TEXT NOT NULL CHECK (tier IN ('free', 'basic', 'premium')),
    is_active  INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    expires_at TEXT
);

-- No ON DELETE CASCADE on parent_id: SQLite runs cascades as nested
-- triggers, which stop at its recursion limit. The store deletes reply
-- subtrees itself with a recursive CTE.
CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY,
    movie_id   TEXT NOT NULL,
    user_id    TEXT NOT NULL REFERENCES accounts(user_id),
    comment    TEXT NOT NULL,
    parent_id  TEXT REFERENCES comments(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS comments_movie_idx  ON comments(movie_id);
CREATE INDEX IF NOT EXISTS comments_parent_idx ON comments(parent_id);

CREATE TABLE IF NOT EXISTS likes (
    user_id    TEXT NOT NULL REFERENCES accounts(user_id) ON DELETE CASCADE,
    movie_id   TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, movie_id)
);

CREATE TABLE IF NOT EXISTS wishlists (
    user_id    TEXT NOT NULL REFERENCES accounts(user_id) ON DELETE CASCADE,
    movie_id   TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, movie_id)
);

CREATE INDEX IF NOT EXISTS likes_movie_idx ON likes(movie_id);

PRAGMA user_version = 1;
";
