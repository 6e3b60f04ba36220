//! Core types and the comment engine for ngestream's movie discussions.
//!
//! This crate is free of HTTP and database dependencies. Storage backends and
//! remote clients plug in through the traits in [`store`]; everything else
//! (tree building, entitlement gating, the per-movie [`CommentThread`]) lives
//! here.

// Native `async fn` in traits; the trait definitions spell out `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod collection;
pub mod comment;
pub mod entitlement;
pub mod error;
pub mod focus;
pub mod profile;
pub mod store;
pub mod thread;
pub mod tree;

pub use error::{Error, Result};
pub use thread::{CommentThread, DEFAULT_TIMEOUT, Viewer};
