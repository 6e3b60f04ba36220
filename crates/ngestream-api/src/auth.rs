//! HTTP Basic-auth extractor and password hashing.
//!
//! Credentials are `email:password`. The password is verified against the
//! account's argon2 PHC string; the acting tier comes from the account's
//! subscription as it applies right now.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use ngestream_core::{
  entitlement::{Tier, effective_tier},
  profile::Account,
  store::AccountStore,
};
use rand_core::OsRng;
use tracing::debug;

use crate::error::ApiError;

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
  pub account: Account,
  pub tier:    Tier,
}

/// Split a `Basic` authorization header into `(email, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

/// Produce an argon2 PHC string for a new account.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::BadRequest(format!("cannot hash password: {e}")))
}

impl<S> FromRequestParts<Arc<S>> for AuthUser
where
  S: AccountStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;

    let account = store
      .find_account_by_email(&email)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&password, &account.password_hash) {
      debug!(user_id = %account.user_id, "rejected credentials");
      return Err(ApiError::Unauthorized);
    }

    let sub = store
      .get_subscription(account.user_id)
      .await
      .map_err(ApiError::store)?;
    let tier = effective_tier(sub.as_ref(), Utc::now());

    Ok(AuthUser { account, tier })
  }
}
