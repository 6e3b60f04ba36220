//! `POST /accounts` — sign-up.
//!
//! Body: `{"email":"…","password":"…","full_name":"…"}`. New accounts start on
//! the free plan.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use ngestream_core::{profile::NewAccount, store::AccountStore};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{auth::hash_password, error::ApiError};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub email:     String,
  pub password:  String,
  pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
  pub user_id: Uuid,
  pub email:   String,
}

pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  let email = body.email.trim();
  if email.is_empty() || !email.contains('@') || email.contains(':') {
    return Err(ApiError::BadRequest("a valid email is required".into()));
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  let full_name = body.full_name.trim();
  if full_name.is_empty() {
    return Err(ApiError::BadRequest("full_name is required".into()));
  }

  if store
    .find_account_by_email(email)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Conflict(format!("{email} is already registered")));
  }

  let account = store
    .create_account(NewAccount {
      email:         email.to_owned(),
      password_hash: hash_password(&body.password)?,
      full_name:     full_name.to_owned(),
    })
    .await
    .map_err(ApiError::store)?;

  info!(user_id = %account.user_id, "account created");
  Ok((
    StatusCode::CREATED,
    Json(Created { user_id: account.user_id, email: account.email }),
  ))
}
