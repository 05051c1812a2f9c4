//! Handlers for `/user` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/user/registration` | Body: `{"username":"…","password":"…"}` |
//! | `POST` | `/user/login` | Basic credentials; returns the owner |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use lexigraph_core::{analyzer::Analyzer, document::Owner, store::FullStore};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{Principal, hash_password},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct Registration {
  pub username: String,
  pub password: String,
}

/// `POST /user/registration`
pub async fn register<S, A>(
  State(state): State<AppState<S, A>>,
  Json(body): Json<Registration>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let username = body.username.trim();
  if username.is_empty() || username.contains(':') {
    return Err(ApiError::BadRequest("username must be non-empty and must not contain ':'".into()));
  }
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".into()));
  }

  let hash = hash_password(&body.password)
    .map_err(|e| ApiError::Internal(e.to_string().into()))?;
  let owner = state
    .store
    .register_owner(username, &hash)
    .await
    .map_err(ApiError::store)?;

  Ok((StatusCode::CREATED, Json(owner)))
}

/// `POST /user/login`: the credentials are checked by the extractor.
pub async fn login(Principal(owner): Principal) -> Json<Owner> {
  tracing::debug!(username = %owner.username, "login");
  Json(owner)
}
