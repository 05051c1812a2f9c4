//! HTTP Basic authentication against the owners table.
//!
//! Credentials are verified on every request; there are no sessions or
//! tokens. Handlers that require a user take [`Principal`]. The upload
//! handler takes [`MaybePrincipal`], which lets anonymous requests through
//! but still rejects bad credentials.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use lexigraph_core::{
  analyzer::Analyzer,
  document::Owner,
  store::{CorpusStore, FullStore},
};
use rand_core::OsRng;

use crate::{AppState, error::ApiError};

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|hash| {
    Argon2::default()
      .verify_password(password.as_bytes(), &hash)
      .is_ok()
  })
}

// ─── Credentials ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

impl Credentials {
  /// Parse the `Authorization` header. `Ok(None)` means the header is absent;
  /// a header that is present but not valid Basic credentials is an error.
  pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
      return Ok(None);
    };

    let encoded = value
      .to_str()
      .ok()
      .and_then(|v| v.strip_prefix("Basic "))
      .ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
    let decoded = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
    let (username, password) = decoded.split_once(':').ok_or(ApiError::Unauthorized)?;

    Ok(Some(Self { username: username.to_owned(), password: password.to_owned() }))
  }
}

/// Resolve `credentials` to the owner they belong to.
pub async fn authenticate<S>(store: &S, credentials: &Credentials) -> Result<Owner, ApiError>
where
  S: CorpusStore,
{
  let owner = store
    .find_owner(&credentials.username)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if !verify_password(&credentials.password, &owner.password_hash) {
    tracing::debug!(username = %credentials.username, "rejected credentials");
    return Err(ApiError::Unauthorized);
  }
  Ok(owner)
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The authenticated owner making the request.
pub struct Principal(pub Owner);

/// The owner making the request, if the request carried credentials.
pub struct MaybePrincipal(pub Option<Owner>);

impl<S, A> FromRequestParts<AppState<S, A>> for Principal
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, A>,
  ) -> Result<Self, Self::Rejection> {
    let credentials = Credentials::from_headers(&parts.headers)?.ok_or(ApiError::Unauthorized)?;
    authenticate(state.store.as_ref(), &credentials).await.map(Principal)
  }
}

impl<S, A> FromRequestParts<AppState<S, A>> for MaybePrincipal
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, A>,
  ) -> Result<Self, Self::Rejection> {
    match Credentials::from_headers(&parts.headers)? {
      Some(credentials) => {
        let owner = authenticate(state.store.as_ref(), &credentials).await?;
        Ok(MaybePrincipal(Some(owner)))
      }
      None => Ok(MaybePrincipal(None)),
    }
  }
}
