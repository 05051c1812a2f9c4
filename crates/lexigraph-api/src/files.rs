//! Upload analysis and the per-owner file history.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/analyze` | Multipart field `file`; credentials optional |
//! | `GET`    | `/files/result` | The caller's documents, newest first |
//! | `GET`    | `/files/result/{id}` | 403 unless the caller owns it |
//! | `DELETE` | `/files/result/{id}` | 403 unless the caller owns it |

use axum::{
  Json,
  body::Bytes,
  extract::{Multipart, Path, State},
  http::StatusCode,
};
use lexigraph_core::{
  analysis::SentenceAnalysis,
  analyzer::Analyzer,
  document::{DocumentAnalysis, DocumentMetadata, NewDocument},
  store::FullStore,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;

use crate::{
  AppState,
  auth::{MaybePrincipal, Principal},
  error::ApiError,
};

/// Name of the multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Response body of `POST /analyze`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
  pub sentences: Vec<SentenceAnalysis>,
}

struct Upload {
  file_name:    String,
  content_type: Option<String>,
  bytes:        Bytes,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
  while let Some(field) = multipart.next_field().await? {
    if field.name() != Some(FILE_FIELD) {
      continue;
    }
    let file_name = field.file_name().unwrap_or("upload").to_owned();
    let content_type = field.content_type().map(str::to_owned);
    let bytes = field.bytes().await?;
    return Ok(Upload { file_name, content_type, bytes });
  }
  Err(ApiError::BadRequest(format!("multipart field `{FILE_FIELD}` is required")))
}

/// Unwrap the result of a blocking extraction. A parser that panicked was
/// fed a file it could not read, which is the uploader's problem.
fn extracted(
  joined: Result<lexigraph_extract::Result<String>, JoinError>,
) -> Result<String, ApiError> {
  match joined {
    Ok(result) => Ok(result?),
    Err(e) if e.is_panic() => {
      tracing::warn!(error = %e, "text extraction panicked");
      Err(ApiError::BadRequest("could not extract text".into()))
    }
    Err(e) => Err(ApiError::internal(e)),
  }
}

// ─── Analyze ──────────────────────────────────────────────────────────────────

/// `POST /analyze`: extract, analyze, persist, and echo the analysis.
pub async fn analyze<S, A>(
  State(state): State<AppState<S, A>>,
  MaybePrincipal(owner): MaybePrincipal,
  mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let upload = read_upload(&mut multipart).await?;

  let bytes = upload.bytes.clone();
  let content_type = upload.content_type.clone();
  let text = extracted(
    tokio::task::spawn_blocking(move || {
      lexigraph_extract::extract_text(&bytes, content_type.as_deref())
    })
    .await,
  )?;

  let analyses = state.analyzer.analyze(&text).await.map_err(ApiError::internal)?;

  let document = NewDocument {
    owner_id:  owner.as_ref().map(|o| o.owner_id),
    file_name: upload.file_name,
    content:   upload.bytes.to_vec(),
  };
  let sentences = state
    .store
    .ingest(document, analyses)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(AnalyzeResponse { sentences }))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /files/result`
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  Principal(owner): Principal,
) -> Result<Json<Vec<DocumentMetadata>>, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let documents = state
    .store
    .list_documents(&owner.username)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(documents))
}

/// `GET /files/result/{id}`
pub async fn get_one<S, A>(
  State(state): State<AppState<S, A>>,
  Principal(owner): Principal,
  Path(id): Path<i64>,
) -> Result<Json<DocumentAnalysis>, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let analysis = state
    .store
    .analysis_for_document(id, &owner.username)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(analysis))
}

/// `DELETE /files/result/{id}`
pub async fn delete_one<S, A>(
  State(state): State<AppState<S, A>>,
  Principal(owner): Principal,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  state
    .store
    .delete_document(id, &owner.username)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use axum::response::IntoResponse;

  use super::*;

  #[tokio::test]
  async fn panicking_extraction_is_a_bad_request() {
    let joined = tokio::task::spawn_blocking(|| -> lexigraph_extract::Result<String> {
      panic!("malformed xref table")
    })
    .await;

    let err = extracted(joined).unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(ref m) if m == "could not extract text"));
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn extraction_errors_pass_through() {
    let joined = tokio::task::spawn_blocking(|| lexigraph_extract::extract_text(b"x", None)).await;
    assert!(matches!(extracted(joined), Err(ApiError::BadRequest(_))));

    let joined = tokio::task::spawn_blocking(|| {
      lexigraph_extract::extract_text("Кот спит".as_bytes(), Some("text/plain"))
    })
    .await;
    assert_eq!(extracted(joined).unwrap(), "Кот спит");
  }
}
