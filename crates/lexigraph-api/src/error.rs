//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::multipart::MultipartError,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use lexigraph_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler or extractor.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  PayloadTooLarge(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store error onto a status by its classification.
  pub fn store<E>(error: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match error.kind() {
      ErrorKind::NotFound => ApiError::NotFound(error.to_string()),
      ErrorKind::Forbidden => ApiError::Forbidden(error.to_string()),
      ErrorKind::BadRequest => ApiError::BadRequest(error.to_string()),
      ErrorKind::Internal => ApiError::Internal(Box::new(error)),
    }
  }

  pub fn internal<E>(error: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    ApiError::Internal(Box::new(error))
  }
}

impl From<lexigraph_extract::Error> for ApiError {
  fn from(error: lexigraph_extract::Error) -> Self {
    // Every extraction failure is a property of the uploaded file.
    ApiError::BadRequest(error.to_string())
  }
}

impl From<MultipartError> for ApiError {
  fn from(error: MultipartError) -> Self {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
      ApiError::PayloadTooLarge(error.body_text())
    } else {
      ApiError::BadRequest(error.body_text())
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::PayloadTooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, m.clone()),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"lexigraph\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Error)]
  #[error("boom")]
  struct Boom(ErrorKind);

  impl Classify for Boom {
    fn kind(&self) -> ErrorKind { self.0 }
  }

  #[test]
  fn store_errors_map_by_kind() {
    let status = |kind| ApiError::store(Boom(kind)).into_response().status();
    assert_eq!(status(ErrorKind::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
    assert_eq!(status(ErrorKind::BadRequest), StatusCode::BAD_REQUEST);
    assert_eq!(status(ErrorKind::Internal), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[tokio::test]
  async fn internal_errors_hide_their_cause() {
    let res = ApiError::store(Boom(ErrorKind::Internal)).into_response();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "internal server error" }));
  }

  #[test]
  fn unauthorized_challenges_for_basic_credentials() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let challenge = res.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Basic"));
  }

  #[test]
  fn extraction_failures_are_bad_requests() {
    let err: ApiError = lexigraph_extract::Error::UnsupportedContentType("image/png".into()).into();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
  }
}
