//! Error types for `lexigraph-core`.

use thiserror::Error;

use crate::vocabulary::VocabularyKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("document not found: {0}")]
  DocumentNotFound(i64),

  #[error("owner not found: {0:?}")]
  OwnerNotFound(String),

  #[error("{username:?} may not access document {document_id}")]
  AccessDenied { document_id: i64, username: String },

  #[error("username {0:?} is already taken")]
  UsernameTaken(String),

  #[error(
    "sentence {sentence}: `{field}` has {actual} entries, expected {expected}"
  )]
  MalformedAnalysis {
    /// 1-based position of the offending sentence in the analyzer response.
    sentence: usize,
    field:    &'static str,
    expected: usize,
    actual:   usize,
  },

  #[error("{kind} code {code:?} was not resolved before persisting")]
  UnresolvedVocabularyCode { kind: VocabularyKind, code: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse error category, stable across backends. The request layer maps each
/// kind onto exactly one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Forbidden,
  BadRequest,
  Internal,
}

/// Implemented by every error type that crosses a store boundary.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::DocumentNotFound(_) | Error::OwnerNotFound(_) => ErrorKind::NotFound,
      Error::AccessDenied { .. } => ErrorKind::Forbidden,
      Error::UsernameTaken(_) | Error::MalformedAnalysis { .. } => ErrorKind::BadRequest,
      Error::UnresolvedVocabularyCode { .. } => ErrorKind::Internal,
    }
  }
}
