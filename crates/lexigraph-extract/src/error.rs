//! Error types for text extraction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unsupported content type: {0}")]
  UnsupportedContentType(String),

  #[error("content type is missing")]
  MissingContentType,

  #[error("PDF extraction failed: {0}")]
  Pdf(String),

  #[error("DOCX extraction failed: {0}")]
  Docx(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
