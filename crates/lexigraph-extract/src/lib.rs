//! Plain-text extraction from uploaded files.
//!
//! Uploads arrive as raw bytes plus the content type the client declared.
//! Three formats are understood: plain text, PDF, and Word (`.docx`). Pure
//! synchronous; callers on an async runtime should run it on a blocking
//! thread, since PDF extraction is CPU-bound.

mod docx;
pub mod error;

pub use error::{Error, Result};

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
  "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The supported formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  Text,
  Pdf,
  Docx,
}

impl Format {
  /// Resolve a `Content-Type` value. Parameters such as `; charset=utf-8`
  /// are ignored and the media type is matched case-insensitively.
  pub fn from_content_type(content_type: &str) -> Result<Self> {
    let media_type = content_type
      .split(';')
      .next()
      .unwrap_or_default()
      .trim()
      .to_ascii_lowercase();

    match media_type.as_str() {
      MIME_TEXT => Ok(Format::Text),
      MIME_PDF => Ok(Format::Pdf),
      MIME_DOCX => Ok(Format::Docx),
      "" => Err(Error::MissingContentType),
      _ => Err(Error::UnsupportedContentType(content_type.to_owned())),
    }
  }
}

/// Extract the text of `bytes`, interpreted according to `content_type`.
pub fn extract_text(bytes: &[u8], content_type: Option<&str>) -> Result<String> {
  let format = Format::from_content_type(content_type.ok_or(Error::MissingContentType)?)?;

  let text = match format {
    Format::Text => String::from_utf8_lossy(bytes).into_owned(),
    Format::Pdf => {
      pdf_extract::extract_text_from_mem(bytes).map_err(|e| Error::Pdf(e.to_string()))?
    }
    Format::Docx => docx::extract(bytes)?,
  };

  tracing::debug!(?format, bytes = bytes.len(), chars = text.chars().count(), "extracted text");
  Ok(text)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_text_is_decoded_as_utf8() {
    let text = extract_text("Кот спит.".as_bytes(), Some("text/plain")).unwrap();
    assert_eq!(text, "Кот спит.");
  }

  #[test]
  fn invalid_utf8_is_replaced_not_rejected() {
    let text = extract_text(b"ok \xff", Some(MIME_TEXT)).unwrap();
    assert_eq!(text, "ok \u{fffd}");
  }

  #[test]
  fn content_type_parameters_and_case_are_ignored() {
    assert_eq!(
      Format::from_content_type("Text/Plain; charset=UTF-8").unwrap(),
      Format::Text
    );
    assert_eq!(Format::from_content_type(MIME_DOCX).unwrap(), Format::Docx);
  }

  #[test]
  fn unknown_content_type_is_unsupported() {
    let err = extract_text(b"<html/>", Some("text/html")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedContentType(ref ct) if ct == "text/html"));
  }

  #[test]
  fn missing_content_type_is_rejected() {
    assert!(matches!(extract_text(b"hi", None), Err(Error::MissingContentType)));
    assert!(matches!(extract_text(b"hi", Some(" ")), Err(Error::MissingContentType)));
  }

  #[test]
  fn garbage_pdf_is_a_pdf_error() {
    let err = extract_text(b"definitely not a pdf", Some(MIME_PDF)).unwrap_err();
    assert!(matches!(err, Error::Pdf(_)));
  }
}
