//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use lexigraph_core::document::{Document, DocumentMetadata, Owner, Sentence, Word};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row types ────────────────────────────────────────────────────────────
//
// Column values as read from SQLite, before text-encoded fields are decoded.
// Rows are read inside the connection thread; decoding happens afterwards so
// that decode errors surface as this crate's error type.

pub struct RawOwner {
  pub owner_id:      String,
  pub username:      String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawOwner {
  pub const COLUMNS: &'static str = "owner_id, username, password_hash, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      owner_id:      row.get(0)?,
      username:      row.get(1)?,
      password_hash: row.get(2)?,
      created_at:    row.get(3)?,
    })
  }

  pub fn into_owner(self) -> Result<Owner> {
    Ok(Owner {
      owner_id:      decode_uuid(&self.owner_id)?,
      username:      self.username,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawDocument {
  pub document_id: i64,
  pub file_name:   String,
  pub content:     Vec<u8>,
  pub uploaded_at: String,
  pub owner_id:    Option<String>,
}

impl RawDocument {
  pub const COLUMNS: &'static str =
    "document_id, file_name, content, uploaded_at, owner_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id: row.get(0)?,
      file_name:   row.get(1)?,
      content:     row.get(2)?,
      uploaded_at: row.get(3)?,
      owner_id:    row.get(4)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      document_id: self.document_id,
      file_name:   self.file_name,
      content:     self.content,
      uploaded_at: decode_dt(&self.uploaded_at)?,
      owner_id:    self.owner_id.as_deref().map(decode_uuid).transpose()?,
    })
  }
}

pub struct RawMetadata {
  pub document_id: i64,
  pub file_name:   String,
  pub uploaded_at: String,
}

impl RawMetadata {
  pub fn into_metadata(self) -> Result<DocumentMetadata> {
    Ok(DocumentMetadata {
      id:          self.document_id,
      file_name:   self.file_name,
      uploaded_at: decode_dt(&self.uploaded_at)?,
    })
  }
}

// Sentence and word rows hold no encoded columns and map straight onto the
// domain types.

pub fn sentence_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sentence> {
  Ok(Sentence {
    sentence_id: row.get(0)?,
    document_id: row.get(1)?,
    content:     row.get(2)?,
    ordinal:     row.get(3)?,
  })
}

pub fn word_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Word> {
  Ok(Word {
    word_id:           row.get(0)?,
    sentence_id:       row.get(1)?,
    position:          row.get(2)?,
    surface:           row.get(3)?,
    lemma:             row.get(4)?,
    pos_tag_id:        row.get(5)?,
    syntactic_role_id: row.get(6)?,
    head_index:        row.get(7)?,
  })
}
