//! Documents and the linguistic graph derived from them.
//!
//! The graph is stored as flat rows linked by foreign keys:
//! document → sentences → words. No row holds a reference to its parent
//! object, only the parent's id, and each level is loaded on demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::SentenceAnalysis;

// ─── Owners ──────────────────────────────────────────────────────────────────

/// A registered user. Documents are optionally owned by exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
  pub owner_id:      Uuid,
  pub username:      String,
  /// Argon2 PHC string. Never serialised.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Input to ingestion: the raw upload and its owner.
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub owner_id:  Option<Uuid>,
  pub file_name: String,
  pub content:   Vec<u8>,
}

/// A stored upload. Immutable once created; only its derived sentences and
/// words change (by cascade delete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  pub document_id: i64,
  pub file_name:   String,
  pub content:     Vec<u8>,
  pub uploaded_at: DateTime<Utc>,
  pub owner_id:    Option<Uuid>,
}

/// Listing entry for a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
  pub id:          i64,
  pub file_name:   String,
  #[serde(rename = "uploadDate")]
  pub uploaded_at: DateTime<Utc>,
}

/// A document's full analysis, rebuilt from stored rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
  pub file_id:          i64,
  pub file_name:        String,
  pub analysis_results: Vec<SentenceAnalysis>,
}

// ─── Graph rows ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
  pub sentence_id: i64,
  pub document_id: i64,
  pub content:     String,
  /// 1-based, dense, in analyzer order.
  pub ordinal:     u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
  pub word_id:           i64,
  pub sentence_id:       i64,
  /// 1-based position within the sentence; the target of `head_index`.
  pub position:          u32,
  pub surface:           String,
  pub lemma:             String,
  pub pos_tag_id:        Option<i64>,
  pub syntactic_role_id: Option<i64>,
  pub head_index:        u32,
}
