//! Tag vocabularies: the corpus-wide, deduplicated code tables for
//! part-of-speech tags and syntactic roles.
//!
//! A vocabulary row is created the first time its code is seen during
//! ingestion, with `description == code`, and is reused by every later
//! occurrence. Rows are never deleted.
//!
//! [`VocabularyCache`] is the process-wide in-memory side of the interner.
//! Backends seed it once from the stored rows and add to it whenever they
//! create (or discover) a row, so an ingestion only touches the store for
//! codes it has never seen.

use std::{
  collections::{BTreeSet, HashMap},
  fmt,
  sync::{PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// The two independent vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyKind {
  PartOfSpeech,
  SyntacticRole,
}

impl VocabularyKind {
  pub const ALL: [VocabularyKind; 2] =
    [VocabularyKind::PartOfSpeech, VocabularyKind::SyntacticRole];
}

impl fmt::Display for VocabularyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      VocabularyKind::PartOfSpeech => "part-of-speech",
      VocabularyKind::SyntacticRole => "syntactic-role",
    })
  }
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// One row of a vocabulary table; unique on `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
  pub id:          i64,
  pub code:        String,
  pub description: String,
}

/// Normalise a raw tag code from the analyzer. Missing and blank codes mean
/// "no tag": the word is stored with a NULL reference instead of a
/// fabricated vocabulary row.
pub fn normalize_code(raw: Option<&str>) -> Option<&str> {
  raw.filter(|code| !code.trim().is_empty())
}

// ─── Cache ───────────────────────────────────────────────────────────────────

type CodeMap = HashMap<String, VocabularyEntry>;

/// Shared code → entry lookup for both vocabularies.
///
/// Entries are only ever added, matching the store, where vocabulary rows are
/// never updated or deleted.
#[derive(Debug, Default)]
pub struct VocabularyCache {
  part_of_speech: RwLock<CodeMap>,
  syntactic_role: RwLock<CodeMap>,
}

impl VocabularyCache {
  pub fn new() -> Self { Self::default() }

  fn map(&self, kind: VocabularyKind) -> &RwLock<CodeMap> {
    match kind {
      VocabularyKind::PartOfSpeech => &self.part_of_speech,
      VocabularyKind::SyntacticRole => &self.syntactic_role,
    }
  }

  pub fn get(&self, kind: VocabularyKind, code: &str) -> Option<VocabularyEntry> {
    self
      .map(kind)
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(code)
      .cloned()
  }

  pub fn insert(&self, kind: VocabularyKind, entry: VocabularyEntry) {
    self
      .map(kind)
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(entry.code.clone(), entry);
  }

  pub fn extend(
    &self,
    kind: VocabularyKind,
    entries: impl IntoIterator<Item = VocabularyEntry>,
  ) {
    let mut map = self.map(kind).write().unwrap_or_else(PoisonError::into_inner);
    for entry in entries {
      map.insert(entry.code.clone(), entry);
    }
  }

  pub fn len(&self, kind: VocabularyKind) -> usize {
    self.map(kind).read().unwrap_or_else(PoisonError::into_inner).len()
  }

  /// Split `codes` into ids already known to the cache and codes that still
  /// have to be resolved against the store.
  pub fn partition(
    &self,
    kind: VocabularyKind,
    codes: &BTreeSet<String>,
  ) -> (HashMap<String, i64>, Vec<String>) {
    let map = self.map(kind).read().unwrap_or_else(PoisonError::into_inner);
    let mut known = HashMap::with_capacity(codes.len());
    let mut missing = Vec::new();
    for code in codes {
      match map.get(code) {
        Some(entry) => {
          known.insert(code.clone(), entry.id);
        }
        None => missing.push(code.clone()),
      }
    }
    (known, missing)
  }

  /// Id → code lookup, used when reconstructing analyses from stored rows.
  pub fn codes_by_id(&self, kind: VocabularyKind) -> HashMap<i64, String> {
    self
      .map(kind)
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .values()
      .map(|entry| (entry.id, entry.code.clone()))
      .collect()
  }
}
