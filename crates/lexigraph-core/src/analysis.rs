//! The analyzer exchange format.
//!
//! One [`SentenceAnalysis`] per sentence, in text order. Token-level data is
//! carried as parallel arrays indexed by the token's position in the
//! sentence; the JSON keys for the tag and head arrays are snake-case
//! (`pos_tags`, `dep_tags`, `head_id`).

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Linguistic analysis of a single sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceAnalysis {
  pub sentence: String,
  /// Surface forms, in sentence order. Every other array is indexed by this.
  #[serde(default)]
  pub words:    Vec<String>,
  #[serde(default)]
  pub lemmas:   Vec<String>,
  /// Part-of-speech codes; `null` when the analyzer produced no tag.
  #[serde(default)]
  pub pos_tags: Vec<Option<String>>,
  /// Syntactic-role codes; `null` when the analyzer produced no tag.
  #[serde(default)]
  pub dep_tags: Vec<Option<String>>,
  /// 1-based position of each word's governing word, `0` for the root.
  #[serde(rename = "head_id", default)]
  pub head_ids: Vec<u32>,
}

impl SentenceAnalysis {
  pub fn word_count(&self) -> usize { self.words.len() }

  /// Check that every parallel array has one entry per word.
  ///
  /// `number` is the sentence's 1-based position, used in the error.
  pub fn validate(&self, number: usize) -> Result<()> {
    let expected = self.words.len();
    let lengths = [
      ("lemmas", self.lemmas.len()),
      ("pos_tags", self.pos_tags.len()),
      ("dep_tags", self.dep_tags.len()),
      ("head_id", self.head_ids.len()),
    ];
    for (field, actual) in lengths {
      if actual != expected {
        return Err(Error::MalformedAnalysis {
          sentence: number,
          field,
          expected,
          actual,
        });
      }
    }
    Ok(())
  }
}

/// Validate a whole analyzer response before anything is persisted.
pub fn validate_all(analyses: &[SentenceAnalysis]) -> Result<()> {
  analyses
    .iter()
    .enumerate()
    .try_for_each(|(index, analysis)| analysis.validate(index + 1))
}
