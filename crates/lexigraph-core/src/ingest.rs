//! The storage-independent half of ingestion.
//!
//! [`IngestPlan::build`] validates an analyzer response and lays it out as
//! sentence and word rows with ordinals and positions assigned, still keyed
//! by tag *code*. Once a backend has interned the plan's codes,
//! [`IngestPlan::resolve`] swaps every code for its vocabulary id, leaving
//! rows that can be written in two bulk inserts.
//!
//! [`reassemble`] goes the other way, from stored rows back to the exchange
//! format.

use std::collections::{BTreeSet, HashMap};

use crate::{
  Error, Result,
  analysis::{SentenceAnalysis, validate_all},
  document::{Sentence, Word},
  vocabulary::{VocabularyKind, normalize_code},
};

// ─── Plan ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWord {
  pub position:   u32,
  pub surface:    String,
  pub lemma:      String,
  pub pos_code:   Option<String>,
  pub role_code:  Option<String>,
  pub head_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSentence {
  pub ordinal: u32,
  pub content: String,
  pub words:   Vec<PlannedWord>,
}

/// A validated analyzer response, laid out as rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestPlan {
  pub sentences: Vec<PlannedSentence>,
}

impl IngestPlan {
  /// Validate `analyses` and assign ordinals (sentences) and positions
  /// (words), both starting at 1, in input order.
  pub fn build(analyses: &[SentenceAnalysis]) -> Result<Self> {
    validate_all(analyses)?;

    let sentences = analyses
      .iter()
      .zip(1u32..)
      .map(|(analysis, ordinal)| PlannedSentence {
        ordinal,
        content: analysis.sentence.clone(),
        words: (0..analysis.word_count())
          .zip(1u32..)
          .map(|(i, position)| PlannedWord {
            position,
            surface:    analysis.words[i].clone(),
            lemma:      analysis.lemmas[i].clone(),
            pos_code:   normalize_code(analysis.pos_tags[i].as_deref())
              .map(str::to_owned),
            role_code:  normalize_code(analysis.dep_tags[i].as_deref())
              .map(str::to_owned),
            head_index: analysis.head_ids[i],
          })
          .collect(),
      })
      .collect();

    Ok(Self { sentences })
  }

  pub fn sentence_count(&self) -> usize { self.sentences.len() }

  pub fn word_count(&self) -> usize {
    self.sentences.iter().map(|s| s.words.len()).sum()
  }

  /// Every distinct code of `kind` the plan refers to.
  pub fn codes(&self, kind: VocabularyKind) -> BTreeSet<String> {
    self
      .sentences
      .iter()
      .flat_map(|s| &s.words)
      .filter_map(|w| match kind {
        VocabularyKind::PartOfSpeech => w.pos_code.clone(),
        VocabularyKind::SyntacticRole => w.role_code.clone(),
      })
      .collect()
  }

  /// Replace tag codes with vocabulary ids. Every code returned by
  /// [`IngestPlan::codes`] must be present in the matching map.
  pub fn resolve(
    self,
    pos_ids: &HashMap<String, i64>,
    role_ids: &HashMap<String, i64>,
  ) -> Result<Vec<SentenceRow>> {
    let lookup = |kind: VocabularyKind,
                  map: &HashMap<String, i64>,
                  code: Option<String>|
     -> Result<Option<i64>> {
      code
        .map(|code| {
          map
            .get(&code)
            .copied()
            .ok_or(Error::UnresolvedVocabularyCode { kind, code })
        })
        .transpose()
    };

    self
      .sentences
      .into_iter()
      .map(|sentence| -> Result<SentenceRow> {
        let words = sentence
          .words
          .into_iter()
          .map(|word| -> Result<WordRow> {
            Ok(WordRow {
              position:          word.position,
              surface:           word.surface,
              lemma:             word.lemma,
              pos_tag_id:        lookup(
                VocabularyKind::PartOfSpeech,
                pos_ids,
                word.pos_code,
              )?,
              syntactic_role_id: lookup(
                VocabularyKind::SyntacticRole,
                role_ids,
                word.role_code,
              )?,
              head_index:        word.head_index,
            })
          })
          .collect::<Result<Vec<_>>>()?;
        Ok(SentenceRow { ordinal: sentence.ordinal, content: sentence.content, words })
      })
      .collect()
  }
}

// ─── Resolved rows ───────────────────────────────────────────────────────────

/// A sentence ready to insert; the document id is supplied by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceRow {
  pub ordinal: u32,
  pub content: String,
  pub words:   Vec<WordRow>,
}

/// A word ready to insert; the sentence id is supplied by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRow {
  pub position:          u32,
  pub surface:           String,
  pub lemma:             String,
  pub pos_tag_id:        Option<i64>,
  pub syntactic_role_id: Option<i64>,
  pub head_index:        u32,
}

// ─── Reassembly ──────────────────────────────────────────────────────────────

/// Rebuild the exchange format from stored rows.
///
/// `sentences` must be in ordinal order and `words` in (sentence, position)
/// order. Tag ids missing from the lookups come back as `null` codes.
pub fn reassemble(
  sentences: &[Sentence],
  words: &[Word],
  pos_codes: &HashMap<i64, String>,
  role_codes: &HashMap<i64, String>,
) -> Vec<SentenceAnalysis> {
  let mut by_sentence: HashMap<i64, Vec<&Word>> = HashMap::new();
  for word in words {
    by_sentence.entry(word.sentence_id).or_default().push(word);
  }

  sentences
    .iter()
    .map(|sentence| {
      let words = by_sentence.remove(&sentence.sentence_id).unwrap_or_default();
      SentenceAnalysis {
        sentence: sentence.content.clone(),
        words:    words.iter().map(|w| w.surface.clone()).collect(),
        lemmas:   words.iter().map(|w| w.lemma.clone()).collect(),
        pos_tags: words
          .iter()
          .map(|w| w.pos_tag_id.and_then(|id| pos_codes.get(&id).cloned()))
          .collect(),
        dep_tags: words
          .iter()
          .map(|w| w.syntactic_role_id.and_then(|id| role_codes.get(&id).cloned()))
          .collect(),
        head_ids: words.iter().map(|w| w.head_index).collect(),
      }
    })
    .collect()
}
