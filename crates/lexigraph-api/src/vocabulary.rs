//! `GET /vocabulary/{kind}`: the stored tag vocabularies.

use axum::{
  Json,
  extract::{Path, State},
};
use lexigraph_core::{
  analyzer::Analyzer,
  store::FullStore,
  vocabulary::{VocabularyEntry, VocabularyKind},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// Path segment naming a vocabulary.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VocabularyPath {
  PosTags,
  SyntacticRoles,
}

impl From<VocabularyPath> for VocabularyKind {
  fn from(path: VocabularyPath) -> Self {
    match path {
      VocabularyPath::PosTags => VocabularyKind::PartOfSpeech,
      VocabularyPath::SyntacticRoles => VocabularyKind::SyntacticRole,
    }
  }
}

pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  Path(kind): Path<VocabularyPath>,
) -> Result<Json<Vec<VocabularyEntry>>, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let entries = state
    .store
    .vocabulary(kind.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}
