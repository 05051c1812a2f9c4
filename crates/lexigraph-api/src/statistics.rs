//! Handlers for `/statistics/words` endpoints.
//!
//! Statistics are an open read surface: only `/me` needs credentials, and
//! that only to know whose documents to count.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use lexigraph_core::{analyzer::Analyzer, statistics::WordStatistics, store::FullStore};
use serde::Deserialize;

use crate::{AppState, auth::Principal, error::ApiError};

/// `GET /statistics/words`
pub async fn global<S, A>(
  State(state): State<AppState<S, A>>,
) -> Result<Json<Vec<WordStatistics>>, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let stats = state.store.global_statistics().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}

/// `GET /statistics/words/me`
pub async fn mine<S, A>(
  State(state): State<AppState<S, A>>,
  Principal(owner): Principal,
) -> Result<Json<Vec<WordStatistics>>, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let stats = state
    .store
    .statistics_for_owner(&owner.username)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stats))
}

/// `GET /statistics/words/file/{file_id}`
pub async fn for_file<S, A>(
  State(state): State<AppState<S, A>>,
  Path(file_id): Path<i64>,
) -> Result<Json<Vec<WordStatistics>>, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let stats = state
    .store
    .statistics_for_document(file_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub word: String,
}

/// `GET /statistics/words/search?word=<surface form>`
pub async fn search<S, A>(
  State(state): State<AppState<S, A>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<WordStatistics>, ApiError>
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let stats = state
    .store
    .statistics_for_word(&params.word)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stats))
}
