//! The external linguistic analyzer, seen from the pipeline.
//!
//! The analyzer is an opaque service: it takes plain text and returns one
//! [`SentenceAnalysis`] per sentence, in text order.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::analysis::SentenceAnalysis;

/// Request body sent to the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRequest {
  pub text: String,
}

pub trait Analyzer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Split `text` into sentences and annotate every word.
  fn analyze<'a>(
    &'a self,
    text: &'a str,
  ) -> impl Future<Output = Result<Vec<SentenceAnalysis>, Self::Error>> + Send + 'a;
}
