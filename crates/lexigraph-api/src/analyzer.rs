//! HTTP client for the external linguistic analyzer.

use std::time::Duration;

use lexigraph_core::{
  analysis::SentenceAnalysis,
  analyzer::{Analyzer, TextRequest},
};
use reqwest::{Client, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
  #[error("analyzer request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("analyzer responded with {status}: {body}")]
  Status { status: StatusCode, body: String },
}

/// Talks to an analyzer exposing `POST /process`.
///
/// Cloning shares the inner [`reqwest::Client`] connection pool.
#[derive(Clone)]
pub struct HttpAnalyzer {
  client:   Client,
  endpoint: String,
}

impl HttpAnalyzer {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalyzerError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      endpoint: format!("{}/process", base_url.trim_end_matches('/')),
    })
  }
}

impl Analyzer for HttpAnalyzer {
  type Error = AnalyzerError;

  async fn analyze(&self, text: &str) -> Result<Vec<SentenceAnalysis>, AnalyzerError> {
    let resp = self
      .client
      .post(&self.endpoint)
      .json(&TextRequest { text: text.to_owned() })
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(AnalyzerError::Status { status, body });
    }

    let sentences: Vec<SentenceAnalysis> = resp.json().await?;
    tracing::debug!(chars = text.chars().count(), sentences = sentences.len(), "analyzer responded");
    Ok(sentences)
  }
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, routing::post};
  use tokio::net::TcpListener;

  use super::*;

  /// Serve `app` on an ephemeral port and return its base URL.
  async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{address}")
  }

  async fn echo_words(Json(request): Json<TextRequest>) -> Json<Vec<SentenceAnalysis>> {
    let words: Vec<String> = request.text.split_whitespace().map(str::to_owned).collect();
    Json(vec![SentenceAnalysis {
      sentence: request.text.clone(),
      lemmas:   words.iter().map(|w| w.to_lowercase()).collect(),
      pos_tags: vec![Some("X".into()); words.len()],
      dep_tags: vec![None; words.len()],
      head_ids: vec![0; words.len()],
      words,
    }])
  }

  #[tokio::test]
  async fn posts_text_and_parses_the_response() {
    let base = serve(Router::new().route("/process", post(echo_words))).await;
    let analyzer = HttpAnalyzer::new(&format!("{base}/"), Duration::from_secs(5)).unwrap();

    let sentences = analyzer.analyze("Кот спит").await.unwrap();
    assert_eq!(sentences.len(), 1);
    assert_eq!(sentences[0].words, vec!["Кот", "спит"]);
    assert_eq!(sentences[0].lemmas, vec!["кот", "спит"]);
  }

  #[tokio::test]
  async fn error_status_is_reported() {
    let app = Router::new().route(
      "/process",
      post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model loading") }),
    );
    let base = serve(app).await;
    let analyzer = HttpAnalyzer::new(&base, Duration::from_secs(5)).unwrap();

    let err = analyzer.analyze("text").await.unwrap_err();
    assert!(matches!(
      err,
      AnalyzerError::Status { status, ref body } if status == StatusCode::SERVICE_UNAVAILABLE && body == "model loading"
    ));
  }
}
