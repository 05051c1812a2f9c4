//! JSON REST API for lexigraph.
//!
//! Exposes an axum [`Router`] backed by any [`FullStore`] and [`Analyzer`].
//! Every route lives under `/api`:
//!
//! | Method   | Path | Auth |
//! |----------|------|------|
//! | `POST`   | `/user/registration` | none |
//! | `POST`   | `/user/login` | required |
//! | `POST`   | `/analyze` | optional |
//! | `GET`    | `/files/result` | required |
//! | `GET`    | `/files/result/{id}` | owner only |
//! | `DELETE` | `/files/result/{id}` | owner only |
//! | `GET`    | `/statistics/words` | none |
//! | `GET`    | `/statistics/words/me` | required |
//! | `GET`    | `/statistics/words/file/{file_id}` | none |
//! | `GET`    | `/statistics/words/search?word=` | none |
//! | `GET`    | `/vocabulary/{kind}` | none |

pub mod analyzer;
pub mod auth;
pub mod error;
pub mod files;
pub mod statistics;
pub mod users;
pub mod vocabulary;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use lexigraph_core::{analyzer::Analyzer, store::FullStore};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LEXIGRAPH_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  /// Base URL of the analyzer; `/process` is appended.
  pub analyzer_url:          String,
  #[serde(default = "default_analyzer_timeout")]
  pub analyzer_timeout_secs: u64,
  #[serde(default = "default_max_upload")]
  pub max_upload_bytes:      usize,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("lexigraph.db") }
fn default_analyzer_timeout() -> u64 { 60 }
fn default_max_upload() -> usize { 20 * 1024 * 1024 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, A> {
  pub store:    Arc<S>,
  pub analyzer: Arc<A>,
  pub config:   Arc<ServerConfig>,
}

// Derived `Clone` would require `S: Clone` and `A: Clone`.
impl<S, A> Clone for AppState<S, A> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      analyzer: Arc::clone(&self.analyzer),
      config:   Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router, with every route nested under `/api`.
pub fn router<S, A>(state: AppState<S, A>) -> Router
where
  S: FullStore + 'static,
  A: Analyzer + 'static,
{
  let max_upload = state.config.max_upload_bytes;

  let api = Router::new()
    // Users
    .route("/user/registration", post(users::register::<S, A>))
    .route("/user/login", post(users::login))
    // Documents
    .route("/analyze", post(files::analyze::<S, A>))
    .route("/files/result", get(files::list::<S, A>))
    .route(
      "/files/result/{id}",
      get(files::get_one::<S, A>).delete(files::delete_one::<S, A>),
    )
    // Statistics
    .route("/statistics/words", get(statistics::global::<S, A>))
    .route("/statistics/words/me", get(statistics::mine::<S, A>))
    .route("/statistics/words/file/{file_id}", get(statistics::for_file::<S, A>))
    .route("/statistics/words/search", get(statistics::search::<S, A>))
    // Vocabularies
    .route("/vocabulary/{kind}", get(vocabulary::list::<S, A>))
    .with_state(state);

  Router::new()
    .nest("/api", api)
    .layer(DefaultBodyLimit::max(max_upload))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
  use std::convert::Infallible;

  use axum::{
    body::Body,
    http::{Request, Response, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use lexigraph_core::analysis::SentenceAnalysis;
  use lexigraph_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  /// Splits text into one sentence per non-empty line. The first word of
  /// each sentence is the subject; the rest are predicates.
  struct FakeAnalyzer {
    fail: bool,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("analyzer unavailable")]
  struct Unavailable;

  impl Analyzer for FakeAnalyzer {
    type Error = Unavailable;

    async fn analyze(&self, text: &str) -> Result<Vec<SentenceAnalysis>, Unavailable> {
      if self.fail {
        return Err(Unavailable);
      }
      let sentences = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
          let words: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
          let roles = (0..words.len())
            .map(|i| {
              let role = if i == 0 { "Подлежащее" } else { "Сказуемое" };
              Some(role.to_owned())
            })
            .collect();
          let heads = (0..words.len()).map(|i| if i == 0 { 2 } else { 0 }).collect();
          SentenceAnalysis {
            sentence: line.to_owned(),
            lemmas:   words.iter().map(|w| w.to_lowercase()).collect(),
            pos_tags: vec![Some("X".to_owned()); words.len()],
            dep_tags: roles,
            head_ids: heads,
            words,
          }
        })
        .collect();
      Ok(sentences)
    }
  }

  async fn app_with(fail: bool) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(AppState {
      store:    Arc::new(store),
      analyzer: Arc::new(FakeAnalyzer { fail }),
      config:   Arc::new(ServerConfig {
        host:                  "127.0.0.1".into(),
        port:                  8080,
        store_path:            PathBuf::from(":memory:"),
        analyzer_url:          "http://analyzer.invalid".into(),
        analyzer_timeout_secs: 5,
        max_upload_bytes:      1024 * 1024,
      }),
    })
  }

  async fn app() -> Router { app_with(false).await }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  const BOUNDARY: &str = "lexigraph-test-boundary";

  fn multipart(field: &str, file_name: &str, content_type: &str, content: &str) -> String {
    format!(
      "--{BOUNDARY}\r\n\
       Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
       Content-Type: {content_type}\r\n\r\n\
       {content}\r\n\
       --{BOUNDARY}--\r\n"
    )
  }

  async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<(&str, &str)>,
    content_type: Option<String>,
    body: String,
  ) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, pass)) = auth {
      builder = builder.header(header::AUTHORIZATION, basic(user, pass));
    }
    if let Some(ct) = content_type {
      builder = builder.header(header::CONTENT_TYPE, ct);
    }
    let req = builder.body(Body::from(body)).unwrap();
    let res: Result<_, Infallible> = app.clone().oneshot(req).await;
    res.unwrap()
  }

  async fn json_body(res: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn get(app: &Router, uri: &str, auth: Option<(&str, &str)>) -> Response<Body> {
    send(app, "GET", uri, auth, None, String::new()).await
  }

  async fn register(app: &Router, user: &str, pass: &str) -> Response<Body> {
    let body = json!({ "username": user, "password": pass }).to_string();
    send(
      app,
      "POST",
      "/api/user/registration",
      None,
      Some("application/json".into()),
      body,
    )
    .await
  }

  async fn upload(
    app: &Router,
    auth: Option<(&str, &str)>,
    file_name: &str,
    content_type: &str,
    content: &str,
  ) -> Response<Body> {
    send(
      app,
      "POST",
      "/api/analyze",
      auth,
      Some(format!("multipart/form-data; boundary={BOUNDARY}")),
      multipart(files::FILE_FIELD, file_name, content_type, content),
    )
    .await
  }

  // ── Users ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_then_login() {
    let app = app().await;

    let res = register(&app, "alice", "secret").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let owner = json_body(res).await;
    assert_eq!(owner["username"], "alice");
    assert!(owner.get("password_hash").is_none());

    let res = send(&app, "POST", "/api/user/login", Some(("alice", "secret")), None, String::new()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["username"], "alice");

    let res = send(&app, "POST", "/api/user/login", Some(("alice", "wrong")), None, String::new()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn duplicate_registration_is_rejected() {
    let app = app().await;
    assert_eq!(register(&app, "alice", "secret").await.status(), StatusCode::CREATED);
    assert_eq!(register(&app, "alice", "other").await.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn registration_validates_input() {
    let app = app().await;
    assert_eq!(register(&app, "", "secret").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(register(&app, "a:b", "secret").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(register(&app, "alice", "").await.status(), StatusCode::BAD_REQUEST);
  }

  // ── Analyze ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn anonymous_upload_is_analyzed_and_counted() {
    let app = app().await;

    let res = upload(&app, None, "cat.txt", "text/plain", "Кот спит\nКот ест").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let sentences = body["sentences"].as_array().unwrap();
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0]["words"], json!(["Кот", "спит"]));
    assert_eq!(sentences[0]["head_id"], json!([2, 0]));

    let stats = json_body(get(&app, "/api/statistics/words", None).await).await;
    let cat = stats
      .as_array()
      .unwrap()
      .iter()
      .find(|entry| entry["word"] == "Кот")
      .unwrap();
    assert_eq!(
      cat["statistics"],
      json!([{ "syntacticRoleDescription": "Подлежащее", "count": 2 }])
    );
  }

  #[tokio::test]
  async fn unsupported_content_type_is_rejected() {
    let app = app().await;
    let res = upload(&app, None, "cat.png", "image/png", "not text").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn missing_file_field_is_rejected() {
    let app = app().await;
    let res = send(
      &app,
      "POST",
      "/api/analyze",
      None,
      Some(format!("multipart/form-data; boundary={BOUNDARY}")),
      multipart("document", "cat.txt", "text/plain", "Кот спит"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn bad_credentials_on_upload_are_rejected() {
    let app = app().await;
    let res = upload(&app, Some(("ghost", "nope")), "cat.txt", "text/plain", "Кот спит").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn analyzer_failure_is_an_internal_error() {
    let app = app_with(true).await;
    let res = upload(&app, None, "cat.txt", "text/plain", "Кот спит").await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(res).await, json!({ "error": "internal server error" }));
  }

  // ── Files ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn owner_manages_own_files() {
    let app = app().await;
    register(&app, "alice", "secret").await;
    register(&app, "bob", "hunter2").await;
    let alice = Some(("alice", "secret"));
    let bob = Some(("bob", "hunter2"));

    let res = upload(&app, alice, "essay.txt", "text/plain", "Кот спит").await;
    assert_eq!(res.status(), StatusCode::OK);

    let listing = json_body(get(&app, "/api/files/result", alice).await).await;
    let listing = listing.as_array().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["fileName"], "essay.txt");
    let id = listing[0]["id"].as_i64().unwrap();
    let uri = format!("/api/files/result/{id}");

    let res = get(&app, &uri, alice).await;
    assert_eq!(res.status(), StatusCode::OK);
    let analysis = json_body(res).await;
    assert_eq!(analysis["fileId"], id);
    assert_eq!(analysis["fileName"], "essay.txt");
    assert_eq!(analysis["analysisResults"][0]["words"], json!(["Кот", "спит"]));

    assert_eq!(get(&app, &uri, bob).await.status(), StatusCode::FORBIDDEN);
    assert!(json_body(get(&app, "/api/files/result", bob).await).await.as_array().unwrap().is_empty());

    let res = send(&app, "DELETE", &uri, bob, None, String::new()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = send(&app, "DELETE", &uri, alice, None, String::new()).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(get(&app, &uri, alice).await.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn file_listing_requires_credentials() {
    let app = app().await;
    let res = get(&app, "/api/files/result", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  // ── Statistics ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn personal_statistics_cover_only_own_documents() {
    let app = app().await;
    register(&app, "alice", "secret").await;
    let alice = Some(("alice", "secret"));

    upload(&app, alice, "mine.txt", "text/plain", "Кот спит").await;
    upload(&app, None, "anon.txt", "text/plain", "Пёс лает").await;

    let mine = json_body(get(&app, "/api/statistics/words/me", alice).await).await;
    let words: Vec<&str> = mine
      .as_array()
      .unwrap()
      .iter()
      .map(|entry| entry["word"].as_str().unwrap())
      .collect();
    assert_eq!(words, vec!["Кот", "спит"]);

    assert_eq!(get(&app, "/api/statistics/words/me", None).await.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn file_statistics_for_unknown_document_is_not_found() {
    let app = app().await;
    let res = get(&app, "/api/statistics/words/file/9999999", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn word_search_counts_roles_across_corpus() {
    let app = app().await;
    upload(&app, None, "a.txt", "text/plain", "Кот спит\nСпит кот").await;

    let res = get(&app, "/api/statistics/words/search?word=%D0%9A%D0%BE%D1%82", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["word"], "Кот");
    assert_eq!(
      body["statistics"],
      json!([{ "syntacticRoleDescription": "Подлежащее", "count": 1 }])
    );
  }

  // ── Vocabulary ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn vocabularies_list_interned_codes() {
    let app = app().await;
    upload(&app, None, "a.txt", "text/plain", "Кот спит").await;

    let roles = json_body(get(&app, "/api/vocabulary/syntactic-roles", None).await).await;
    let codes: Vec<&str> = roles
      .as_array()
      .unwrap()
      .iter()
      .map(|entry| entry["code"].as_str().unwrap())
      .collect();
    assert_eq!(codes, vec!["Подлежащее", "Сказуемое"]);

    let tags = json_body(get(&app, "/api/vocabulary/pos-tags", None).await).await;
    assert_eq!(tags.as_array().unwrap().len(), 1);

    let res = get(&app, "/api/vocabulary/lemmas", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }
}
