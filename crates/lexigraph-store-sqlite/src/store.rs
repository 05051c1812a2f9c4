//! [`SqliteStore`], the SQLite implementation of the lexigraph store traits.

use std::{
  collections::{BTreeSet, HashMap},
  path::Path,
  sync::Arc,
  time::Duration,
};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value};
use uuid::Uuid;

use lexigraph_core::{
  analysis::SentenceAnalysis,
  document::{Document, DocumentAnalysis, DocumentMetadata, NewDocument, Owner, Sentence, Word},
  ingest::{IngestPlan, SentenceRow, reassemble},
  statistics::{self, StatisticRow, WordStatistics},
  store::{CorpusStore, GuardedDocumentStore, StatisticsStore, Store, check_access},
  vocabulary::{VocabularyCache, VocabularyEntry, VocabularyKind},
};

use crate::{
  Error, Result,
  encode::{
    RawDocument, RawMetadata, RawOwner, encode_dt, encode_uuid, sentence_from_row,
    word_from_row,
  },
  interner::{self, Interned},
  schema::SCHEMA,
};

/// How long a writer waits on another connection's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A lexigraph corpus backed by a single SQLite file.
///
/// Cloning is cheap: the connection handle and the vocabulary cache are both
/// reference-counted, so every clone shares one interner.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  vocabulary:      Arc<VocabularyCache>,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, initialise the schema and warm the
  /// vocabulary cache.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self { conn, vocabulary: Arc::new(VocabularyCache::new()) };
    store.init_schema().await?;
    store.refresh_vocabulary().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Reload both vocabularies into the cache. Rows created by other
  /// connections since the last load become visible.
  async fn refresh_vocabulary(&self) -> Result<()> {
    let (pos, roles) = self
      .conn
      .call(|conn| {
        Ok((
          interner::load_all(conn, VocabularyKind::PartOfSpeech)?,
          interner::load_all(conn, VocabularyKind::SyntacticRole)?,
        ))
      })
      .await?;

    self.vocabulary.extend(VocabularyKind::PartOfSpeech, pos);
    self.vocabulary.extend(VocabularyKind::SyntacticRole, roles);
    Ok(())
  }

  /// Resolve every code in `codes` to a vocabulary id, creating rows for
  /// codes nobody has used before. Codes arrive normalised from the ingest
  /// plan, so none is blank.
  async fn intern(
    &self,
    kind: VocabularyKind,
    codes: BTreeSet<String>,
  ) -> Result<HashMap<String, i64>> {
    let (mut ids, missing) = self.vocabulary.partition(kind, &codes);
    if missing.is_empty() {
      return Ok(ids);
    }

    let resolved: Vec<Interned> = self
      .conn
      .call(move |conn| {
        Ok(
          missing
            .iter()
            .map(|code| interner::create_or_fetch(&*conn, kind, code))
            .collect::<rusqlite::Result<Vec<_>>>()?,
        )
      })
      .await?;

    for interned in resolved {
      match &interned {
        Interned::Created(entry) => {
          tracing::info!(%kind, code = %entry.code, id = entry.id, "new vocabulary code");
        }
        Interned::RaceLost(entry) => {
          tracing::debug!(
            %kind,
            code = %entry.code,
            id = entry.id,
            "vocabulary code was created concurrently; reusing existing row"
          );
        }
        Interned::Existing(_) => {}
      }
      let entry = interned.into_entry();
      ids.insert(entry.code.clone(), entry.id);
      self.vocabulary.insert(kind, entry);
    }

    Ok(ids)
  }

  /// Insert the document row on its own. Returns the new id.
  async fn insert_document(&self, document: NewDocument) -> Result<i64> {
    let owner_str = document.owner_id.map(encode_uuid);
    let at_str    = encode_dt(Utc::now());

    let document_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (file_name, content, uploaded_at, owner_id)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![document.file_name, document.content, at_str, owner_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(document_id)
  }

  /// Write all sentences, then all words, in one transaction.
  ///
  /// The transaction is the bulk unit: rows go through one cached statement
  /// per table and become visible together on commit, or not at all.
  async fn insert_graph(&self, document_id: i64, rows: Vec<SentenceRow>) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut sentence_ids = Vec::with_capacity(rows.len());
        {
          let mut stmt = tx.prepare_cached(
            "INSERT INTO sentences (document_id, content, ordinal) VALUES (?1, ?2, ?3)",
          )?;
          for row in &rows {
            sentence_ids.push(stmt.insert(rusqlite::params![
              document_id,
              row.content,
              row.ordinal,
            ])?);
          }
        }

        {
          let mut stmt = tx.prepare_cached(
            "INSERT INTO words (
               sentence_id, position, word_text, lemma,
               pos_tag_id, syntactic_role_id, head_index
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for (sentence_id, row) in sentence_ids.iter().zip(&rows) {
            for word in &row.words {
              stmt.execute(rusqlite::params![
                sentence_id,
                word.position,
                word.surface,
                word.lemma,
                word.pos_tag_id,
                word.syntactic_role_id,
                word.head_index,
              ])?;
            }
          }
        }

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_document(&self, document_id: i64) -> Result<Option<Document>> {
    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM documents WHERE document_id = ?1", RawDocument::COLUMNS),
            rusqlite::params![document_id],
            RawDocument::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn document_exists(&self, document_id: i64) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM documents WHERE document_id = ?1",
            rusqlite::params![document_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(exists)
  }

  /// Aggregated `(word, role description, count)` rows for one scope,
  /// ordered by word and then role description.
  async fn statistic_rows(&self, scope: Scope) -> Result<Vec<StatisticRow>> {
    let (predicate, params) = scope.filter();

    let rows = self
      .conn
      .call(move |conn| {
        // Words without a syntactic role have nothing to count and drop out
        // at the inner join.
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT w.word_text, r.description, COUNT(*)
           FROM words w
           JOIN syntactic_roles r ON r.syntactic_role_id = w.syntactic_role_id
           JOIN sentences       s ON s.sentence_id       = w.sentence_id
           JOIN documents       d ON d.document_id       = s.document_id
           LEFT JOIN owners     o ON o.owner_id          = d.owner_id
           WHERE {predicate}
           GROUP BY w.word_text, r.description
           ORDER BY w.word_text, r.description"
        ))?;

        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            let count: i64 = row.get(2)?;
            Ok(StatisticRow {
              word:             row.get(0)?,
              role_description: row.get(1)?,
              count:            u64::try_from(count).unwrap_or_default(),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Id → code lookups covering every tag id referenced by `words`.
  async fn tag_codes(
    &self,
    words: &[Word],
  ) -> Result<(HashMap<i64, String>, HashMap<i64, String>)> {
    let lookups = || {
      (
        self.vocabulary.codes_by_id(VocabularyKind::PartOfSpeech),
        self.vocabulary.codes_by_id(VocabularyKind::SyntacticRole),
      )
    };

    let (pos, roles) = lookups();
    let complete = words.iter().all(|w| {
      w.pos_tag_id.is_none_or(|id| pos.contains_key(&id))
        && w.syntactic_role_id.is_none_or(|id| roles.contains_key(&id))
    });
    if complete {
      return Ok((pos, roles));
    }

    // Another connection interned codes this cache has not seen yet.
    self.refresh_vocabulary().await?;
    Ok(lookups())
  }
}

// ─── Statistics scopes ───────────────────────────────────────────────────────

enum Scope {
  All,
  Owner(String),
  Document(i64),
  Word(String),
}

impl Scope {
  fn filter(self) -> (&'static str, Vec<Value>) {
    match self {
      Scope::All => ("1 = 1", Vec::new()),
      Scope::Owner(username) => ("o.username = ?1", vec![Value::Text(username)]),
      Scope::Document(id) => ("d.document_id = ?1", vec![Value::Integer(id)]),
      Scope::Word(surface) => ("w.word_text = ?1", vec![Value::Text(surface)]),
    }
  }
}

// ─── Trait impls ─────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = Error;
}

impl CorpusStore for SqliteStore {
  async fn register_owner(&self, username: &str, password_hash: &str) -> Result<Owner> {
    let owner = Owner {
      owner_id:      Uuid::new_v4(),
      username:      username.to_owned(),
      password_hash: password_hash.to_owned(),
      created_at:    Utc::now(),
    };

    let id_str = encode_uuid(owner.owner_id);
    let name   = owner.username.clone();
    let hash   = owner.password_hash.clone();
    let at_str = encode_dt(owner.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO owners (owner_id, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (username) DO NOTHING",
          rusqlite::params![id_str, name, hash, at_str],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(lexigraph_core::Error::UsernameTaken(owner.username).into());
    }

    tracing::info!(username = %owner.username, owner_id = %owner.owner_id, "registered owner");
    Ok(owner)
  }

  async fn find_owner(&self, username: &str) -> Result<Option<Owner>> {
    let name = username.to_owned();

    let raw: Option<RawOwner> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM owners WHERE username = ?1", RawOwner::COLUMNS),
            rusqlite::params![name],
            RawOwner::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawOwner::into_owner).transpose()
  }

  async fn ingest(
    &self,
    document: NewDocument,
    analyses: Vec<SentenceAnalysis>,
  ) -> Result<Vec<SentenceAnalysis>> {
    let plan = IngestPlan::build(&analyses)?;
    let file_name = document.file_name.clone();

    let document_id = self.insert_document(document).await?;

    let pos_ids = self
      .intern(VocabularyKind::PartOfSpeech, plan.codes(VocabularyKind::PartOfSpeech))
      .await?;
    let role_ids = self
      .intern(VocabularyKind::SyntacticRole, plan.codes(VocabularyKind::SyntacticRole))
      .await?;

    let sentences = plan.sentence_count();
    let words = plan.word_count();
    let rows = plan.resolve(&pos_ids, &role_ids)?;
    self.insert_graph(document_id, rows).await?;

    tracing::info!(document_id, file_name = %file_name, sentences, words, "ingested document");
    Ok(analyses)
  }

  async fn vocabulary(&self, kind: VocabularyKind) -> Result<Vec<VocabularyEntry>> {
    let entries = self
      .conn
      .call(move |conn| Ok(interner::load_all(conn, kind)?))
      .await?;

    self.vocabulary.extend(kind, entries.iter().cloned());
    Ok(entries)
  }
}

impl StatisticsStore for SqliteStore {
  async fn global_statistics(&self) -> Result<Vec<WordStatistics>> {
    Ok(statistics::group(self.statistic_rows(Scope::All).await?))
  }

  async fn statistics_for_owner(&self, username: &str) -> Result<Vec<WordStatistics>> {
    let rows = self.statistic_rows(Scope::Owner(username.to_owned())).await?;
    Ok(statistics::group(rows))
  }

  async fn statistics_for_document(&self, document_id: i64) -> Result<Vec<WordStatistics>> {
    if !self.document_exists(document_id).await? {
      return Err(lexigraph_core::Error::DocumentNotFound(document_id).into());
    }
    let rows = self.statistic_rows(Scope::Document(document_id)).await?;
    Ok(statistics::group(rows))
  }

  async fn statistics_for_word(&self, surface: &str) -> Result<WordStatistics> {
    let rows = self.statistic_rows(Scope::Word(surface.to_owned())).await?;
    Ok(statistics::for_word(surface, rows))
  }

  async fn list_documents(&self, username: &str) -> Result<Vec<DocumentMetadata>> {
    let name = username.to_owned();

    let raws: Vec<RawMetadata> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT d.document_id, d.file_name, d.uploaded_at
           FROM documents d
           JOIN owners o ON o.owner_id = d.owner_id
           WHERE o.username = ?1
           ORDER BY d.uploaded_at DESC, d.document_id DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![name], |row| {
            Ok(RawMetadata {
              document_id: row.get(0)?,
              file_name:   row.get(1)?,
              uploaded_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMetadata::into_metadata).collect()
  }
}

impl GuardedDocumentStore for SqliteStore {
  async fn authorize_document_access(&self, document_id: i64, username: &str) -> Result<Document> {
    let document = self
      .get_document(document_id)
      .await?
      .ok_or(lexigraph_core::Error::DocumentNotFound(document_id))?;

    let requester = self
      .find_owner(username)
      .await?
      .ok_or_else(|| lexigraph_core::Error::OwnerNotFound(username.to_owned()))?;

    check_access(&document, &requester)?;
    Ok(document)
  }

  async fn sentences(&self, document: &Document) -> Result<Vec<Sentence>> {
    let document_id = document.document_id;

    let sentences = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT sentence_id, document_id, content, ordinal
           FROM sentences
           WHERE document_id = ?1
           ORDER BY ordinal",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![document_id], sentence_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(sentences)
  }

  async fn words(&self, document: &Document) -> Result<Vec<Word>> {
    let document_id = document.document_id;

    let words = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT w.word_id, w.sentence_id, w.position, w.word_text, w.lemma,
                  w.pos_tag_id, w.syntactic_role_id, w.head_index
           FROM words w
           JOIN sentences s ON s.sentence_id = w.sentence_id
           WHERE s.document_id = ?1
           ORDER BY s.ordinal, w.position",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![document_id], word_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(words)
  }

  async fn analysis_for_document(
    &self,
    document_id: i64,
    username: &str,
  ) -> Result<DocumentAnalysis> {
    let document = self.authorize_document_access(document_id, username).await?;
    let sentences = self.sentences(&document).await?;
    let words = self.words(&document).await?;
    let (pos_codes, role_codes) = self.tag_codes(&words).await?;

    Ok(DocumentAnalysis {
      file_id:          document.document_id,
      file_name:        document.file_name,
      analysis_results: reassemble(&sentences, &words, &pos_codes, &role_codes),
    })
  }

  async fn delete_document(&self, document_id: i64, username: &str) -> Result<()> {
    let document = self.authorize_document_access(document_id, username).await?;
    let id = document.document_id;

    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM documents WHERE document_id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;

    tracing::info!(document_id, username, "deleted document");
    Ok(())
  }
}
