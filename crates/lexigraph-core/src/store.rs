//! Store traits.
//!
//! Backends (e.g. `lexigraph-store-sqlite`) implement all of them; the request
//! layer depends only on these abstractions.
//!
//! Document reads are split across two traits on purpose:
//!
//! - [`StatisticsStore`] is the open read surface. Its queries are scoped by
//!   their predicate (everything, one owner, one document, one word) and do
//!   not check who is asking.
//! - [`GuardedDocumentStore`] exposes a single document's contents. Every path
//!   goes through [`GuardedDocumentStore::authorize_document_access`], and the
//!   row-level reads take the [`Document`] it returned.

use std::future::Future;

use crate::{
  Classify, Error,
  analysis::SentenceAnalysis,
  document::{Document, DocumentAnalysis, DocumentMetadata, NewDocument, Owner, Sentence, Word},
  statistics::WordStatistics,
  vocabulary::{VocabularyEntry, VocabularyKind},
};

/// Shared error type for every store trait.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;
}

// ─── Owners, documents, vocabularies ─────────────────────────────────────────

pub trait CorpusStore: Store {
  /// Persist a new owner. Fails with `UsernameTaken` if the name exists.
  fn register_owner<'a>(
    &'a self,
    username: &'a str,
    password_hash: &'a str,
  ) -> impl Future<Output = Result<Owner, Self::Error>> + Send + 'a;

  /// Look up an owner by username. Returns `None` if not found.
  fn find_owner<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Owner>, Self::Error>> + Send + 'a;

  /// Persist `document` and the sentence/word graph described by `analyses`,
  /// interning tag codes as needed. Returns `analyses` unchanged.
  ///
  /// The response is validated before anything is written. The document row
  /// is committed first; sentences and words follow in one transaction, so a
  /// failure there can leave a document with no sentences but never one with
  /// only some of them.
  fn ingest(
    &self,
    document: NewDocument,
    analyses: Vec<SentenceAnalysis>,
  ) -> impl Future<Output = Result<Vec<SentenceAnalysis>, Self::Error>> + Send + '_;

  /// All entries of one vocabulary, ordered by id.
  fn vocabulary(
    &self,
    kind: VocabularyKind,
  ) -> impl Future<Output = Result<Vec<VocabularyEntry>, Self::Error>> + Send + '_;
}

// ─── Open read surface ───────────────────────────────────────────────────────

pub trait StatisticsStore: Store {
  /// Statistics over every word in the corpus.
  fn global_statistics(
    &self,
  ) -> impl Future<Output = Result<Vec<WordStatistics>, Self::Error>> + Send + '_;

  /// Statistics over words in documents owned by `username`.
  fn statistics_for_owner<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Vec<WordStatistics>, Self::Error>> + Send + 'a;

  /// Statistics over one document's words. Fails with `DocumentNotFound`
  /// for an unknown id.
  fn statistics_for_document(
    &self,
    document_id: i64,
  ) -> impl Future<Output = Result<Vec<WordStatistics>, Self::Error>> + Send + '_;

  /// Role counts for a single surface form across the corpus.
  fn statistics_for_word<'a>(
    &'a self,
    surface: &'a str,
  ) -> impl Future<Output = Result<WordStatistics, Self::Error>> + Send + 'a;

  /// Metadata of the documents owned by `username`, newest first.
  fn list_documents<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Vec<DocumentMetadata>, Self::Error>> + Send + 'a;
}

// ─── Owner-scoped document access ────────────────────────────────────────────

pub trait GuardedDocumentStore: Store {
  /// Load a document on behalf of `username`.
  ///
  /// Fails with `DocumentNotFound` if it does not exist, `OwnerNotFound` if
  /// `username` is unknown, and `AccessDenied` unless the document's owner
  /// is that user.
  fn authorize_document_access<'a>(
    &'a self,
    document_id: i64,
    username: &'a str,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// Sentences of an authorised document, in ordinal order.
  fn sentences<'a>(
    &'a self,
    document: &'a Document,
  ) -> impl Future<Output = Result<Vec<Sentence>, Self::Error>> + Send + 'a;

  /// Words of an authorised document, in sentence then position order.
  fn words<'a>(
    &'a self,
    document: &'a Document,
  ) -> impl Future<Output = Result<Vec<Word>, Self::Error>> + Send + 'a;

  /// The stored analysis of one document, rebuilt in exchange format.
  fn analysis_for_document<'a>(
    &'a self,
    document_id: i64,
    username: &'a str,
  ) -> impl Future<Output = Result<DocumentAnalysis, Self::Error>> + Send + 'a;

  /// Delete one document together with its sentences and words. Vocabulary
  /// rows are left in place.
  fn delete_document<'a>(
    &'a self,
    document_id: i64,
    username: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Convenience bound for code that needs the whole store surface.
pub trait FullStore: CorpusStore + StatisticsStore + GuardedDocumentStore {}

impl<T> FullStore for T where T: CorpusStore + StatisticsStore + GuardedDocumentStore {}

/// The access guard's decision: a document is readable only by its owner.
///
/// Ownership is compared by owner id, so an unowned document is readable by
/// nobody.
pub fn check_access(document: &Document, requester: &Owner) -> Result<(), Error> {
  if document.owner_id == Some(requester.owner_id) {
    Ok(())
  } else {
    Err(Error::AccessDenied {
      document_id: document.document_id,
      username:    requester.username.clone(),
    })
  }
}
