//! Vocabulary interning against the `pos_tags` and `syntactic_roles` tables.
//!
//! Creation follows read-check-then-insert, with the `UNIQUE (code)`
//! constraint as the arbiter. Another connection may insert the same code
//! between our check and our insert; the resulting constraint violation means
//! the row now exists, so it is re-read instead of reported.

use lexigraph_core::vocabulary::{VocabularyEntry, VocabularyKind};
use rusqlite::{Connection, ErrorCode, OptionalExtension as _};

/// Table and primary-key column backing a vocabulary.
pub fn table(kind: VocabularyKind) -> (&'static str, &'static str) {
  match kind {
    VocabularyKind::PartOfSpeech => ("pos_tags", "pos_tag_id"),
    VocabularyKind::SyntacticRole => ("syntactic_roles", "syntactic_role_id"),
  }
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VocabularyEntry> {
  Ok(VocabularyEntry {
    id:          row.get(0)?,
    code:        row.get(1)?,
    description: row.get(2)?,
  })
}

/// Every entry of one vocabulary, ordered by id.
pub fn load_all(conn: &Connection, kind: VocabularyKind) -> rusqlite::Result<Vec<VocabularyEntry>> {
  let (table, id) = table(kind);
  let mut stmt =
    conn.prepare(&format!("SELECT {id}, code, description FROM {table} ORDER BY {id}"))?;
  let entries = stmt
    .query_map([], entry_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(entries)
}

pub fn find(
  conn: &Connection,
  kind: VocabularyKind,
  code: &str,
) -> rusqlite::Result<Option<VocabularyEntry>> {
  let (table, id) = table(kind);
  conn
    .query_row(
      &format!("SELECT {id}, code, description FROM {table} WHERE code = ?1"),
      rusqlite::params![code],
      entry_from_row,
    )
    .optional()
}

/// How a code was resolved.
#[derive(Debug)]
pub enum Interned {
  /// The row was already in the table.
  Existing(VocabularyEntry),
  /// We inserted the row.
  Created(VocabularyEntry),
  /// Our insert collided with a concurrent one; this is the winner's row.
  RaceLost(VocabularyEntry),
}

impl Interned {
  pub fn into_entry(self) -> VocabularyEntry {
    match self {
      Interned::Existing(e) | Interned::Created(e) | Interned::RaceLost(e) => e,
    }
  }
}

/// Resolve `code`, creating the row (with `description = code`) on a miss.
pub fn create_or_fetch(
  conn: &Connection,
  kind: VocabularyKind,
  code: &str,
) -> rusqlite::Result<Interned> {
  match find(conn, kind, code)? {
    Some(entry) => Ok(Interned::Existing(entry)),
    None => insert_or_reread(conn, kind, code),
  }
}

/// The insert half of [`create_or_fetch`].
pub fn insert_or_reread(
  conn: &Connection,
  kind: VocabularyKind,
  code: &str,
) -> rusqlite::Result<Interned> {
  let (table, _) = table(kind);
  let inserted = conn.execute(
    &format!("INSERT INTO {table} (code, description) VALUES (?1, ?1)"),
    rusqlite::params![code],
  );

  match inserted {
    Ok(_) => Ok(Interned::Created(VocabularyEntry {
      id:          conn.last_insert_rowid(),
      code:        code.to_owned(),
      description: code.to_owned(),
    })),
    Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
      find(conn, kind, code)?
        .map(Interned::RaceLost)
        .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }
    Err(e) => Err(e),
  }
}
