//! SQL schema for the lexigraph SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS owners (
    owner_id      TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,       -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- One row per upload. Created before the sentence/word batch is written and
-- never updated afterwards.
CREATE TABLE IF NOT EXISTS documents (
    document_id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name   TEXT NOT NULL,
    content     BLOB NOT NULL,
    uploaded_at TEXT NOT NULL,           -- ISO 8601 UTC; server-assigned
    owner_id    TEXT REFERENCES owners(owner_id)
);

CREATE TABLE IF NOT EXISTS sentences (
    sentence_id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(document_id) ON DELETE CASCADE,
    content     TEXT NOT NULL,
    ordinal     INTEGER NOT NULL,        -- 1-based, analyzer order
    UNIQUE (document_id, ordinal)
);

-- Vocabularies are shared by the whole corpus and never deleted.
CREATE TABLE IF NOT EXISTS pos_tags (
    pos_tag_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    code        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS syntactic_roles (
    syntactic_role_id INTEGER PRIMARY KEY AUTOINCREMENT,
    code              TEXT NOT NULL UNIQUE,
    description       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS words (
    word_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    sentence_id       INTEGER NOT NULL REFERENCES sentences(sentence_id) ON DELETE CASCADE,
    position          INTEGER NOT NULL,  -- 1-based within the sentence
    word_text         TEXT NOT NULL,
    lemma             TEXT NOT NULL,
    pos_tag_id        INTEGER REFERENCES pos_tags(pos_tag_id),
    syntactic_role_id INTEGER REFERENCES syntactic_roles(syntactic_role_id),
    head_index        INTEGER NOT NULL,  -- position of the governing word, 0 = root
    UNIQUE (sentence_id, position)
);

CREATE INDEX IF NOT EXISTS documents_owner_idx   ON documents(owner_id);
CREATE INDEX IF NOT EXISTS sentences_document_idx ON sentences(document_id);
CREATE INDEX IF NOT EXISTS words_sentence_idx    ON words(sentence_id);
CREATE INDEX IF NOT EXISTS words_text_idx        ON words(word_text);

PRAGMA user_version = 1;
";
