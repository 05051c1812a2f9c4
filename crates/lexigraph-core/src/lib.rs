//! Core types and trait definitions for the lexigraph corpus service.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the linguistic data model, the analyzer wire format, the pure halves of the
//! ingestion and aggregation pipelines, and the store traits that backends
//! implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod analysis;
pub mod analyzer;
pub mod document;
pub mod error;
pub mod ingest;
pub mod statistics;
pub mod store;
pub mod vocabulary;

pub use error::{Classify, Error, ErrorKind, Result};
