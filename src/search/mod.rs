//! Full-text search over a documentation corpus.
//!
//! This module provides tokenization, offline index building, the compiled
//! index with its encodings, and the query engine that ranks documents.

// Module declarations
pub(crate) mod builder;
pub(crate) mod codec;
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use builder::{IndexBuilder, build};
pub use codec::{decode_binary, decode_js, encode_binary, encode_js, write_binary};
pub use index::{
    DocId, DocumentRef, Field, IndexParts, ObjectEntry, ObjectType, Postings, SearchIndex,
};
pub use query::{MatchedObject, ParsedQuery, QueryEngine, SearchHit, search};
pub use scoring::{MatchKind, classify};
pub use tokenize::{DocumentTerms, Tokenizer};
