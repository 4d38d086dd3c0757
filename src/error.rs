//! Error handling types and utilities.

use crate::search::DocId;

/// A specialized Result type for docsearch plumbing (file I/O, CLI, server).
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase. The index pipeline itself
/// returns the typed errors below.
pub type Result<T> = anyhow::Result<T>;

/// Malformed or duplicate corpus input. Fatal to the whole build; no partial
/// index is ever produced alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("document #{position} has an empty docname")]
    EmptyDocname { position: usize },
    #[error("docname '{docname}' is claimed by documents #{first} and #{second}")]
    DuplicateDocname {
        docname: String,
        first: usize,
        second: usize,
    },
    #[error("object '{name}' in '{docname}' has malformed anchor '{anchor}'")]
    MalformedAnchor {
        docname: String,
        name: String,
        anchor: String,
    },
    #[error("object in '{docname}' is malformed: {reason}")]
    MalformedObject { docname: String, reason: String },
    #[error("object '{name}' in '{docname}' has malformed type '{domain}:{label}'")]
    MalformedObjectType {
        docname: String,
        name: String,
        domain: String,
        label: String,
    },
    #[error("corpus holds {count} documents, more than a document id can address")]
    TooManyDocuments { count: usize },
    #[error("corpus declares {count} object types, more than a type index can address")]
    TooManyObjectTypes { count: usize },
}

/// A persisted index that fails structural invariants on load.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(
        "document arrays are misaligned: {docnames} docnames, {filenames} filenames, {titles} titles"
    )]
    LengthMismatch {
        docnames: usize,
        filenames: usize,
        titles: usize,
    },
    #[error("{table} entry '{key}' references document {doc_id}, but only {count} exist")]
    DanglingDocId {
        table: &'static str,
        key: String,
        doc_id: DocId,
        count: usize,
    },
    #[error("object '{domain}:{name}' references unknown object type {type_index}")]
    DanglingTypeIndex {
        domain: String,
        name: String,
        type_index: u32,
    },
    #[error("object '{domain}:{name}' uses type {type_index} from domain '{type_domain}'")]
    TypeDomainMismatch {
        domain: String,
        name: String,
        type_index: u32,
        type_domain: String,
    },
    #[error("{table} entry '{key}' has an empty or unsorted posting")]
    MalformedPostings { table: &'static str, key: String },
    #[error("payload is not wrapped in Search.setIndex(...)")]
    MissingWrapper,
    #[error("binary index is corrupt: {0}")]
    Binary(#[from] postcard::Error),
    #[error("JSON index is corrupt: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read index: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid query-engine configuration. A query string itself is never an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("weight '{name}' must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f32 },
    #[error("weight '{stronger}' ({stronger_value}) must exceed '{weaker}' ({weaker_value})")]
    WeightOrdering {
        stronger: &'static str,
        stronger_value: f32,
        weaker: &'static str,
        weaker_value: f32,
    },
    #[error("limit '{name}' must be at least 1")]
    InvalidLimit { name: &'static str },
    #[error("tokenizer minimum length must be at least 1")]
    InvalidTokenizer,
}
