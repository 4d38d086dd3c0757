//! Encodings of a [`SearchIndex`].
//!
//! - Binary: postcard over [`IndexParts`], postings always stored as sets.
//! - JavaScript: `Search.setIndex({...});`, the payload a documentation site
//!   ships to the browser. One-document postings are written as a bare integer
//!   and either form is accepted on decode.
//!
//! Every decode path ends in [`SearchIndex::from_parts`], so a payload that
//! violates the index invariants is rejected rather than half-used.

use crate::error::DecodeError;
use crate::stamp::EnvironmentStamp;
use postcard::to_io;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

use super::index::{DocId, IndexParts, ObjectEntry, ObjectType, Postings, SearchIndex};

const JS_PREFIX: &str = "Search.setIndex(";

/// Serializes an index to postcard bytes.
pub fn encode_binary(index: &SearchIndex) -> Result<Vec<u8>, postcard::Error> {
    postcard::to_stdvec(index.parts())
}

/// Streams an index as postcard into `writer`.
pub fn write_binary<W: Write>(index: &SearchIndex, writer: W) -> Result<(), postcard::Error> {
    to_io(index.parts(), writer).map(|_| ())
}

pub fn decode_binary(bytes: &[u8]) -> Result<SearchIndex, DecodeError> {
    let parts: IndexParts = postcard::from_bytes(bytes)?;
    SearchIndex::from_parts(parts)
}

/// A posting as it appears in the JavaScript payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WirePostings {
    One(DocId),
    Many(Vec<DocId>),
}

impl From<&Postings> for WirePostings {
    fn from(postings: &Postings) -> Self {
        match postings.as_single() {
            Some(doc_id) => Self::One(doc_id),
            None => Self::Many(postings.as_slice().to_vec()),
        }
    }
}

impl From<WirePostings> for Postings {
    fn from(wire: WirePostings) -> Self {
        match wire {
            WirePostings::One(doc_id) => Self::single(doc_id),
            WirePostings::Many(ids) => Self::from_unsorted(ids),
        }
    }
}

/// `[doc_id, anchor, type_index, priority]`
type WireObject = (DocId, String, u32, u8);

/// `[domain, label, display_label]`
type WireObjectType = (String, String, String);

#[derive(Debug, Serialize, Deserialize)]
struct WireIndex {
    docnames: Vec<String>,
    filenames: Vec<String>,
    titles: Vec<String>,
    terms: BTreeMap<String, WirePostings>,
    titleterms: BTreeMap<String, WirePostings>,
    objects: BTreeMap<String, BTreeMap<String, WireObject>>,
    objtypes: BTreeMap<u32, WireObjectType>,
    envversion: EnvironmentStamp,
}

fn to_wire_table(table: &BTreeMap<String, Postings>) -> BTreeMap<String, WirePostings> {
    table
        .iter()
        .map(|(term, postings)| (term.clone(), WirePostings::from(postings)))
        .collect()
}

fn from_wire_table(table: BTreeMap<String, WirePostings>) -> BTreeMap<String, Postings> {
    table
        .into_iter()
        .map(|(term, wire)| (term, Postings::from(wire)))
        .collect()
}

impl From<&IndexParts> for WireIndex {
    fn from(parts: &IndexParts) -> Self {
        Self {
            docnames: parts.docnames.clone(),
            filenames: parts.filenames.clone(),
            titles: parts.titles.clone(),
            terms: to_wire_table(&parts.terms),
            titleterms: to_wire_table(&parts.titleterms),
            objects: parts
                .objects
                .iter()
                .map(|(domain, names)| {
                    let names = names
                        .iter()
                        .map(|(name, e)| {
                            (
                                name.clone(),
                                (e.doc_id, e.anchor.clone(), e.type_index, e.priority),
                            )
                        })
                        .collect();
                    (domain.clone(), names)
                })
                .collect(),
            objtypes: parts
                .objtypes
                .iter()
                .map(|(index, t)| {
                    (
                        *index,
                        (t.domain.clone(), t.label.clone(), t.display_label.clone()),
                    )
                })
                .collect(),
            envversion: parts.stamp.clone(),
        }
    }
}

impl From<WireIndex> for IndexParts {
    fn from(wire: WireIndex) -> Self {
        Self {
            docnames: wire.docnames,
            filenames: wire.filenames,
            titles: wire.titles,
            terms: from_wire_table(wire.terms),
            titleterms: from_wire_table(wire.titleterms),
            objects: wire
                .objects
                .into_iter()
                .map(|(domain, names)| {
                    let names = names
                        .into_iter()
                        .map(|(name, (doc_id, anchor, type_index, priority))| {
                            (
                                name,
                                ObjectEntry {
                                    doc_id,
                                    anchor,
                                    type_index,
                                    priority,
                                },
                            )
                        })
                        .collect();
                    (domain, names)
                })
                .collect(),
            objtypes: wire
                .objtypes
                .into_iter()
                .map(|(index, (domain, label, display_label))| {
                    (
                        index,
                        ObjectType {
                            domain,
                            label,
                            display_label,
                        },
                    )
                })
                .collect(),
            stamp: wire.envversion,
        }
    }
}

/// Renders the `Search.setIndex({...});` payload.
pub fn encode_js(index: &SearchIndex) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(&WireIndex::from(index.parts()))?;
    Ok(format!("{JS_PREFIX}{json});"))
}

/// Parses a `Search.setIndex({...})` payload, normalizing postings to sets.
pub fn decode_js(text: &str) -> Result<SearchIndex, DecodeError> {
    let body = text
        .trim()
        .strip_prefix(JS_PREFIX)
        .ok_or(DecodeError::MissingWrapper)?;
    let body = body.strip_suffix(';').unwrap_or(body).trim_end();
    let json = body.strip_suffix(')').ok_or(DecodeError::MissingWrapper)?;

    let wire: WireIndex = serde_json::from_str(json)?;
    SearchIndex::from_parts(IndexParts::from(wire))
}
