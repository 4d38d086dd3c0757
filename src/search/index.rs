//! The compiled, immutable search index.
//!
//! Four coupled tables (document registry, body-term postings, title-term
//! postings, object registry plus its type table) and an environment stamp.
//! An index is only ever obtained through [`SearchIndex::from_parts`], which
//! checks every cross-table reference, so the query engine can trust it.

use crate::error::DecodeError;
use crate::search::tokenize::Tokenizer;
use crate::stamp::EnvironmentStamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Dense document identifier, assigned in corpus order.
pub type DocId = u32;

/// The set of documents containing a term: ascending, duplicate-free, never empty
/// once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Postings(Vec<DocId>);

impl Postings {
    pub fn single(doc_id: DocId) -> Self {
        Self(vec![doc_id])
    }

    /// Sorts and deduplicates arbitrary ids.
    pub fn from_unsorted(mut ids: Vec<DocId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    pub fn insert(&mut self, doc_id: DocId) {
        match self.0.last() {
            Some(&last) if last == doc_id => {}
            Some(&last) if last < doc_id => self.0.push(doc_id),
            None => self.0.push(doc_id),
            Some(_) => {
                if let Err(pos) = self.0.binary_search(&doc_id) {
                    self.0.insert(pos, doc_id);
                }
            }
        }
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.0.binary_search(&doc_id).is_ok()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The scalar form: `Some` when exactly one document holds the term.
    pub fn as_single(&self) -> Option<DocId> {
        match self.0.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    fn is_canonical(&self) -> bool {
        !self.0.is_empty() && self.0.windows(2).all(|pair| pair[0] < pair[1])
    }
}

/// Which postings table a term lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Body,
}

impl Field {
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Title => "titleterms",
            Self::Body => "terms",
        }
    }
}

/// Registry entry for one named object under a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub doc_id: DocId,
    /// In-page fragment identifier (without `#`); empty means the page itself.
    pub anchor: String,
    pub type_index: u32,
    /// Tie-break weight; higher wins.
    pub priority: u8,
}

/// One row of the object-type table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectType {
    pub domain: String,
    pub label: String,
    pub display_label: String,
}

/// Plain data of an index, as produced by the builder and carried by codecs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexParts {
    pub docnames: Vec<String>,
    pub filenames: Vec<String>,
    pub titles: Vec<String>,
    pub terms: BTreeMap<String, Postings>,
    pub titleterms: BTreeMap<String, Postings>,
    /// domain -> object name -> entry
    pub objects: BTreeMap<String, BTreeMap<String, ObjectEntry>>,
    pub objtypes: BTreeMap<u32, ObjectType>,
    pub stamp: EnvironmentStamp,
}

/// Points from a lowercase lookup key back to a registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectKey {
    pub(crate) domain: String,
    pub(crate) name: String,
}

/// Borrowed view of one document's registry columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRef<'a> {
    pub doc_id: DocId,
    pub docname: &'a str,
    pub filename: &'a str,
    pub title: &'a str,
}

/// A validated, immutable search index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndex {
    parts: IndexParts,
    /// Every normalized word of every object name, for ordered prefix lookup.
    object_keys: BTreeMap<String, Vec<ObjectKey>>,
}

impl SearchIndex {
    /// Validates the structural invariants and wraps the tables.
    pub fn from_parts(parts: IndexParts) -> Result<Self, DecodeError> {
        validate(&parts)?;
        let object_keys = object_keys(&parts.objects);
        Ok(Self { parts, object_keys })
    }

    /// Wraps tables the builder produced; they satisfy the invariants by construction.
    pub(crate) fn from_built_parts(parts: IndexParts) -> Self {
        debug_assert!(validate(&parts).is_ok(), "builder produced an invalid index");
        let object_keys = object_keys(&parts.objects);
        Self { parts, object_keys }
    }

    pub fn parts(&self) -> &IndexParts {
        &self.parts
    }

    pub fn into_parts(self) -> IndexParts {
        self.parts
    }

    pub fn stamp(&self) -> &EnvironmentStamp {
        &self.parts.stamp
    }

    pub fn document_count(&self) -> usize {
        self.parts.docnames.len()
    }

    /// Number of distinct body and title terms.
    pub fn term_count(&self) -> usize {
        self.parts.terms.len() + self.parts.titleterms.len()
    }

    pub fn object_count(&self) -> usize {
        self.parts.objects.values().map(BTreeMap::len).sum()
    }

    pub fn document(&self, doc_id: DocId) -> Option<DocumentRef<'_>> {
        let idx = doc_id as usize;
        Some(DocumentRef {
            doc_id,
            docname: self.parts.docnames.get(idx)?,
            filename: self.parts.filenames.get(idx)?,
            title: self.parts.titles.get(idx)?,
        })
    }

    pub fn doc_id(&self, docname: &str) -> Option<DocId> {
        self.parts
            .docnames
            .iter()
            .position(|name| name == docname)
            .and_then(|idx| DocId::try_from(idx).ok())
    }

    fn table(&self, field: Field) -> &BTreeMap<String, Postings> {
        match field {
            Field::Title => &self.parts.titleterms,
            Field::Body => &self.parts.terms,
        }
    }

    pub fn postings(&self, field: Field, term: &str) -> Option<&Postings> {
        self.table(field).get(term)
    }

    /// Indexed terms starting with `prefix`, in lexicographic order.
    pub fn prefixed<'a>(
        &'a self,
        field: Field,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Postings)> + 'a {
        self.table(field)
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(term, _)| term.starts_with(prefix))
            .map(|(term, postings)| (term.as_str(), postings))
    }

    pub fn object(&self, domain: &str, name: &str) -> Option<&ObjectEntry> {
        self.parts.objects.get(domain)?.get(name)
    }

    pub fn object_type(&self, type_index: u32) -> Option<&ObjectType> {
        self.parts.objtypes.get(&type_index)
    }

    /// Object lookup keys starting with `prefix`, in lexicographic order.
    pub(crate) fn object_keys_prefixed<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [ObjectKey])> + 'a {
        self.object_keys
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(key, _)| key.starts_with(prefix))
            .map(|(key, targets)| (key.as_str(), targets.as_slice()))
    }
}

/// Keys every object under each word of its name, so `pkg.run_simulation`
/// is reachable from `pkg`, `run` or `simulation`.
fn object_keys(
    objects: &BTreeMap<String, BTreeMap<String, ObjectEntry>>,
) -> BTreeMap<String, Vec<ObjectKey>> {
    let mut keys: BTreeMap<String, Vec<ObjectKey>> = BTreeMap::new();
    for (domain, names) in objects {
        for name in names.keys() {
            let words: BTreeSet<String> = Tokenizer::normalize(name).into_iter().collect();
            for word in words {
                keys.entry(word).or_default().push(ObjectKey {
                    domain: domain.clone(),
                    name: name.clone(),
                });
            }
        }
    }
    keys
}

fn validate(parts: &IndexParts) -> Result<(), DecodeError> {
    let count = parts.docnames.len();
    if parts.filenames.len() != count || parts.titles.len() != count {
        return Err(DecodeError::LengthMismatch {
            docnames: count,
            filenames: parts.filenames.len(),
            titles: parts.titles.len(),
        });
    }

    for field in [Field::Body, Field::Title] {
        let table = match field {
            Field::Title => &parts.titleterms,
            Field::Body => &parts.terms,
        };
        for (term, postings) in table {
            if !postings.is_canonical() {
                return Err(DecodeError::MalformedPostings {
                    table: field.table_name(),
                    key: term.clone(),
                });
            }
            // Ascending, so the last id is the largest.
            if let Some(doc_id) = postings.as_slice().last().copied()
                && doc_id as usize >= count
            {
                return Err(DecodeError::DanglingDocId {
                    table: field.table_name(),
                    key: term.clone(),
                    doc_id,
                    count,
                });
            }
        }
    }

    for (domain, names) in &parts.objects {
        for (name, entry) in names {
            if entry.doc_id as usize >= count {
                return Err(DecodeError::DanglingDocId {
                    table: "objects",
                    key: format!("{domain}:{name}"),
                    doc_id: entry.doc_id,
                    count,
                });
            }
            let Some(objtype) = parts.objtypes.get(&entry.type_index) else {
                return Err(DecodeError::DanglingTypeIndex {
                    domain: domain.clone(),
                    name: name.clone(),
                    type_index: entry.type_index,
                });
            };
            if objtype.domain != *domain {
                return Err(DecodeError::TypeDomainMismatch {
                    domain: domain.clone(),
                    name: name.clone(),
                    type_index: entry.type_index,
                    type_domain: objtype.domain.clone(),
                });
            }
        }
    }

    Ok(())
}
