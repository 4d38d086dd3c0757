//! Offline index construction.
//!
//! All accumulation happens in an [`IndexBuilder`] owned by the caller, so
//! independent builds never share state. A build either finishes with a complete
//! index or fails with a [`BuildError`]; nothing partial escapes.

use crate::config::TokenizerConfig;
use crate::corpus::{Document, ObjectDescription};
use crate::error::BuildError;
use crate::stamp::{EnvironmentStamp, corpus_digest};
use ahash::AHashMap;
use std::collections::BTreeMap;

use super::index::{DocId, IndexParts, ObjectEntry, ObjectType, Postings, SearchIndex};
use super::tokenize::Tokenizer;

/// Accumulator for the four index tables.
pub struct IndexBuilder {
    tokenizer: Tokenizer,
    docnames: Vec<String>,
    filenames: Vec<String>,
    titles: Vec<String>,
    /// docname -> corpus position, for duplicate detection
    seen: AHashMap<String, usize>,
    terms: AHashMap<String, Postings>,
    titleterms: AHashMap<String, Postings>,
    objects: BTreeMap<String, BTreeMap<String, ObjectEntry>>,
    objtypes: BTreeMap<u32, ObjectType>,
    /// (domain, label) -> type index
    type_lookup: AHashMap<(String, String), u32>,
}

impl IndexBuilder {
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(config),
            docnames: Vec::new(),
            filenames: Vec::new(),
            titles: Vec::new(),
            seen: AHashMap::new(),
            terms: AHashMap::new(),
            titleterms: AHashMap::new(),
            objects: BTreeMap::new(),
            objtypes: BTreeMap::new(),
            type_lookup: AHashMap::new(),
        }
    }

    /// Registers the next document in corpus order and indexes its text and objects.
    pub fn add_document(&mut self, doc: &Document) -> Result<DocId, BuildError> {
        let position = self.docnames.len();
        if doc.docname.is_empty() {
            return Err(BuildError::EmptyDocname { position });
        }
        if let Some(&first) = self.seen.get(&doc.docname) {
            return Err(BuildError::DuplicateDocname {
                docname: doc.docname.clone(),
                first,
                second: position,
            });
        }
        let doc_id = DocId::try_from(position)
            .map_err(|_| BuildError::TooManyDocuments { count: position + 1 })?;

        // Validate objects up front so a rejected document leaves no trace.
        for object in &doc.objects {
            validate_object(&doc.docname, object)?;
        }

        self.seen.insert(doc.docname.clone(), position);
        self.docnames.push(doc.docname.clone());
        self.filenames.push(doc.filename.clone());
        self.titles.push(doc.title.clone());

        let terms = self.tokenizer.tokenize_document(&doc.title, &doc.body);
        for term in terms.body {
            self.terms.entry(term).or_default().insert(doc_id);
        }
        for term in terms.title {
            self.titleterms.entry(term).or_default().insert(doc_id);
        }

        for object in &doc.objects {
            self.add_object(doc_id, object)?;
        }

        Ok(doc_id)
    }

    fn add_object(&mut self, doc_id: DocId, object: &ObjectDescription) -> Result<(), BuildError> {
        let type_index = self.intern_type(object)?;
        let entry = ObjectEntry {
            doc_id,
            anchor: object.anchor.clone(),
            type_index,
            priority: object.priority,
        };

        let names = self.objects.entry(object.domain.clone()).or_default();
        match names.get(&object.name) {
            Some(existing) if existing.priority >= entry.priority => {
                tracing::debug!(
                    "Keeping earlier registration of {}:{} (document {})",
                    object.domain,
                    object.name,
                    existing.doc_id
                );
            }
            _ => {
                names.insert(object.name.clone(), entry);
            }
        }
        Ok(())
    }

    /// Returns the type index for `(domain, label)`, allocating the next one if new.
    fn intern_type(&mut self, object: &ObjectDescription) -> Result<u32, BuildError> {
        let key = (object.domain.clone(), object.type_label.clone());
        if let Some(&index) = self.type_lookup.get(&key) {
            return Ok(index);
        }

        let index = next_type_index(self.objtypes.len())?;
        self.objtypes.insert(
            index,
            ObjectType {
                domain: object.domain.clone(),
                label: object.type_label.clone(),
                display_label: object.display_label(),
            },
        );
        self.type_lookup.insert(key, index);
        Ok(index)
    }

    /// Completes the build, stamping the index.
    pub fn finish(self, stamp: EnvironmentStamp) -> SearchIndex {
        let parts = IndexParts {
            docnames: self.docnames,
            filenames: self.filenames,
            titles: self.titles,
            terms: self.terms.into_iter().collect(),
            titleterms: self.titleterms.into_iter().collect(),
            objects: self.objects,
            objtypes: self.objtypes,
            stamp,
        };
        SearchIndex::from_built_parts(parts)
    }
}

/// The index the next interned type gets, given how many exist.
fn next_type_index(len: usize) -> Result<u32, BuildError> {
    u32::try_from(len).map_err(|_| BuildError::TooManyObjectTypes { count: len + 1 })
}

fn validate_object(docname: &str, object: &ObjectDescription) -> Result<(), BuildError> {
    if object.name.trim().is_empty() {
        return Err(BuildError::MalformedObject {
            docname: docname.to_string(),
            reason: "empty object name".to_string(),
        });
    }
    if object.domain.trim().is_empty() || object.type_label.trim().is_empty() {
        return Err(BuildError::MalformedObjectType {
            docname: docname.to_string(),
            name: object.name.clone(),
            domain: object.domain.clone(),
            label: object.type_label.clone(),
        });
    }
    if object
        .anchor
        .chars()
        .any(|c| c == '#' || c.is_whitespace() || c.is_control())
    {
        return Err(BuildError::MalformedAnchor {
            docname: docname.to_string(),
            name: object.name.clone(),
            anchor: object.anchor.clone(),
        });
    }
    Ok(())
}

/// Builds a complete index from `documents` in corpus order.
///
/// `previous` is the stamp of the index being replaced, if any; the new stamp's
/// generation follows it.
pub fn build(
    documents: &[Document],
    config: &TokenizerConfig,
    previous: Option<&EnvironmentStamp>,
) -> Result<SearchIndex, BuildError> {
    let start = std::time::Instant::now();
    let mut builder = IndexBuilder::new(config);
    for doc in documents {
        builder.add_document(doc)?;
    }

    let stamp = EnvironmentStamp::next(previous, corpus_digest(documents, config));
    let index = builder.finish(stamp);

    tracing::info!(
        "Built search index: {} documents, {} terms, {} objects (generation {}) in {:?}",
        index.document_count(),
        index.term_count(),
        index.object_count(),
        index.stamp().generation,
        start.elapsed()
    );

    Ok(index)
}
