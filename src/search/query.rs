//! Query parsing and evaluation against a [`SearchIndex`].
//!
//! Evaluation is a read-only walk over an immutable index, so one engine can
//! serve any number of concurrent queries.

use crate::config::{PrefixMode, QueryConfig, SearchConfig};
use crate::error::QueryError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::index::{DocId, Field, SearchIndex};
use super::scoring::{MatchKind, classify};
use super::tokenize::Tokenizer;

/// A query split into required and excluded terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Distinct terms every result must match, in typed order.
    pub terms: Vec<String>,
    /// Terms (typed as `-word`) whose documents are removed.
    pub excluded: Vec<String>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// An object whose name justified a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedObject {
    pub domain: String,
    pub name: String,
    pub anchor: String,
    pub type_label: String,
    pub display_label: String,
    pub priority: u8,
    pub exact: bool,
}

/// One ranked result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub docname: String,
    pub filename: String,
    pub title: String,
    pub score: f32,
    pub matched_objects: Vec<MatchedObject>,
}

/// How one query term matched one document.
#[derive(Debug, Default)]
struct TermHit {
    title: Option<MatchKind>,
    body: Option<MatchKind>,
    /// (domain, name) -> best match kind
    objects: BTreeMap<(String, String), MatchKind>,
}

impl TermHit {
    fn mark(&mut self, field: Field, kind: MatchKind) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Body => &mut self.body,
        };
        *slot = (*slot).max(Some(kind));
    }
}

/// Resolves query strings against an index using a fixed configuration.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    config: SearchConfig,
    tokenizer: Tokenizer,
}

impl QueryEngine {
    /// Validates `config` once; queries themselves never fail.
    pub fn new(config: SearchConfig) -> Result<Self, QueryError> {
        config.validate()?;
        let tokenizer = Tokenizer::new(&config.tokenizer);
        Ok(Self { config, tokenizer })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Splits a query into required and excluded terms.
    pub fn parse(&self, query: &str) -> ParsedQuery {
        let rules = &self.config.query;
        let mut parsed = ParsedQuery::default();

        for word in query.split_whitespace() {
            let (raw, excluded) = match word.strip_prefix('-') {
                Some(rest) if !rest.is_empty() => (rest, true),
                _ => (word, false),
            };
            for term in Tokenizer::normalize(raw) {
                if !self.keep_query_term(&term, rules) {
                    continue;
                }
                let target = if excluded {
                    &mut parsed.excluded
                } else {
                    &mut parsed.terms
                };
                if !target.contains(&term) {
                    target.push(term);
                }
            }
        }

        parsed
    }

    fn keep_query_term(&self, term: &str, rules: &QueryConfig) -> bool {
        term.chars().count() >= rules.min_length
            && !(rules.filter_stop_words && self.tokenizer.is_stop_word(term))
    }

    /// Ranks the documents matching every term of `query`.
    pub fn search(&self, index: &SearchIndex, query: &str) -> Vec<SearchHit> {
        let parsed = self.parse(query);
        self.search_parsed(index, &parsed)
    }

    pub fn search_parsed(&self, index: &SearchIndex, parsed: &ParsedQuery) -> Vec<SearchHit> {
        if parsed.is_empty() {
            return vec![];
        }

        let per_term: Vec<BTreeMap<DocId, TermHit>> = parsed
            .terms
            .iter()
            .map(|term| self.resolve_term(index, term))
            .collect();

        let mut candidates = intersect(&per_term);
        for term in &parsed.excluded {
            for field in [Field::Title, Field::Body] {
                if let Some(postings) = index.postings(field, term) {
                    candidates.retain(|doc_id| !postings.contains(*doc_id));
                }
            }
        }

        let mut hits: Vec<(SearchHit, Option<u8>)> = candidates
            .into_iter()
            .filter_map(|doc_id| self.score(index, doc_id, &per_term))
            .collect();

        hits.sort_by(|(a, a_prio), (b, b_prio)| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b_prio.cmp(a_prio))
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });

        let limit = self.config.query.max_results;
        if hits.len() > limit {
            tracing::debug!(
                "Truncating {} results for {:?} to {}",
                hits.len(),
                parsed.terms,
                limit
            );
            hits.truncate(limit);
        }

        hits.into_iter().map(|(hit, _)| hit).collect()
    }

    /// Collects every document one term reaches, through postings or objects.
    fn resolve_term(&self, index: &SearchIndex, term: &str) -> BTreeMap<DocId, TermHit> {
        let rules = &self.config.query;
        let mut hits: BTreeMap<DocId, TermHit> = BTreeMap::new();

        let mut exact_found = false;
        for field in [Field::Title, Field::Body] {
            if let Some(postings) = index.postings(field, term) {
                exact_found = true;
                for doc_id in postings.iter() {
                    hits.entry(doc_id).or_default().mark(field, MatchKind::Exact);
                }
            }
        }

        let long_enough = term.chars().count() >= rules.min_prefix_length;
        let expand = long_enough
            && match rules.prefix_mode {
                PrefixMode::Always => true,
                PrefixMode::Fallback => !exact_found,
            };
        if expand {
            for field in [Field::Title, Field::Body] {
                for (indexed, postings) in index.prefixed(field, term) {
                    if indexed == term {
                        continue;
                    }
                    for doc_id in postings.iter() {
                        hits.entry(doc_id).or_default().mark(field, MatchKind::Prefix);
                    }
                }
            }
        }

        for (key, targets) in index.object_keys_prefixed(term) {
            let Some(kind) = classify(key, term) else {
                continue;
            };
            if kind == MatchKind::Prefix && !long_enough {
                continue;
            }
            for target in targets {
                let Some(entry) = index.object(&target.domain, &target.name) else {
                    continue;
                };
                let best = hits
                    .entry(entry.doc_id)
                    .or_default()
                    .objects
                    .entry((target.domain.clone(), target.name.clone()))
                    .or_insert(kind);
                *best = (*best).max(kind);
            }
        }

        hits
    }

    /// Sums per-term contributions; returns the hit and its best object priority.
    fn score(
        &self,
        index: &SearchIndex,
        doc_id: DocId,
        per_term: &[BTreeMap<DocId, TermHit>],
    ) -> Option<(SearchHit, Option<u8>)> {
        let doc = index.document(doc_id)?;
        let weights = &self.config.weights;

        let mut score = 0.0_f32;
        let mut matched: BTreeMap<(String, String), MatchedObject> = BTreeMap::new();

        for hits in per_term {
            let hit = hits.get(&doc_id)?;
            if let Some(kind) = hit.title {
                score += weights.prose(Field::Title, kind);
            }
            if let Some(kind) = hit.body {
                score += weights.prose(Field::Body, kind);
            }

            let mut best_object = 0.0_f32;
            for ((domain, name), &kind) in &hit.objects {
                let Some(entry) = index.object(domain, name) else {
                    continue;
                };
                best_object = best_object.max(weights.object(kind, entry.priority));

                let Some(object_type) = index.object_type(entry.type_index) else {
                    continue;
                };
                let exact = kind == MatchKind::Exact;
                matched
                    .entry((domain.clone(), name.clone()))
                    .and_modify(|existing| existing.exact |= exact)
                    .or_insert_with(|| MatchedObject {
                        domain: domain.clone(),
                        name: name.clone(),
                        anchor: entry.anchor.clone(),
                        type_label: object_type.label.clone(),
                        display_label: object_type.display_label.clone(),
                        priority: entry.priority,
                        exact,
                    });
            }
            score += best_object;
        }

        let mut matched_objects: Vec<MatchedObject> = matched.into_values().collect();
        matched_objects.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.exact.cmp(&a.exact))
                .then_with(|| (&a.domain, &a.name).cmp(&(&b.domain, &b.name)))
        });
        let best_priority = matched_objects.first().map(|object| object.priority);

        Some((
            SearchHit {
                doc_id,
                docname: doc.docname.to_string(),
                filename: doc.filename.to_string(),
                title: doc.title.to_string(),
                score,
                matched_objects,
            },
            best_priority,
        ))
    }
}

/// Documents present in every term's hit map.
fn intersect(per_term: &[BTreeMap<DocId, TermHit>]) -> BTreeSet<DocId> {
    let Some((first, rest)) = per_term.split_first() else {
        return BTreeSet::new();
    };
    first
        .keys()
        .copied()
        .filter(|doc_id| rest.iter().all(|hits| hits.contains_key(doc_id)))
        .collect()
}

/// Searches `index` with the default configuration.
pub fn search(index: &SearchIndex, query: &str) -> Vec<SearchHit> {
    match QueryEngine::new(SearchConfig::default()) {
        Ok(engine) => engine.search(index, query),
        Err(e) => {
            tracing::error!("Default search configuration rejected: {}", e);
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::corpus::{Document, ObjectDescription};
    use crate::search::build;
    use assert2::{check, let_assert};
    use rstest::rstest;

    fn doc(docname: &str, title: &str, body: &str) -> Document {
        Document {
            docname: docname.to_string(),
            filename: format!("{docname}.md"),
            title: title.to_string(),
            body: body.to_string(),
            objects: vec![],
        }
    }

    fn engine() -> QueryEngine {
        QueryEngine::new(SearchConfig::default()).unwrap()
    }

    fn docnames(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.docname.as_str()).collect()
    }

    #[rstest]
    #[case("install pip", &["install", "pip"], &[])]
    #[case("Install the PIP", &["install", "pip"], &[])]
    #[case("agent -robot", &["agent"], &["robot"])]
    #[case("agent agent", &["agent"], &[])]
    #[case("- lone", &["lone"], &[])]
    #[case("pkg.Agent", &["pkg", "agent"], &[])]
    fn test_parse(#[case] query: &str, #[case] terms: &[&str], #[case] excluded: &[&str]) {
        let parsed = engine().parse(query);
        check!(parsed.terms == terms);
        check!(parsed.excluded == excluded);
    }

    #[test]
    fn test_stop_word_filtering_is_configurable() {
        check!(engine().parse("the io").terms == ["io"]);

        let mut config = SearchConfig::default();
        config.query.filter_stop_words = false;
        let engine = QueryEngine::new(config).unwrap();
        check!(engine.parse("the io").terms == ["the", "io"]);
    }

    #[test]
    fn test_query_stop_words_do_not_empty_results() {
        let docs = [doc("intro", "Intro", "Install the package using pip")];
        let index = build(&docs, &TokenizerConfig::default(), None).unwrap();
        check!(docnames(&engine().search(&index, "install the package")) == ["intro"]);

        let mut config = SearchConfig::default();
        config.query.filter_stop_words = false;
        let strict = QueryEngine::new(config).unwrap();
        check!(strict.search(&index, "install the package").is_empty());
    }

    #[test]
    fn test_engine_rejects_bad_config() {
        let mut config = SearchConfig::default();
        config.weights.body = 100.0;
        let_assert!(Err(QueryError::WeightOrdering { .. }) = QueryEngine::new(config));
    }

    #[test]
    fn test_end_to_end_install() {
        let docs = [
            doc("intro", "Installation Guide", "Install the package using pip"),
            doc("setup", "Setup", "Installation requires python and pip"),
        ];
        let index = build(&docs, &TokenizerConfig::default(), None).unwrap();
        let hits = engine().search(&index, "install");
        check!(docnames(&hits) == ["intro", "setup"]);
        check!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_fallback_mode_skips_prefix_when_exact_hits() {
        let docs = [
            doc("intro", "Installation Guide", "Install the package using pip"),
            doc("setup", "Setup", "Installation requires python and pip"),
        ];
        let index = build(&docs, &TokenizerConfig::default(), None).unwrap();
        let mut config = SearchConfig::default();
        config.query.prefix_mode = PrefixMode::Fallback;
        let engine = QueryEngine::new(config).unwrap();

        check!(docnames(&engine.search(&index, "install")) == ["intro"]);
        check!(docnames(&engine.search(&index, "instal")) == ["intro", "setup"]);
    }

    #[test]
    fn test_excluded_terms_remove_documents() {
        let docs = [
            doc("a", "Robots", "agent control"),
            doc("b", "Agents", "agent planning"),
        ];
        let index = build(&docs, &TokenizerConfig::default(), None).unwrap();
        check!(docnames(&engine().search(&index, "agent -robots")) == ["b"]);
        check!(engine().search(&index, "-agent").is_empty());
    }

    #[test]
    fn test_object_match_explains_result() {
        let mut api = doc("api", "API Reference", "functions and classes");
        api.objects = vec![ObjectDescription {
            name: "behavior.Agent".into(),
            domain: "py".into(),
            anchor: "behavior.Agent".into(),
            type_label: "class".into(),
            display_label: Some("Python class".into()),
            priority: 1,
        }];
        let docs = [doc("guide", "Guide", "nothing relevant"), api];
        let index = build(&docs, &TokenizerConfig::default(), None).unwrap();

        let hits = engine().search(&index, "agent");
        let_assert!([hit] = hits.as_slice());
        check!(hit.docname == "api");
        let_assert!([object] = hit.matched_objects.as_slice());
        check!(object.name == "behavior.Agent");
        check!(object.display_label == "Python class");
        check!(object.exact);
        check!(hit.score == 11.0 * 1.5);
    }

    #[test]
    fn test_priority_breaks_ties() {
        let mut low = doc("low", "Low", "");
        low.objects = vec![ObjectDescription {
            name: "Runner".into(),
            domain: "py".into(),
            anchor: String::new(),
            type_label: "class".into(),
            display_label: None,
            priority: 0,
        }];
        let mut high = doc("high", "High", "");
        high.objects = vec![ObjectDescription {
            name: "Runner".into(),
            domain: "js".into(),
            anchor: String::new(),
            type_label: "class".into(),
            display_label: None,
            priority: 0,
        }];

        let mut config = SearchConfig::default();
        config.weights.object_priority_step = 0.0;
        let engine = QueryEngine::new(config).unwrap();

        let index = build(&[low.clone(), high.clone()], &TokenizerConfig::default(), None).unwrap();
        check!(docnames(&engine.search(&index, "runner")) == ["low", "high"]);

        high.objects[0].priority = 2;
        let index = build(&[low, high], &TokenizerConfig::default(), None).unwrap();
        check!(docnames(&engine.search(&index, "runner")) == ["high", "low"]);
    }

    #[test]
    fn test_max_results_truncates() {
        let docs: Vec<Document> = (0..5)
            .map(|i| doc(&format!("d{i}"), "Page", "common words"))
            .collect();
        let index = build(&docs, &TokenizerConfig::default(), None).unwrap();
        let mut config = SearchConfig::default();
        config.query.max_results = 2;
        let hits = QueryEngine::new(config).unwrap().search(&index, "common");
        check!(docnames(&hits) == ["d0", "d1"]);
    }

    #[test]
    fn test_wide_prefix_reaches_every_expansion() {
        let mut docs: Vec<Document> = (0..300)
            .map(|i| doc(&format!("d{i:04}"), "Page", &format!("ca{i:04}x")))
            .collect();
        docs.push(doc("best", "Page", "cazzz"));
        let index = build(&docs, &TokenizerConfig::default(), None).unwrap();

        let hits = engine().search(&index, "ca");
        check!(hits.len() == 301);
        check!(hits.iter().any(|hit| hit.docname == "best"));
    }

    #[test]
    fn test_short_terms_match_exactly_only() {
        let docs = [doc("a", "A", "cat")];
        let index = build(&docs, &TokenizerConfig::default(), None).unwrap();
        check!(engine().search(&index, "c").is_empty());
    }

    #[test]
    fn test_default_search_function() {
        let index = build(&[doc("a", "Alpha", "beta")], &TokenizerConfig::default(), None).unwrap();
        check!(docnames(&search(&index, "alpha")) == ["a"]);
        check!(search(&index, "").is_empty());
    }
}
