mod common;

use assert2::{check, let_assert};
use common::{api_corpus, install_corpus, page, py_object};
use docsearch::{Document, QueryEngine, SearchConfig, SearchHit, SearchIndex, TokenizerConfig, build};
use rstest::rstest;
use std::collections::BTreeSet;

fn index_of(documents: &[Document]) -> SearchIndex {
    build(documents, &TokenizerConfig::default(), None).expect("corpus builds")
}

fn engine() -> QueryEngine {
    QueryEngine::new(SearchConfig::default()).expect("default config is valid")
}

fn docnames(hits: &[SearchHit]) -> Vec<&str> {
    hits.iter().map(|hit| hit.docname.as_str()).collect()
}

fn result_set(index: &SearchIndex, query: &str) -> BTreeSet<String> {
    engine()
        .search(index, query)
        .into_iter()
        .map(|hit| hit.docname)
        .collect()
}

/// Test: "install" finds both pages, the title match first.
#[rstest]
fn install_ranks_title_match_first(install_corpus: Vec<Document>) {
    let index = index_of(&install_corpus);
    let hits = engine().search(&index, "install");

    check!(docnames(&hits) == ["intro", "setup"]);
    check!(hits[0].title == "Installation Guide");
    check!(hits[0].score > hits[1].score);
}

/// Test: a multi-term query returns the intersection of single-term queries.
#[rstest]
#[case("feature scenario")]
#[case("runner scenario")]
#[case("feature steps")]
#[case("scenario outlines")]
fn conjunction_is_intersection(api_corpus: Vec<Document>, #[case] query: &str) {
    let index = index_of(&api_corpus);
    let (a, b) = query.split_once(' ').unwrap();

    let both = result_set(&index, query);
    let expected: BTreeSet<String> = result_set(&index, a)
        .intersection(&result_set(&index, b))
        .cloned()
        .collect();
    check!(both == expected);
}

/// Test: a word only in one page's title outranks the same word only in another's body.
#[test]
fn title_outranks_body() {
    let docs = [
        page("body", "Manual", "gadget"),
        page("title", "Gadget", "manual"),
    ];
    let index = index_of(&docs);

    check!(docnames(&engine().search(&index, "gadget")) == ["title", "body"]);
    check!(docnames(&engine().search(&index, "manual")) == ["body", "title"]);
}

/// Test: a shorter prefix never loses results the full term finds.
#[rstest]
#[case("ca", "cat")]
#[case("cat", "catalog")]
#[case("scen", "scenario")]
#[case("run", "runner")]
fn prefix_is_superset(api_corpus: Vec<Document>, #[case] prefix: &str, #[case] term: &str) {
    let mut docs = api_corpus;
    docs.push(page("pets", "Pets", "cat care and feeding"));
    docs.push(page("store", "Catalog", "browse the car catalog"));
    let index = index_of(&docs);

    let narrow = result_set(&index, term);
    let wide = result_set(&index, prefix);
    check!(!narrow.is_empty());
    check!(wide.is_superset(&narrow));
}

#[rstest]
#[case::empty("")]
#[case::blank("   \t ")]
#[case::punctuation("?!.,")]
#[case::stop_words("the and of")]
#[case::lone_dash("-")]
#[case::unknown("zyzzyva")]
#[case::unknown_with_known("scenario zyzzyva")]
fn no_match_is_empty(api_corpus: Vec<Document>, #[case] query: &str) {
    let index = index_of(&api_corpus);
    check!(engine().search(&index, query).is_empty());
}

/// Test: repeated queries return identical ordered results.
#[rstest]
fn queries_are_deterministic(api_corpus: Vec<Document>) {
    let index = index_of(&api_corpus);
    let engine = engine();

    for query in ["feature", "scenario", "run", "behave", "feature -gherkin"] {
        let first = engine.search(&index, query);
        let second = engine.search(&index, query);
        check!(first == second, "query '{}' changed between runs", query);
    }
}

/// Test: object names match on each word of their name and are reported with the hit.
#[rstest]
fn objects_justify_results(api_corpus: Vec<Document>) {
    let index = index_of(&api_corpus);
    let hits = engine().search(&index, "runner");

    let_assert!(Some(api) = hits.iter().find(|hit| hit.docname == "api"));
    check!(hits[0].docname == "api");
    let names: Vec<&str> = api.matched_objects.iter().map(|o| o.name.as_str()).collect();
    check!(names.contains(&"behave.runner.Runner"));
}

/// A reference page whose only symbol is a snake_case function.
fn simulation_corpus() -> Vec<Document> {
    let mut api = page("api", "API", "reference");
    api.objects.push(py_object("behavior.run_simulation", "function", 1));
    vec![api, page("notes", "Notes", "unrelated runner notes")]
}

/// Test: punctuated symbol names are found by their full spelling and by each word.
#[rstest]
#[case("run_simulation")]
#[case("behavior.run_simulation")]
#[case("simulation")]
#[case("reference run_simulation")]
#[case("reference simul")]
fn symbol_words_reach_their_page(#[case] query: &str) {
    let index = index_of(&simulation_corpus());
    let hits = engine().search(&index, query);

    let_assert!([hit] = &hits[..]);
    check!(hit.docname == "api");
    let names: Vec<&str> = hit.matched_objects.iter().map(|o| o.name.as_str()).collect();
    check!(names == ["behavior.run_simulation"]);
}

/// Test: a symbol match still has to agree with every other query word.
#[test]
fn symbol_words_join_the_conjunction() {
    let index = index_of(&simulation_corpus());

    check!(docnames(&engine().search(&index, "unrelated runner")) == ["notes"]);
    check!(engine().search(&index, "reference runner").is_empty());
    check!(engine().search(&index, "notes simulation").is_empty());
}

/// Test: a two-letter prefix reaches the last of hundreds of expansions.
#[test]
fn wide_prefix_keeps_every_match() {
    let mut docs: Vec<Document> = (0..300)
        .map(|i| page(&format!("p{i:04}"), "Page", &format!("ca{i:04}x")))
        .collect();
    docs.push(page("best", "Best", "cazzz"));
    let index = index_of(&docs);

    let wide = result_set(&index, "ca");
    check!(wide.contains("best"));
    check!(wide.is_superset(&result_set(&index, "cazzz")));
}

/// Test: excluded words drop pages even when other terms match.
#[rstest]
fn exclusion_removes_pages(api_corpus: Vec<Document>) {
    let index = index_of(&api_corpus);

    let all = result_set(&index, "scenario");
    let without = result_set(&index, "scenario -gherkin");
    check!(all.contains("gherkin"));
    check!(!without.contains("gherkin"));
    check!(without.len() == all.len() - 1);
}

/// Test: results never exceed the configured maximum.
#[rstest]
fn results_respect_max(api_corpus: Vec<Document>) {
    let index = index_of(&api_corpus);
    let mut config = SearchConfig::default();
    config.query.max_results = 1;
    let engine = QueryEngine::new(config).unwrap();

    check!(engine.search(&index, "feature").len() == 1);
}
