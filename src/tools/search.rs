//! Search handler for ranking documentation pages.

use crate::search::SearchHit;
use crate::server::SearchState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

/// Results shown when the request does not ask for a specific count.
const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Search query; words are ANDed, '-word' excludes
    pub query: String,
    /// Maximum number of results to return (default: 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Execute a search against the served index.
pub async fn handle_search(state: &SearchState, request: SearchRequest) -> Result<String, String> {
    let parsed = state.engine().parse(&request.query);
    let hits = if parsed.is_empty() {
        Arc::default()
    } else {
        state.search(&request.query).await
    };

    if hits.is_empty() {
        let rules = &state.engine().config().query;
        let mut msg = format!("No results found for '{}'.\n\n", request.query);

        msg.push_str("Search tips:\n");
        if parsed.is_empty() {
            msg.push_str("• Stop words and punctuation are ignored; add a more specific word\n");
        } else {
            msg.push_str("• Every word must appear in a page; try fewer words\n");
        }
        let _ = writeln!(
            msg,
            "• Words of {} or more characters also match as prefixes",
            rules.min_prefix_length
        );
        if !parsed.excluded.is_empty() {
            msg.push_str("• Excluded words ('-word') may have removed every match\n");
        }

        return Ok(msg);
    }

    let limit = request.limit.unwrap_or(DEFAULT_LIMIT).max(1);
    Ok(format_search_results(&hits, &request.query, limit))
}

/// Format search results into a readable string output.
pub fn format_search_results(hits: &[SearchHit], query: &str, limit: usize) -> String {
    let shown = hits.len().min(limit);
    let mut output = format!(
        "Search results for '{}' ({} of {} pages):\n\n",
        query,
        shown,
        hits.len()
    );

    let max_score = hits.first().map_or(1.0, |hit| hit.score).max(f32::EPSILON);

    for (idx, hit) in hits.iter().take(limit).enumerate() {
        let relevance = ((hit.score / max_score) * 100.0).round() as u8;
        let title = if hit.title.is_empty() {
            hit.docname.as_str()
        } else {
            hit.title.as_str()
        };
        let _ = writeln!(
            output,
            "{}. {} ({}) - relevance: {}%",
            idx + 1,
            title,
            hit.filename,
            relevance
        );

        for object in &hit.matched_objects {
            let target = if object.anchor.is_empty() {
                hit.filename.clone()
            } else {
                format!("{}#{}", hit.filename, object.anchor)
            };
            let _ = writeln!(
                output,
                "   `{}` ({}) -> {}",
                object.name, object.display_label, target
            );
        }

        output.push('\n');
    }

    output
}
