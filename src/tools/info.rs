//! Index statistics handler.

use crate::server::SearchState;
use std::fmt::Write as _;

/// Summarize the served index.
pub fn handle_index_info(state: &SearchState) -> String {
    let index = state.index();
    let stamp = index.stamp();
    let parts = index.parts();

    let mut output = String::from("Documentation index:\n\n");
    let _ = writeln!(output, "• Documents: {}", index.document_count());
    let _ = writeln!(output, "• Body terms: {}", parts.terms.len());
    let _ = writeln!(output, "• Title terms: {}", parts.titleterms.len());
    let _ = writeln!(
        output,
        "• Objects: {} across {} domains",
        index.object_count(),
        parts.objects.len()
    );
    let _ = writeln!(output, "• Object types: {}", parts.objtypes.len());
    let _ = writeln!(
        output,
        "• Format version: {}, generation: {}, digest: {}",
        stamp.format_version, stamp.generation, stamp.digest
    );

    match state.source() {
        Some(source) => {
            let _ = writeln!(output, "• Corpus: {}", source.corpus.display());
            let _ = writeln!(output, "• Cache: {}", source.store.path().display());
        }
        None => output.push_str("• Loaded from a prebuilt index; rebuild is unavailable\n"),
    }

    output
}
