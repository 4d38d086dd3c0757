//! Rebuild handler for picking up corpus changes.

use crate::server::SearchState;

/// Rebuild the served index from its corpus and report what changed.
pub async fn handle_rebuild(state: &SearchState) -> Result<String, String> {
    let before = state.index().stamp().clone();

    let index = state
        .rebuild()
        .await
        .map_err(|e| format!("Failed to rebuild index: {e:#}"))?;
    let after = index.stamp();

    if after.digest == before.digest && after.generation == before.generation {
        return Ok(format!(
            "Index is up to date (generation {}, {} documents).",
            after.generation,
            index.document_count()
        ));
    }

    tracing::info!(
        "Rebuilt index: generation {} -> {}",
        before.generation,
        after.generation
    );
    Ok(format!(
        "Rebuilt index: generation {} -> {}, {} documents, {} objects.",
        before.generation,
        after.generation,
        index.document_count(),
        index.object_count()
    ))
}
