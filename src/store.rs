//! Index persistence and hot-swapping.
//!
//! [`IndexStore`] keeps a binary index on disk and only rebuilds when the
//! stamp no longer matches the corpus. [`SharedIndex`] hands readers a complete
//! index and lets a rebuild replace it in one step.

use crate::config::TokenizerConfig;
use crate::corpus::Document;
use crate::error::Result;
use crate::search::{self, SearchIndex, decode_binary, decode_js, encode_js, write_binary};
use crate::stamp::{Digest, corpus_digest};
use anyhow::Context;
use xxhash_rust::xxh3::xxh3_64;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// The index currently served to readers.
///
/// Readers clone the inner `Arc` and keep using their snapshot even if a newer
/// index is swapped in meanwhile; they never observe a partially built one.
#[derive(Debug)]
pub struct SharedIndex {
    current: RwLock<Arc<SearchIndex>>,
}

impl SharedIndex {
    pub fn new(index: SearchIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// Snapshot of the current index.
    pub fn load(&self) -> Arc<SearchIndex> {
        // The lock only guards an Arc swap, so a poisoned lock still holds a whole index.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Atomically replaces the served index, returning the previous one.
    pub fn replace(&self, index: SearchIndex) -> Arc<SearchIndex> {
        let next = Arc::new(index);
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(
            "Swapping index generation {} for {}",
            guard.stamp().generation,
            next.stamp().generation
        );
        std::mem::replace(&mut *guard, next)
    }
}

/// A binary index cached at a fixed path.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached index. Missing or invalid files yield `None`.
    pub async fn load(&self) -> Option<SearchIndex> {
        let bytes = tokio::fs::read(&self.path).await.ok()?;
        let path = self.path.clone();

        // Decode in spawn_blocking since it's CPU intensive
        tokio::task::spawn_blocking(move || match decode_binary(&bytes) {
            Ok(index) => Some(index),
            Err(e) => {
                tracing::warn!("Discarding invalid index at {}: {}", path.display(), e);
                None
            }
        })
        .await
        .ok()?
    }

    /// Writes the index to a uniquely named sibling temporary file, then renames it
    /// into place. Concurrent stores each write their own file; the last rename wins.
    pub async fn store(&self, index: &SearchIndex) -> Result<()> {
        let path = self.path.clone();
        let index = index.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
                Some(parent) => {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory {}", parent.display())
                    })?;
                    parent.to_path_buf()
                }
                None => PathBuf::from("."),
            };

            // Dropped (and deleted) on any early return below.
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)
                .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
            let mut writer = BufWriter::new(tmp.as_file_mut());
            write_binary(&index, &mut writer)
                .context("Failed to encode index")
                .and_then(|()| writer.flush().context("Failed to flush index"))
                .with_context(|| format!("Failed to write index in {}", dir.display()))?;
            drop(writer);

            tmp.persist(&path)
                .map_err(|e| e.error)
                .with_context(|| format!("Failed to move index into {}", path.display()))?;
            tracing::debug!("Stored search index at {}", path.display());
            Ok(())
        })
        .await
        .context("Index storing task panicked")?
    }

    /// Returns the cached index when its stamp matches `documents` and `config`;
    /// otherwise rebuilds, stores, and returns a fresh one.
    pub async fn load_or_build(
        &self,
        documents: Vec<Document>,
        config: &TokenizerConfig,
    ) -> Result<SearchIndex> {
        let digest = corpus_digest(&documents, config);
        let mut previous = None;

        if let Some(index) = self.load().await {
            if index.stamp().is_current_for(digest) {
                tracing::debug!(
                    "Using cached index at {} (generation {})",
                    self.path.display(),
                    index.stamp().generation
                );
                return Ok(index);
            }
            previous = Some(index.stamp().clone());
        }

        tracing::info!(
            "Cache stale or missing, rebuilding index (file: {})",
            self.path.display()
        );
        let config = config.clone();
        let index = tokio::task::spawn_blocking(move || {
            search::build(&documents, &config, previous.as_ref())
        })
        .await
        .context("Index build task panicked")??;

        self.store(&index).await?;
        Ok(index)
    }
}

/// Reads a prebuilt index, accepting either the binary or the JavaScript form.
pub async fn read_index(path: &Path) -> Result<SearchIndex> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read index {}", path.display()))?;

    let index = tokio::task::spawn_blocking(move || {
        match std::str::from_utf8(&bytes) {
            Ok(text) if text.trim_start().starts_with("Search.setIndex(") => decode_js(text),
            _ => decode_binary(&bytes),
        }
    })
    .await
    .context("Index decoding task panicked")?
    .with_context(|| format!("Failed to decode index {}", path.display()))?;

    tracing::debug!(
        "Read index {} ({} documents, generation {})",
        path.display(),
        index.document_count(),
        index.stamp().generation
    );
    Ok(index)
}

/// Cache location for a corpus without an explicit index path:
/// `<cache dir>/docsearch/<hash of corpus path>.bin`.
pub fn default_index_path(corpus: &Path) -> Option<PathBuf> {
    let corpus = std::fs::canonicalize(corpus).unwrap_or_else(|_| corpus.to_path_buf());
    let key = Digest::new(xxh3_64(corpus.as_os_str().as_encoded_bytes()));
    dirs::cache_dir().map(|dir| dir.join("docsearch").join(format!("{key}.bin")))
}

/// Writes the `Search.setIndex(...)` payload for a documentation site.
pub async fn write_js(index: &SearchIndex, path: &Path) -> Result<()> {
    let payload = encode_js(index).context("Failed to render JavaScript index")?;
    tokio::fs::write(path, payload)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote JavaScript index to {}", path.display());
    Ok(())
}
