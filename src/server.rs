//! MCP server implementation and shared search state.

use crate::corpus::load_corpus;
use crate::search::{QueryEngine, SearchHit, SearchIndex};
use crate::store::{IndexStore, SharedIndex};
use crate::tools::info::handle_index_info;
use crate::tools::rebuild::handle_rebuild;
use crate::tools::search::{SearchRequest, handle_search};
use anyhow::Context;
use lru::LruCache;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Maximum number of distinct queries whose results are kept in memory.
const RESULT_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(128).unwrap();

/// (index generation, query) -> ranked hits
type ResultKey = (u64, String);

/// Where a served index comes from, so it can be rebuilt in place.
#[derive(Debug, Clone)]
pub struct IndexSource {
    /// Corpus file or directory
    pub corpus: PathBuf,
    /// Binary cache the rebuilt index is written to
    pub store: IndexStore,
}

/// Shared state behind every tool call.
///
/// - The served index, replaced whole on rebuild
/// - One validated query engine
/// - An LRU of recent results, emptied whenever the index changes
pub struct SearchState {
    index: SharedIndex,
    engine: QueryEngine,
    results: Mutex<LruCache<ResultKey, Arc<[SearchHit]>>>,
    source: Option<IndexSource>,
}

impl std::fmt::Debug for SearchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let index = self.index.load();
        f.debug_struct("SearchState")
            .field("documents", &index.document_count())
            .field("generation", &index.stamp().generation)
            .field(
                "cached_results",
                &self.results.try_lock().map(|cache| cache.len()).ok(),
            )
            .field("source", &self.source)
            .finish()
    }
}

impl SearchState {
    pub fn new(index: SearchIndex, engine: QueryEngine, source: Option<IndexSource>) -> Self {
        Self {
            index: SharedIndex::new(index),
            engine,
            results: Mutex::new(LruCache::new(RESULT_CACHE_SIZE)),
            source,
        }
    }

    /// Snapshot of the served index.
    pub fn index(&self) -> Arc<SearchIndex> {
        self.index.load()
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn source(&self) -> Option<&IndexSource> {
        self.source.as_ref()
    }

    /// Ranks `query` against the current index, reusing cached results when possible.
    pub async fn search(&self, query: &str) -> Arc<[SearchHit]> {
        let index = self.index();
        let key = (index.stamp().generation, query.to_string());

        if let Some(hits) = self.results.lock().await.get(&key) {
            tracing::debug!("Result cache hit for '{}'", query);
            return hits.clone();
        }

        let hits: Arc<[SearchHit]> = self.engine.search(&index, query).into();
        self.results.lock().await.put(key, hits.clone());
        hits
    }

    /// Swaps in `index` and drops every cached result.
    pub async fn replace(&self, index: SearchIndex) -> Arc<SearchIndex> {
        let previous = self.index.replace(index);
        self.results.lock().await.clear();
        previous
    }

    /// Reloads the corpus and swaps in the resulting index.
    ///
    /// The cached binary is reused when the corpus is unchanged. Queries keep
    /// being answered from the previous index until the swap.
    pub async fn rebuild(&self) -> crate::error::Result<Arc<SearchIndex>> {
        let source = self
            .source
            .as_ref()
            .context("Server was started without a corpus; nothing to rebuild from")?;

        let corpus = source.corpus.clone();
        let documents = tokio::task::spawn_blocking(move || load_corpus(&corpus))
            .await
            .context("Corpus loading task panicked")??;

        let index = source
            .store
            .load_or_build(documents, &self.engine.config().tokenizer)
            .await?;
        self.replace(index).await;
        Ok(self.index())
    }
}

/// MCP server answering documentation search queries
#[derive(Clone)]
pub struct SearchServer {
    /// Shared index, engine, and result cache
    state: Arc<SearchState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SearchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl SearchServer {
    pub fn new(state: Arc<SearchState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub fn state(&self) -> &Arc<SearchState> {
        &self.state
    }

    #[tool(
        description = "Search the documentation index. All terms must match; prefix matches count too. Prefix a word with '-' to exclude documents containing it. Results are ranked by title, body, and API object matches."
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "Show statistics about the loaded index: document, term, and object counts, plus its build generation and corpus digest."
    )]
    async fn index_info(&self) -> std::result::Result<String, String> {
        Ok(handle_index_info(&self.state))
    }

    #[tool(
        description = "Reload the corpus and rebuild the index if it changed. Searches keep using the previous index until the new one is ready."
    )]
    async fn rebuild(&self) -> std::result::Result<String, String> {
        handle_rebuild(&self.state).await
    }
}

#[tool_handler]
impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "docsearch: full-text search over a documentation site. \
                 Use search with one or more words; every word must match. \
                 Use index_info to see what is loaded and rebuild after the docs change."
                    .to_string(),
            )
    }
}
