use anyhow::Context;
use clap::Parser;
use docsearch::cli::{Cli, Commands, SourceArgs};
use docsearch::store::{self, IndexStore};
use docsearch::tracing::LogFormat;
use docsearch::tools::search::format_search_results;
use docsearch::{
    IndexSource, QueryEngine, SearchConfig, SearchIndex, SearchServer, SearchState, load_corpus,
};
use rmcp::{ServiceExt, transport::stdio};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Write logs to stderr so stdout stays clean for MCP traffic and results
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    docsearch::tracing::init(format, cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let engine = QueryEngine::new(config).context("Invalid search configuration")?;

    match cli.command {
        Commands::Build { corpus, output, js } => {
            let documents = load_corpus(&corpus)?;
            let index = IndexStore::new(output)
                .load_or_build(documents, &engine.config().tokenizer)
                .await?;
            if let Some(js) = js {
                store::write_js(&index, &js).await?;
            }
            println!(
                "Indexed {} documents ({} terms, {} objects), generation {}",
                index.document_count(),
                index.term_count(),
                index.object_count(),
                index.stamp().generation
            );
        }
        Commands::Search {
            query,
            source,
            limit,
            json,
        } => {
            let (index, _) = open_index(&source, &engine).await?;
            let hits = engine.search(&index, &query);
            if json {
                let shown = &hits[..hits.len().min(limit)];
                println!("{}", serde_json::to_string_pretty(shown)?);
            } else if hits.is_empty() {
                println!("No results found for '{query}'.");
            } else {
                print!("{}", format_search_results(&hits, &query, limit));
            }
        }
        Commands::Serve { source } => {
            let (index, source) = open_index(&source, &engine).await?;
            tracing::info!(
                "Starting docsearch MCP server ({} documents)",
                index.document_count()
            );

            let state = Arc::new(SearchState::new(index, engine, source));
            let server = SearchServer::new(state);
            let service = server.serve(stdio()).await.inspect_err(|e| {
                tracing::error!("Error serving MCP server: {:?}", e);
            })?;

            // Wait for the service to complete
            service.waiting().await?;
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<SearchConfig> {
    match explicit {
        Some(path) => SearchConfig::load(path),
        None => match SearchConfig::default_path() {
            Some(path) => SearchConfig::load(&path),
            None => Ok(SearchConfig::default()),
        },
    }
}

/// Resolves the index a command should use, along with how to rebuild it.
async fn open_index(
    source: &SourceArgs,
    engine: &QueryEngine,
) -> anyhow::Result<(SearchIndex, Option<IndexSource>)> {
    let Some(corpus) = source.corpus.clone() else {
        let path = source
            .index
            .as_deref()
            .context("Either --corpus or --index is required")?;
        return Ok((store::read_index(path).await?, None));
    };

    let index_path: PathBuf = match source.index.clone() {
        Some(path) => path,
        None => store::default_index_path(&corpus)
            .context("No cache directory available; pass --index")?,
    };
    let index_store = IndexStore::new(index_path);

    let documents = load_corpus(&corpus)?;
    let index = index_store
        .load_or_build(documents, &engine.config().tokenizer)
        .await?;

    Ok((
        index,
        Some(IndexSource {
            corpus,
            store: index_store,
        }),
    ))
}
