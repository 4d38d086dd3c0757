use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "docsearch", version)]
#[command(about = "Build and query full-text search indexes for documentation sites", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/docsearch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build an index from a corpus file or directory
    Build {
        corpus: PathBuf,
        /// Binary index to write
        #[arg(short, long, default_value = "searchindex.bin")]
        output: PathBuf,
        /// Also write a `Search.setIndex(...)` payload here
        #[arg(long)]
        js: Option<PathBuf>,
    },
    /// Run a single query and print ranked pages
    Search {
        query: String,
        #[command(flatten)]
        source: SourceArgs,
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve search over MCP on stdio
    Serve {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where the index comes from: a corpus (cached build) or a prebuilt index file.
#[derive(Debug, clap::Args)]
pub struct SourceArgs {
    /// Corpus file or directory; the index is built or reused from cache
    #[arg(long, required_unless_present = "index")]
    pub corpus: Option<PathBuf>,
    /// Index file. With --corpus this is the cache location; alone it is a
    /// prebuilt binary or JavaScript index
    #[arg(long)]
    pub index: Option<PathBuf>,
}
