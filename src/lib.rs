pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod search;
pub mod server;
pub mod stamp;
pub mod store;
pub mod tools;
pub mod tracing;

pub use config::{PrefixMode, QueryConfig, SearchConfig, TokenizerConfig, Weights};
pub use corpus::{Document, ObjectDescription, load_corpus};
pub use error::{BuildError, DecodeError, QueryError, Result};
pub use search::{
    DocId, Field, IndexBuilder, MatchedObject, ParsedQuery, QueryEngine, SearchHit, SearchIndex,
    Tokenizer, build, search,
};
pub use server::{IndexSource, SearchServer, SearchState};
pub use stamp::{Digest, EnvironmentStamp};
pub use store::{IndexStore, SharedIndex};
