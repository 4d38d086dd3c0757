//! Search configuration: scoring weights, tokenizer rules, and query limits.
//!
//! All sections default sensibly, so an absent or partial TOML file is valid.

use crate::error::{QueryError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Common English stop words excluded from indexing.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it", "near",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub weights: Weights,
    pub tokenizer: TokenizerConfig,
    pub query: QueryConfig,
}

/// Relative scoring weights. Exact matches use the plain weights, prefix
/// expansions the `_partial` ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub title: f32,
    pub title_partial: f32,
    pub body: f32,
    pub body_partial: f32,
    pub object: f32,
    pub object_partial: f32,
    /// Multiplier added per priority level of a matched object.
    pub object_priority_step: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            title: 15.0,
            title_partial: 7.0,
            body: 5.0,
            body_partial: 2.0,
            object: 11.0,
            object_partial: 6.0,
            object_priority_step: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Tokens shorter than this (in characters) are not indexed.
    pub min_length: usize,
    pub stop_words: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixMode {
    /// Expand every query term to the indexed terms it prefixes.
    Always,
    /// Expand only when the exact lookup found nothing.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Drop stop words from the query. When off, every typed word must match.
    pub filter_stop_words: bool,
    /// Query words shorter than this are ignored.
    pub min_length: usize,
    pub prefix_mode: PrefixMode,
    /// Query terms shorter than this are matched exactly only.
    pub min_prefix_length: usize,
    /// Ranked results beyond this are truncated.
    pub max_results: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            // On, unlike plain conjunctive lookup: stop words are never indexed,
            // so an unfiltered "the" would empty every query that contains it.
            filter_stop_words: true,
            min_length: 1,
            prefix_mode: PrefixMode::Always,
            min_prefix_length: 2,
            max_results: 1000,
        }
    }
}

impl SearchConfig {
    /// Default config file location: `<config_dir>/docsearch/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docsearch").join("config.toml"))
    }

    /// Loads and validates configuration. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        tracing::info!("Loaded search config from {}", path.display());
        Ok(config)
    }

    /// Parses TOML text and validates the result.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), QueryError> {
        let w = &self.weights;
        for (name, value) in [
            ("title", w.title),
            ("title_partial", w.title_partial),
            ("body", w.body),
            ("body_partial", w.body_partial),
            ("object", w.object),
            ("object_partial", w.object_partial),
            ("object_priority_step", w.object_priority_step),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(QueryError::InvalidWeight { name, value });
            }
        }

        for (stronger, stronger_value, weaker, weaker_value) in [
            ("title", w.title, "body", w.body),
            ("title_partial", w.title_partial, "body_partial", w.body_partial),
        ] {
            if stronger_value <= weaker_value {
                return Err(QueryError::WeightOrdering {
                    stronger,
                    stronger_value,
                    weaker,
                    weaker_value,
                });
            }
        }

        if self.tokenizer.min_length == 0 {
            return Err(QueryError::InvalidTokenizer);
        }

        let q = &self.query;
        for (name, value) in [
            ("min_length", q.min_length),
            ("min_prefix_length", q.min_prefix_length),
            ("max_results", q.max_results),
        ] {
            if value == 0 {
                return Err(QueryError::InvalidLimit { name });
            }
        }

        Ok(())
    }
}
