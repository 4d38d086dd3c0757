//! Text normalization and tokenization shared by indexing and querying.

use crate::config::TokenizerConfig;
use ahash::AHashSet;
use regex::Regex;
use std::sync::LazyLock;

/// A run of letters or digits; everything else is a boundary.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid regex"));

/// Normalized terms of one document, split by where they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTerms {
    pub title: Vec<String>,
    pub body: Vec<String>,
}

/// Turns raw text into index-eligible terms.
///
/// Normalization is lowercase folding plus splitting on non-alphanumeric
/// boundaries. No stemming: a term matches only its exact normalized form
/// (or, at query time, a form it prefixes).
#[derive(Debug, Clone)]
pub struct Tokenizer {
    min_length: usize,
    stop_words: AHashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            min_length: config.min_length,
            stop_words: config
                .stop_words
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
        }
    }

    /// Splits text into lowercase words without any filtering.
    pub fn normalize(text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        WORD.find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Whether a normalized word is long enough and not a stop word.
    pub fn is_indexable(&self, word: &str) -> bool {
        word.chars().count() >= self.min_length && !self.is_stop_word(word)
    }

    /// Produces the ordered index-eligible terms of `text`, duplicates included.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        Self::normalize(text)
            .into_iter()
            .filter(|word| self.is_indexable(word))
            .collect()
    }

    pub fn tokenize_document(&self, title: &str, body: &str) -> DocumentTerms {
        DocumentTerms {
            title: self.tokenize(title),
            body: self.tokenize(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("Installation Guide", vec!["installation", "guide"])]
    #[case("Install the package using pip", vec!["install", "package", "using", "pip"])]
    #[case("snake_case and hyphen-case", vec!["snake", "case", "hyphen", "case"])]
    #[case("HTTP2Server on port 8080", vec!["http2server", "port", "8080"])]
    #[case("a to be or", vec![])]
    fn test_tokenize_exact(#[case] input: &str, #[case] expected: Vec<&str>) {
        let tokens = Tokenizer::default().tokenize(input);
        check!(tokens == expected);
    }

    #[test]
    fn test_short_tokens_dropped() {
        let tokens = Tokenizer::default().tokenize("go io rust");
        check!(tokens == vec!["rust"]);
    }

    #[test]
    fn test_custom_min_length_and_stop_words() {
        let tokenizer = Tokenizer::new(&TokenizerConfig {
            min_length: 1,
            stop_words: vec!["Rust".to_string()],
        });
        check!(tokenizer.tokenize("go io rust") == vec!["go", "io"]);
    }

    #[test]
    fn test_normalize_keeps_everything() {
        check!(Tokenizer::normalize("The Io, a") == vec!["the", "io", "a"]);
    }

    #[test]
    fn test_length_counts_characters() {
        let tokens = Tokenizer::default().tokenize("Москва 日本 éé");
        check!(tokens == vec!["москва"]);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t")]
    #[case("🦀 -- !!")]
    fn test_empty_and_symbols(#[case] input: &str) {
        check!(Tokenizer::default().tokenize(input).is_empty());
    }

    #[test]
    fn test_document_split() {
        let terms = Tokenizer::default().tokenize_document("Setup", "Installation requires python");
        check!(terms.title == vec!["setup"]);
        check!(terms.body == vec!["installation", "requires", "python"]);
    }
}
