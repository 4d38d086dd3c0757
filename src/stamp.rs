//! Environment stamps for cache invalidation.
//!
//! A stamp records which corpus and tokenizer configuration produced an index,
//! plus a generation counter that increases with every rebuild. The query engine
//! never looks at it; the store uses it to decide whether a cached index is stale.

use crate::config::TokenizerConfig;
use crate::corpus::Document;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::Xxh3;

/// Bumped whenever the on-disk layout of an index changes.
pub const FORMAT_VERSION: u32 = 1;

/// 64-bit content digest, rendered as 16 lowercase hex characters.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct Digest(u64);

impl Digest {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the digest as a lowercase hexadecimal string
    pub fn as_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

impl FromStr for Digest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 16 {
            return Err(ParseDigestError::InvalidLength(s.len()));
        }
        u64::from_str_radix(s, 16)
            .map(Digest)
            .map_err(|_| ParseDigestError::InvalidHex)
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for digest parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDigestError {
    #[error("invalid hexadecimal characters in digest string")]
    InvalidHex,
    #[error("invalid digest length: expected 16 hex characters, got {0}")]
    InvalidLength(usize),
}

/// Opaque fingerprint attached to a whole index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentStamp {
    pub format_version: u32,
    /// 0 for a first build, previous + 1 afterwards.
    pub generation: u64,
    pub digest: Digest,
}

impl EnvironmentStamp {
    /// Stamp for a fresh build following `previous` (if any).
    pub fn next(previous: Option<&Self>, digest: Digest) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: previous.map_or(0, |stamp| stamp.generation + 1),
            digest,
        }
    }

    /// Whether an index carrying this stamp still reflects `digest`.
    pub fn is_current_for(&self, digest: Digest) -> bool {
        self.format_version == FORMAT_VERSION && self.digest == digest
    }
}

/// Hashes everything that influences index contents: the corpus records in order
/// and the tokenizer rules.
pub fn corpus_digest(documents: &[Document], tokenizer: &TokenizerConfig) -> Digest {
    let mut hasher = Xxh3::new();
    let mut field = |bytes: &[u8]| {
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    };

    field(&FORMAT_VERSION.to_le_bytes());
    field(&(tokenizer.min_length as u64).to_le_bytes());
    for word in &tokenizer.stop_words {
        field(word.as_bytes());
    }

    for doc in documents {
        field(doc.docname.as_bytes());
        field(doc.filename.as_bytes());
        field(doc.title.as_bytes());
        field(doc.body.as_bytes());
        for object in &doc.objects {
            field(object.name.as_bytes());
            field(object.domain.as_bytes());
            field(object.anchor.as_bytes());
            field(object.type_label.as_bytes());
            field(object.display_label.as_deref().unwrap_or_default().as_bytes());
            field(&[object.priority]);
        }
    }

    Digest(hasher.digest())
}
