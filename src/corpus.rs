//! Corpus input: the document records the builder consumes.
//!
//! A corpus is either a JSON file holding an array of [`Document`]s or a
//! directory of text pages (`.md`, `.rst`, `.txt`).

use crate::error::Result;
use anyhow::Context;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions picked up when a corpus is a directory of pages.
const PAGE_EXTENSIONS: &[&str] = &["md", "rst", "txt"];

/// One page of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable logical path, unique across the corpus.
    pub docname: String,
    pub filename: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub objects: Vec<ObjectDescription>,
}

/// An API symbol documented on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub anchor: String,
    pub type_label: String,
    /// Human-readable type name; defaults to `"{domain} {type_label}"`.
    #[serde(default)]
    pub display_label: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
}

const fn default_priority() -> u8 {
    1
}

impl ObjectDescription {
    pub fn display_label(&self) -> String {
        self.display_label
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.domain, self.type_label))
    }
}

/// Loads a corpus from a JSON file or a directory of pages.
pub fn load_corpus(path: &Path) -> Result<Vec<Document>> {
    let documents = if path.is_dir() {
        load_directory(path)?
    } else {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse corpus {}", path.display()))?
    };

    tracing::info!(
        "Loaded corpus of {} documents from {}",
        documents.len(),
        path.display()
    );
    Ok(documents)
}

/// Reads every page under `root` in path order, so document ids are stable.
fn load_directory(root: &Path) -> Result<Vec<Document>> {
    let mut entries: Vec<_> = WalkBuilder::new(root)
        .build()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext))
        })
        .collect();

    entries.sort_by(|a, b| a.path().cmp(b.path()));

    let mut documents = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.path();
        let rel_path = path.strip_prefix(root).unwrap_or(path);
        let filename = rel_path.to_string_lossy().replace('\\', "/");
        let docname = rel_path
            .with_extension("")
            .to_string_lossy()
            .replace('\\', "/");

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page {}", path.display()))?;
        let stem = rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (title, body) = split_page(&content, &stem);

        documents.push(Document {
            docname,
            filename,
            title,
            body,
            objects: vec![],
        });
    }

    Ok(documents)
}

/// Separates a page's title from its body.
///
/// The title is the first non-blank line when it is a `#` heading or is
/// underlined with `=`/`-`; otherwise `fallback` is used and the whole page is body.
pub(crate) fn split_page(content: &str, fallback: &str) -> (String, String) {
    let lines: Vec<&str> = content.lines().collect();
    let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) else {
        return (fallback.to_string(), String::new());
    };

    let heading = lines[first].trim();
    if let Some(title) = heading.strip_prefix('#') {
        let title = title.trim_start_matches('#').trim_end_matches('#').trim();
        return (title.to_string(), lines[first + 1..].join("\n"));
    }

    let underlined = lines.get(first + 1).is_some_and(|next| {
        let next = next.trim();
        next.len() >= 3 && (next.chars().all(|c| c == '=') || next.chars().all(|c| c == '-'))
    });
    if underlined {
        return (heading.to_string(), lines[first + 2..].join("\n"));
    }

    (fallback.to_string(), content.to_string())
}
