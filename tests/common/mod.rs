//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `install_corpus`: two pages about installing a package
//! - `api_corpus`: prose pages plus an API page carrying objects
//! - `workspace`: an empty temporary directory
//!
//! [`TempWorkspace`] provides filesystem isolation for store and corpus tests;
//! it is removed when dropped.

use docsearch::{Document, ObjectDescription};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory for test isolation.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
        full_path
    }

    /// Writes `documents` as a JSON corpus file and returns its path.
    pub fn write_corpus(&self, path: &str, documents: &[Document]) -> PathBuf {
        let json = serde_json::to_string_pretty(documents).expect("corpus serializes");
        self.create_file(path, &json)
    }
}

/// A prose page without objects.
#[allow(dead_code)]
pub fn page(docname: &str, title: &str, body: &str) -> Document {
    Document {
        docname: docname.to_string(),
        filename: format!("{docname}.html"),
        title: title.to_string(),
        body: body.to_string(),
        objects: vec![],
    }
}

/// A Python-domain object description.
#[allow(dead_code)]
pub fn py_object(name: &str, type_label: &str, priority: u8) -> ObjectDescription {
    ObjectDescription {
        name: name.to_string(),
        domain: "py".to_string(),
        anchor: name.to_string(),
        type_label: type_label.to_string(),
        display_label: Some(format!("Python {type_label}")),
        priority,
    }
}

#[fixture]
pub fn install_corpus() -> Vec<Document> {
    vec![
        page(
            "intro",
            "Installation Guide",
            "Install the package using pip",
        ),
        page("setup", "Setup", "Installation requires python and pip"),
    ]
}

#[fixture]
pub fn api_corpus() -> Vec<Document> {
    let mut api = page(
        "api",
        "API Reference",
        "The runner executes features and reports every scenario outcome",
    );
    api.objects = vec![
        py_object("behave.runner.Runner", "class", 1),
        py_object("behave.runner.Runner.run", "method", 1),
        py_object("behave.model.Feature", "class", 2),
        py_object("behave.model.Scenario", "class", 1),
    ];

    vec![
        page(
            "tutorial",
            "Tutorial",
            "Write a feature file, describe each scenario, then run the runner",
        ),
        page(
            "features",
            "Feature Testing Layout",
            "Feature files live in a features directory next to the steps",
        ),
        api,
        page(
            "gherkin",
            "Gherkin Syntax",
            "Scenario outlines expand examples into concrete scenarios",
        ),
    ]
}

#[fixture]
pub fn workspace() -> TempWorkspace {
    TempWorkspace::new()
}
