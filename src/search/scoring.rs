//! Relevance classification and weight lookup.

use crate::config::Weights;

use super::index::Field;

/// How a query term reached an indexed string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchKind {
    /// The indexed string starts with the query term.
    Prefix,
    /// The indexed string is the query term.
    Exact,
}

/// Classifies how `text` matches `query`:
/// - `Exact`: equal strings
/// - `Prefix`: text starts with query
/// - `None`: no match
pub fn classify(text: &str, query: &str) -> Option<MatchKind> {
    if text == query {
        Some(MatchKind::Exact)
    } else if text.starts_with(query) {
        Some(MatchKind::Prefix)
    } else {
        None
    }
}

impl Weights {
    /// Weight contributed by a prose match in `field`.
    pub fn prose(&self, field: Field, kind: MatchKind) -> f32 {
        match (field, kind) {
            (Field::Title, MatchKind::Exact) => self.title,
            (Field::Title, MatchKind::Prefix) => self.title_partial,
            (Field::Body, MatchKind::Exact) => self.body,
            (Field::Body, MatchKind::Prefix) => self.body_partial,
        }
    }

    /// Multiplier for an object of the given priority: `1 + priority * step`.
    pub fn priority_factor(&self, priority: u8) -> f32 {
        f32::from(priority).mul_add(self.object_priority_step, 1.0)
    }

    /// Weight contributed by an object-name match.
    pub fn object(&self, kind: MatchKind, priority: u8) -> f32 {
        let base = match kind {
            MatchKind::Exact => self.object,
            MatchKind::Prefix => self.object_partial,
        };
        base * self.priority_factor(priority)
    }
}
