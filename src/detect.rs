//! Decides whether a document needs component rendering.
//!
//! Two signals, checked in order:
//!
//! 1. The front matter sets `components: true` (a real YAML boolean, not the
//!    string `"true"`).
//! 2. A body line contains an opening tag of a component, e.g. `<slot ` or
//!    `<g-image `.
//!
//! The body check is a plain substring scan over lines. It does not parse
//! markdown or HTML, so a tag inside a code fence also counts.

use crate::frontmatter::{Document, Metadata};
use serde_yaml::Value;

/// Tags that mark a document as component-driven when none are configured.
pub const DEFAULT_COMPONENT_TAGS: &[&str] = &["slot", "g-image"];

/// Front-matter key that opts a document into component rendering.
pub const COMPONENTS_KEY: &str = "components";

/// Outcome of the component check for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    NotRequired,
    /// Front matter failed to decode and the body had no marker.
    Unknown,
}

/// Line scanner for component markers.
#[derive(Debug, Clone)]
pub struct Detector {
    markers: Vec<String>,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DEFAULT_COMPONENT_TAGS)
    }
}

impl Detector {
    /// Build a detector matching `<{tag} ` for each tag.
    pub fn new<S: AsRef<str>>(tags: &[S]) -> Self {
        Self {
            markers: tags.iter().map(|t| format!("<{} ", t.as_ref())).collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Check a parsed document.
    pub fn requirement(&self, doc: &Document) -> Requirement {
        if opts_in(&doc.metadata) {
            return Requirement::Required;
        }
        if self.body_has_marker(&doc.body) {
            return Requirement::Required;
        }
        if doc.metadata.is_invalid() {
            return Requirement::Unknown;
        }
        Requirement::NotRequired
    }

    /// True if any line contains one of the markers.
    pub fn body_has_marker<S: AsRef<str>>(&self, lines: &[S]) -> bool {
        lines.iter().any(|line| {
            let line = line.as_ref();
            self.markers.iter().any(|m| line.contains(m.as_str()))
        })
    }
}

fn opts_in(metadata: &Metadata) -> bool {
    metadata
        .as_mapping()
        .and_then(|map| map.get(COMPONENTS_KEY))
        .is_some_and(|v| matches!(v, Value::Bool(true)))
}
