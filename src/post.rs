//! Posts and the manifest that lists them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One article, loaded from a plain-text resource.
///
/// The resource layout is positional: the first line is the title, the
/// second a free-form publication label, and everything after is the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Resource path; doubles as cache key.
    pub identifier: String,
    pub title: String,
    pub published_label: String,
    pub body: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostParseError {
    #[error("post resource {0} is empty")]
    Empty(String),
}

impl Post {
    /// Split a raw post resource into its positional parts.
    ///
    /// # Errors
    /// Returns [`PostParseError::Empty`] when the resource has no content.
    pub fn parse(identifier: &str, raw: &str) -> Result<Self, PostParseError> {
        let normalized = raw.replace("\r\n", "\n");
        if normalized.trim().is_empty() {
            return Err(PostParseError::Empty(identifier.to_string()));
        }

        let mut lines = normalized.split('\n');
        let title = lines.next().unwrap_or_default().trim().to_string();
        let published_label = lines.next().unwrap_or_default().trim().to_string();
        let body = lines.collect::<Vec<_>>().join("\n");

        Ok(Self {
            identifier: identifier.to_string(),
            title,
            published_label,
            body,
        })
    }
}

/// Parse a manifest: one resource identifier per line, blank lines skipped.
pub fn parse_manifest(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
