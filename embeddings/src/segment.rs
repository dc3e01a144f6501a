//! Text segments: the unit of text handed to a provider and kept in a store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable piece of text, optionally carrying metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

impl TextSegment {
    /// Create a segment holding `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }

    /// Attach metadata to the segment.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The wrapped text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }
}

impl From<&str> for TextSegment {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextSegment {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for TextSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
