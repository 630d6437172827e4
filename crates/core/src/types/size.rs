//! Garment size labels.
//!
//! Inventory documents are keyed by free-form size labels (`"S"`, `"M"`,
//! `"XL"`, ...). The label is a newtype rather than an enum so the document
//! store stays schemaless: a new label showing up in a document is data, not
//! a code change.

use serde::{Deserialize, Serialize};

/// A size label, e.g. `"M"` or `"XL"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(String);

impl Size {
    /// Create a size from any label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Size {
    /// `"M"` - the fallback wherever a size was not specified.
    fn default() -> Self {
        Self("M".to_owned())
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Size {
    fn from(label: &str) -> Self {
        Self(label.to_owned())
    }
}

impl From<String> for Size {
    fn from(label: String) -> Self {
        Self(label)
    }
}
