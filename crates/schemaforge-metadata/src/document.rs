//! Metadata document persistence.
//!
//! The normalized tree is written as pretty-printed JSON so it can be
//! inspected, diffed and reloaded without re-reading the source graph.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::MetadataError;
use crate::metadata::ApplicationMetadata;

impl ApplicationMetadata {
    /// Serializes the metadata to a pretty-printed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses metadata from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the metadata document to `path`.
    ///
    /// # Errors
    ///
    /// Returns an IO or serialization error.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MetadataError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), application = %self.name, "Metadata document written");
        Ok(())
    }

    /// Loads a metadata document from `path`.
    ///
    /// # Errors
    ///
    /// Returns an IO or deserialization error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let metadata = Self::from_json(&content)?;
        debug!(path = %path.display(), application = %metadata.name, "Metadata document loaded");
        Ok(metadata)
    }
}
