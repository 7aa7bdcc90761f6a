//! JSON documents on the local filesystem.
//!
//! Each data file of the site (`views.json`, `honour.json`,
//! `goodbyes.json`) is one [`JsonDocument`]. Handlers go through this type
//! rather than opening paths themselves, so the documents could move to a
//! real store without touching the endpoints.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::atomic::write_atomic;

/// Errors that can occur while reading or writing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// IO error during file operations.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// A single JSON document stored at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonDocument {
    path: PathBuf,
}

impl JsonDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonDocument { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and deserializes the document.
    pub fn load<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = std::fs::read(&self.path).map_err(|source| self.io_error(source))?;
        serde_json::from_slice(&bytes).map_err(|source| self.json_error(source))
    }

    /// Serializes `value` and replaces the document atomically.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value).map_err(|source| self.json_error(source))?;
        write_atomic(&self.path, &bytes).map_err(|source| self.io_error(source))
    }

    /// Writes `default` if the document does not exist yet.
    ///
    /// Returns true if the file was created. An existing file is left
    /// untouched even when it is not valid JSON.
    pub fn ensure<T: Serialize>(&self, default: &T) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(default)?;
        Ok(true)
    }

    fn io_error(&self, source: io::Error) -> DocumentError {
        DocumentError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> DocumentError {
        DocumentError::Json {
            path: self.path.clone(),
            source,
        }
    }
}
