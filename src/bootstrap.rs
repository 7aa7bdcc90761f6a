//! Startup preparation of the on-disk layout.

use std::io;
use std::path::PathBuf;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::store::{DocumentError, JsonDocument};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create default document: {0}")]
    Document(#[from] DocumentError),
}

/// Creates the data and diary directories and any missing data documents.
///
/// Existing documents are left exactly as they are.
pub fn ensure_layout(config: &Config) -> Result<(), BootstrapError> {
    for dir in [&config.data_dir, &config.diary_dir] {
        std::fs::create_dir_all(dir).map_err(|source| BootstrapError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }

    let empty_list = Value::Array(Vec::new());
    let defaults = [
        (config.views_path(), json!({"total_views": 0})),
        (config.honour_path(), empty_list.clone()),
        (config.goodbyes_path(), empty_list),
    ];

    for (path, default) in defaults {
        let document = JsonDocument::new(path);
        if document.ensure(&default)? {
            info!("Created {}", document.path().display());
        }
    }

    Ok(())
}
