//! The site-wide view counter.
//!
//! The counter lives in a single JSON document of the form
//! `{"total_views": N}`. Every hit reads the document, bumps the count by
//! one and writes the whole document back.
//!
//! Increments within this process are serialized by a mutex. Two processes
//! sharing the same file can still lose an update between read and write.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

use super::document::{DocumentError, JsonDocument};

/// Value returned by [`ViewCounter::increment`] when the count could not be
/// updated.
pub const INCREMENT_FAILED: i64 = -1;

/// Errors that leave the counter unchanged.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The stored total cannot grow any further.
    #[error("view count in {path} is already at {total}")]
    Overflow { path: PathBuf, total: i64 },
}

/// The persisted counter document.
///
/// Keys other than `total_views` are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewCount {
    pub total_views: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ViewCount {
    pub fn zero() -> Self {
        ViewCount {
            total_views: 0,
            extra: Map::new(),
        }
    }
}

/// Owns the counter document and the lock around its read-modify-write.
#[derive(Debug)]
pub struct ViewCounter {
    document: JsonDocument,
    lock: Mutex<()>,
}

impl ViewCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ViewCounter {
            document: JsonDocument::new(path),
            lock: Mutex::new(()),
        }
    }

    pub fn document(&self) -> &JsonDocument {
        &self.document
    }

    /// Adds one view and returns the new total.
    ///
    /// Failures are logged and reported as [`INCREMENT_FAILED`]. A missing
    /// file is a failure; it is not recreated here.
    pub fn increment(&self) -> i64 {
        match self.try_increment() {
            Ok(total) => total,
            Err(e) => {
                error!("Error updating views: {e}");
                INCREMENT_FAILED
            }
        }
    }

    /// Adds one view, propagating IO and parse errors.
    ///
    /// The file is not written when the total would overflow.
    pub fn try_increment(&self) -> Result<i64, CounterError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut count: ViewCount = self.document.load()?;
        count.total_views = count
            .total_views
            .checked_add(1)
            .ok_or_else(|| CounterError::Overflow {
                path: self.document.path().to_path_buf(),
                total: count.total_views,
            })?;
        self.document.save(&count)?;

        Ok(count.total_views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn fresh_counter(dir: &tempfile::TempDir) -> ViewCounter {
        let counter = ViewCounter::new(dir.path().join("views.json"));
        counter.document().save(&ViewCount::zero()).unwrap();
        counter
    }

    #[test]
    fn increment_from_zero() {
        let dir = tempdir().unwrap();
        let counter = fresh_counter(&dir);

        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);

        let stored: ViewCount = counter.document().load().unwrap();
        assert_eq!(stored.total_views, 2);
    }

    #[test]
    fn missing_file_returns_sentinel() {
        let dir = tempdir().unwrap();
        let counter = fresh_counter(&dir);
        std::fs::remove_file(counter.document().path()).unwrap();

        assert_eq!(counter.increment(), INCREMENT_FAILED);
        assert!(!counter.document().path().exists());
    }

    #[test]
    fn corrupt_file_returns_sentinel_and_is_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("views.json");
        std::fs::write(&path, "{\"total_views\": ").unwrap();
        let counter = ViewCounter::new(&path);

        assert_eq!(counter.increment(), INCREMENT_FAILED);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"total_views\": "
        );
    }

    #[test]
    fn missing_key_returns_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("views.json");
        std::fs::write(&path, r#"{"views": 3}"#).unwrap();

        assert_eq!(ViewCounter::new(&path).increment(), INCREMENT_FAILED);
    }

    #[test]
    fn saturated_count_returns_sentinel_and_is_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("views.json");
        let saturated = format!(r#"{{"total_views":{}}}"#, i64::MAX);
        std::fs::write(&path, &saturated).unwrap();
        let counter = ViewCounter::new(&path);

        assert!(matches!(
            counter.try_increment(),
            Err(CounterError::Overflow { total: i64::MAX, .. })
        ));
        assert_eq!(counter.increment(), INCREMENT_FAILED);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), saturated);
    }

    #[test]
    fn extra_keys_survive_increment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("views.json");
        std::fs::write(&path, r#"{"total_views": 41, "since": "2024-01-01"}"#).unwrap();
        let counter = ViewCounter::new(&path);

        assert_eq!(counter.increment(), 42);

        let stored: Value = counter.document().load().unwrap();
        assert_eq!(stored, json!({"total_views": 42, "since": "2024-01-01"}));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let dir = tempdir().unwrap();
        let counter = Arc::new(fresh_counter(&dir));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        assert!(counter.increment() > 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored: ViewCount = counter.document().load().unwrap();
        assert_eq!(stored.total_views, 200);
    }
}
