// src/store.rs
//
// Whole-collection JSON persistence. `load` reads the full array, `save`
// rewrites it. Saves carry an optimistic revision check so two handlers
// racing on the same collection cannot silently clobber each other.

use serde_json::Value;
use std::{
    collections::HashMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::model::Record;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error ({context}): {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Revision conflict on collection '{collection}': expected {expected}, found {found}")]
    Conflict {
        collection: String,
        expected: u64,
        found: u64,
    },
}

fn io_context(source: std::io::Error, context: String) -> StoreError {
    StoreError::Io { source, context }
}

/// Data-loss warning surfaced to admins instead of being swallowed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreWarning {
    pub collection: String,
    pub detail: String,
}

pub struct Loaded<T> {
    pub records: Vec<T>,
    pub revision: u64,
}

impl<T: Record> Loaded<T> {
    /// Next id for a new record in this collection: `max(id) + 1`.
    pub fn next_id(&self) -> u64 {
        self.records.iter().map(Record::id).max().unwrap_or(0) + 1
    }
}

pub struct JsonStore {
    data_dir: PathBuf,
    // Process-local revision per collection; bumped on every successful save.
    revisions: Mutex<HashMap<String, u64>>,
    warnings: Mutex<Vec<StoreWarning>>,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            revisions: Mutex::new(HashMap::new()),
            warnings: Mutex::new(Vec::new()),
        }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", collection))
    }

    fn current_revision(&self, collection: &str) -> u64 {
        *self
            .revisions
            .lock()
            .unwrap()
            .get(collection)
            .unwrap_or(&0)
    }

    fn push_warning(&self, collection: &str, detail: String) {
        self.warnings.lock().unwrap().push(StoreWarning {
            collection: collection.to_string(),
            detail,
        });
    }

    /// Warnings accumulated since startup (malformed files that were treated
    /// as empty). Surfaced on the admin warnings page.
    pub fn warnings(&self) -> Vec<StoreWarning> {
        self.warnings.lock().unwrap().clone()
    }

    /// Loads a whole collection. A missing file yields an empty collection.
    /// A file whose top-level JSON is malformed is logged, recorded as an
    /// admin warning and treated as empty; individual records that fail to
    /// decode are skipped with a warning (partial-result tolerance).
    pub fn load<T: Record>(&self) -> Result<Loaded<T>, StoreError> {
        let collection = T::COLLECTION;
        let path = self.collection_path(collection);
        let revision = self.current_revision(collection);

        if !path.exists() {
            return Ok(Loaded {
                records: Vec::new(),
                revision,
            });
        }

        let json_string = fs::read_to_string(&path)
            .map_err(|e| io_context(e, format!("Failed to read collection file {:?}", path)))?;

        let raw: Vec<Value> = match serde_json::from_str(&json_string) {
            Ok(raw) => raw,
            Err(e) => {
                error!(
                    "Malformed JSON in collection '{}' ({:?}): {}. Treating as empty.",
                    collection, path, e
                );
                self.push_warning(
                    collection,
                    format!("File could not be parsed and was treated as empty: {}", e),
                );
                return Ok(Loaded {
                    records: Vec::new(),
                    revision,
                });
            }
        };

        let mut records = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        "Skipping undecodable record in collection '{}': {} ({})",
                        collection, e, value
                    );
                }
            }
        }

        Ok(Loaded { records, revision })
    }

    /// Rewrites a whole collection. `expected_revision` must match the
    /// revision returned by the `load` this save is based on; otherwise the
    /// collection changed underneath the caller and the save is rejected.
    /// Returns the new revision.
    pub fn save<T: Record>(
        &self,
        records: &[T],
        expected_revision: u64,
    ) -> Result<u64, StoreError> {
        let collection = T::COLLECTION;

        let mut revisions = self.revisions.lock().unwrap();
        let current = *revisions.get(collection).unwrap_or(&0);
        if current != expected_revision {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                expected: expected_revision,
                found: current,
            });
        }

        fs::create_dir_all(&self.data_dir).map_err(|e| {
            io_context(
                e,
                format!("Failed to create data directory {:?}", self.data_dir),
            )
        })?;

        let json_string = serde_json::to_string_pretty(records)?;
        let path = self.collection_path(collection);
        let tmp_path = self.data_dir.join(format!("{}.json.tmp", collection));

        let mut file = File::create(&tmp_path)
            .map_err(|e| io_context(e, format!("Failed to create temp file {:?}", tmp_path)))?;
        file.write_all(json_string.as_bytes())
            .map_err(|e| io_context(e, format!("Failed to write collection {:?}", tmp_path)))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            io_context(
                e,
                format!("Failed to move {:?} into place at {:?}", tmp_path, path),
            )
        })?;

        let next = current + 1;
        revisions.insert(collection.to_string(), next);
        Ok(next)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
