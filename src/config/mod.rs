pub mod schema;

pub use schema::{Document, SchemaCodec, SchemaError, SchemaRegistry};

use crate::metrics::ModMetrics;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::sync::Arc;
use thiserror::Error;

/// How a [`ConfigStore::load`] call produced its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// The file existed and decoded cleanly.
    Loaded,
    /// No file at the resolved path; defaults were used.
    Missing,
    /// The file could not be read or decoded; defaults were used and the
    /// original bytes were preserved at `backup` (when that write succeeded).
    Recovered { backup: Option<Utf8PathBuf> },
    /// The document type has no registered schema; defaults were used.
    Unregistered,
}

/// A document value together with where it came from.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    pub path: Utf8PathBuf,
    pub status: LoadStatus,
}

impl<T> Loaded<T> {
    /// True only when the value was actually read from disk.
    pub fn succeeded(&self) -> bool {
        self.status == LoadStatus::Loaded
    }
}

/// Errors that abort a single save.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not determine the directory for {0}")]
    NoParentDirectory(Utf8PathBuf),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Timestamp used in error and backup artifact names (`yyyy-MM-dd_HHmm`).
pub(crate) fn artifact_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d_%H%M").to_string()
}

/// Stateless load/save of JSON mod documents.
///
/// Loading never fails: a missing file yields the type's defaults, and a
/// corrupted file yields defaults plus two sibling artifacts:
/// - `{path}_corrupt_{timestamp}.json`: the unparsed bytes
/// - `{path}_corrupt_{timestamp}.json.error.txt`: what went wrong
///
/// Callers that need to tell a real load from a fallback inspect
/// [`Loaded::status`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    registry: Arc<SchemaRegistry>,
    metrics: Arc<ModMetrics>,
}

impl ConfigStore {
    /// Create a store that decodes through `registry`.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            metrics: Arc::new(ModMetrics::new()),
        }
    }

    /// Share a metrics sink with the rest of the host.
    pub fn with_metrics(mut self, metrics: Arc<ModMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<ModMetrics> {
        &self.metrics
    }

    /// Load `{base_path}/{logical_name}.json`.
    ///
    /// # Arguments
    /// * `base_path` - Directory containing the document
    /// * `logical_name` - File stem, usually the registered schema name
    ///
    /// # Returns
    /// The decoded value, or defaults when the file is missing or corrupt
    pub fn load<T: Document>(&self, base_path: &Utf8Path, logical_name: &str) -> Loaded<T> {
        let path = base_path.join(format!("{logical_name}.json"));
        self.load_path(&path)
    }

    /// Load the document registered for `T` from `base_path`.
    pub fn load_document<T: Document>(&self, base_path: &Utf8Path) -> Result<Loaded<T>, SchemaError> {
        let name = self.registry.name_of::<T>()?;
        Ok(self.load(base_path, name))
    }

    /// Load a document from an explicit file path.
    pub fn load_path<T: Document>(&self, path: &Utf8Path) -> Loaded<T> {
        let path = path.to_path_buf();

        if !path.is_file() {
            tracing::debug!("No document at {}, using defaults", path);
            return Loaded {
                value: T::default(),
                path,
                status: LoadStatus::Missing,
            };
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let backup = self.preserve_corrupt(&path, &[], &e.to_string());
                return Loaded {
                    value: T::default(),
                    path,
                    status: LoadStatus::Recovered { backup },
                };
            }
        };

        match self.registry.decode::<T>(&bytes) {
            Ok(value) => {
                self.metrics.record_document_loaded();
                tracing::debug!("Loaded document from {}", path);
                Loaded {
                    value,
                    path,
                    status: LoadStatus::Loaded,
                }
            }
            Err(SchemaError::Unregistered(type_name)) => {
                tracing::error!(
                    "Cannot decode {}: no schema registered for {}",
                    path,
                    type_name
                );
                Loaded {
                    value: T::default(),
                    path,
                    status: LoadStatus::Unregistered,
                }
            }
            Err(e) => {
                let backup = self.preserve_corrupt(&path, &bytes, &e.to_string());
                Loaded {
                    value: T::default(),
                    path,
                    status: LoadStatus::Recovered { backup },
                }
            }
        }
    }

    /// Write the corrupt bytes and a diagnostic next to `path`.
    ///
    /// Failures here are logged and swallowed; the caller already has its
    /// defaults.
    fn preserve_corrupt(&self, path: &Utf8Path, bytes: &[u8], error: &str) -> Option<Utf8PathBuf> {
        self.metrics.record_corrupt_recovery();
        tracing::warn!("Document {} is unreadable, using defaults: {}", path, error);

        match write_corrupt_backup(path, bytes, error) {
            Ok(backup) => {
                tracing::warn!("Preserved corrupt document as {}", backup);
                Some(backup)
            }
            Err(e) => {
                tracing::error!("Could not preserve corrupt document {}: {:#}", path, e);
                None
            }
        }
    }

    /// Serialize `value` and overwrite the target file.
    ///
    /// # Arguments
    /// * `base_path` - Directory for the file (ignored when `full_path_already`)
    /// * `value` - Document to write
    /// * `file_name` - Logical name, or a complete file path when `full_path_already`
    /// * `full_path_already` - Treat `file_name` as the final path
    ///
    /// # Returns
    /// The path written. Errors are logged before being returned; the save is
    /// the only thing aborted.
    pub fn save<T: Document>(
        &self,
        base_path: &Utf8Path,
        value: &T,
        file_name: &str,
        full_path_already: bool,
    ) -> Result<Utf8PathBuf, StoreError> {
        let path = if full_path_already {
            Utf8PathBuf::from(file_name)
        } else {
            base_path.join(format!("{file_name}.json"))
        };

        let result = self.write_document(&path, value);
        match &result {
            Ok(_) => tracing::info!("Saved to {}", path),
            Err(e) => tracing::error!("Could not save to '{}': {}", path, e),
        }
        result.map(|_| path)
    }

    /// Save `value` under its registered name in `base_path`.
    pub fn save_document<T: Document>(
        &self,
        base_path: &Utf8Path,
        value: &T,
    ) -> Result<Utf8PathBuf, StoreError> {
        let name = self.registry.name_of::<T>()?;
        self.save(base_path, value, name, false)
    }

    fn write_document<T: Document>(&self, path: &Utf8Path, value: &T) -> Result<(), StoreError> {
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::NoParentDirectory(path.to_path_buf()))?;

        if !parent.as_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = self.registry.encode(value)?;
        fs::write(path, json).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn write_corrupt_backup(path: &Utf8Path, bytes: &[u8], error: &str) -> Result<Utf8PathBuf> {
    let backup = Utf8PathBuf::from(format!("{}_corrupt_{}.json", path, artifact_timestamp()));
    fs::write(&backup, bytes)
        .with_context(|| format!("Failed to write corrupt backup: {}", backup))?;

    let report = Utf8PathBuf::from(format!("{}.error.txt", backup));
    fs::write(
        &report,
        format!("Reading from Json-file '{}' failed with error: {}", path, error),
    )
    .with_context(|| format!("Failed to write corruption report: {}", report))?;

    Ok(backup)
}
