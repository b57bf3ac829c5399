//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services. Request handling never reads process-wide environment variables.

use crate::{PatientError, PatientResult};
use pacientes_store::{validate_collection_name, DocumentStore, FileStore, MemoryStore};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Which [`DocumentStore`] implementation backs the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// JSON documents under the patient data directory.
    #[default]
    File,
    /// Process memory; everything is lost on exit.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(PatientError::InvalidConfig(format!(
                "unknown store backend {other:?} (expected \"file\" or \"memory\")"
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::File => f.write_str("file"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_dir: PathBuf,
    collection: String,
    backend: StoreBackend,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidConfig`] if `collection` is not a usable
    /// collection name.
    pub fn new(
        patient_data_dir: PathBuf,
        collection: String,
        backend: StoreBackend,
    ) -> PatientResult<Self> {
        validate_collection_name(&collection)
            .map_err(|e| PatientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            patient_data_dir,
            collection,
            backend,
        })
    }

    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Builds the configured document store.
    pub fn open_store(&self) -> Arc<dyn DocumentStore> {
        match self.backend {
            StoreBackend::File => Arc::new(FileStore::new(self.patient_data_dir.clone())),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        }
    }
}

/// Parse the store backend from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`StoreBackend::File`].
pub fn store_backend_from_env_value(value: Option<String>) -> PatientResult<StoreBackend> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<StoreBackend>())
        .transpose()
        .map(Option::unwrap_or_default)
}
