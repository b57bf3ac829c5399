//! # Pacientes Store
//!
//! Document store abstraction for the pacientes application.
//!
//! Records live in named collections and are addressed by a store-assigned
//! [`DocumentId`]. The [`DocumentStore`] trait exposes the five operations the
//! application performs: add, ordered listing, read-one, update and delete.
//!
//! Two backends are provided:
//! - [`MemoryStore`]: in-process, used by tests and ephemeral runs
//! - [`FileStore`]: one JSON file per document in a sharded directory tree
//!
//! **No HTTP concerns**: rendering, routing and form handling belong in `api-web`.

pub mod document;
pub mod file;
pub mod id;
pub mod memory;

pub use document::{Document, FieldValue, Fields};
pub use file::FileStore;
pub use id::DocumentId;
pub use memory::MemoryStore;

/// Errors returned by document stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),
    #[error("invalid document id: {0:?}")]
    InvalidId(String),
    #[error("document id {id} does not match its location {path}")]
    IdMismatch { id: String, path: String },
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("failed to create document directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write document file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read document file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete document: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("document schema mismatch at {path}: {message}")]
    Deserialization { path: String, message: String },
    #[error("store lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Operations against a document store.
///
/// Implementations are synchronous; async callers are expected to run them on a
/// blocking thread.
pub trait DocumentStore: Send + Sync {
    /// Writes a new document and returns its freshly assigned id.
    fn add(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId>;

    /// Lists the documents that have `field`, ascending by its value.
    fn list_ordered_by(&self, collection: &str, field: &str) -> StoreResult<Vec<Document>>;

    /// Reads one document. Unknown or non-canonical ids yield `None`.
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Merges `fields` into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist.
    fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Deletes a document. Deleting a missing document is not an error.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

/// Checks that `name` can be used as a collection name.
///
/// Collection names must be non-empty, a single path segment, and not `.`/`..`.
pub fn validate_collection_name(name: &str) -> StoreResult<()> {
    let valid = !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}
