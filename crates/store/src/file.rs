//! File-backed document store.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//!   <collection>/
//!     <s1>/
//!       <s2>/
//!         <id>/
//!           document.json
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the document id.
//!
//! Each `document.json` holds the id and the typed fields. Listing walks the shard
//! tree; a document file that cannot be parsed is logged and skipped so one corrupt
//! record does not hide the rest of the collection.

use crate::document::{order_documents, resolve_server_timestamps};
use crate::{
    validate_collection_name, Document, DocumentId, DocumentStore, Fields, StoreError,
    StoreResult,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Filename of the JSON file holding a single document.
pub const DOCUMENT_FILENAME: &str = "document.json";

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredDocument {
    id: String,
    fields: Fields,
}

/// A [`DocumentStore`] persisting each document as JSON under a root directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collection_dir(&self, collection: &str) -> StoreResult<PathBuf> {
        validate_collection_name(collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, id: &DocumentId) -> StoreResult<PathBuf> {
        Ok(id
            .sharded_dir(&self.collection_dir(collection)?)
            .join(DOCUMENT_FILENAME))
    }

    /// Allocates a fresh id whose sharded directory does not exist yet and creates it.
    ///
    /// Guards against id collisions (or directories created behind the store's back)
    /// by retrying a bounded number of times.
    fn create_unique_document_dir(
        &self,
        collection_dir: &Path,
    ) -> StoreResult<(DocumentId, PathBuf)> {
        for _attempt in 0..5 {
            let id = DocumentId::new();
            let candidate = id.sharded_dir(collection_dir);

            if candidate.exists() {
                continue;
            }

            if let Some(parent) = candidate.parent() {
                fs::create_dir_all(parent).map_err(StoreError::DirCreation)?;
            }

            match fs::create_dir(&candidate) {
                Ok(()) => return Ok((id, candidate)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StoreError::DirCreation(e)),
            }
        }

        Err(StoreError::DirCreation(io::Error::new(
            ErrorKind::AlreadyExists,
            "failed to allocate a unique document directory after 5 attempts",
        )))
    }

    /// Writes the document to a sibling temp file and renames it over `path`, so
    /// readers see either the previous or the new contents, never a partial file.
    fn write_document(path: &Path, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        let stored = StoredDocument {
            id: id.to_string(),
            fields,
        };
        let json = serde_json::to_string_pretty(&stored).map_err(StoreError::Serialization)?;

        let dir = path.parent().ok_or_else(|| {
            StoreError::FileWrite(io::Error::new(
                ErrorKind::InvalidInput,
                format!("document path has no parent: {}", path.display()),
            ))
        })?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(StoreError::FileWrite)?;
        tmp.write_all(json.as_bytes()).map_err(StoreError::FileWrite)?;
        tmp.persist(path).map_err(|e| StoreError::FileWrite(e.error))?;
        Ok(())
    }

    /// Reads and parses one document file, reporting the failing field path on error.
    fn read_document(path: &Path) -> StoreResult<Document> {
        let contents = fs::read_to_string(path).map_err(StoreError::FileRead)?;
        let mut deserializer = serde_json::Deserializer::from_str(&contents);

        let stored: StoredDocument = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| {
                let path = err.path().to_string();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                StoreError::Deserialization {
                    path,
                    message: err.into_inner().to_string(),
                }
            })?;

        let id = DocumentId::parse(&stored.id)?;
        let dir_id = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str());
        if dir_id != Some(stored.id.as_str()) {
            return Err(StoreError::IdMismatch {
                id: stored.id,
                path: path.display().to_string(),
            });
        }

        Ok(Document {
            id,
            fields: stored.fields,
        })
    }
}

impl DocumentStore for FileStore {
    fn add(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId> {
        let collection_dir = self.collection_dir(collection)?;
        let (id, dir) = self.create_unique_document_dir(&collection_dir)?;
        let fields = resolve_server_timestamps(fields, Utc::now());

        if let Err(err) = Self::write_document(&dir.join(DOCUMENT_FILENAME), &id, fields) {
            if let Err(cleanup) = fs::remove_dir_all(&dir) {
                tracing::warn!(
                    "failed to clean up document directory {}: {}",
                    dir.display(),
                    cleanup
                );
            }
            return Err(err);
        }

        tracing::debug!("created document {}/{}", collection, id);
        Ok(id)
    }

    fn list_ordered_by(&self, collection: &str, field: &str) -> StoreResult<Vec<Document>> {
        let collection_dir = self.collection_dir(collection)?;
        let mut documents = Vec::new();

        let s1_iter = match fs::read_dir(&collection_dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(documents),
            Err(e) => return Err(StoreError::FileRead(e)),
        };

        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let Ok(s2_iter) = fs::read_dir(&s1_path) else {
                continue;
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let Ok(id_iter) = fs::read_dir(&s2_path) else {
                    continue;
                };

                for id_ent in id_iter.flatten() {
                    let doc_path = id_ent.path().join(DOCUMENT_FILENAME);
                    if !doc_path.is_file() {
                        continue;
                    }

                    match Self::read_document(&doc_path) {
                        Ok(doc) => documents.push(doc),
                        Err(e) => {
                            tracing::warn!(
                                "failed to parse document: {} - {}",
                                doc_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        Ok(order_documents(documents, field))
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collection_dir = self.collection_dir(collection)?;
        let Ok(id) = DocumentId::parse(id) else {
            return Ok(None);
        };

        let path = id.sharded_dir(&collection_dir).join(DOCUMENT_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_document(&path).map(Some)
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let not_found = || StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        let doc_id = DocumentId::parse(id).map_err(|_| not_found())?;
        let path = self.document_path(collection, &doc_id)?;
        if !path.is_file() {
            return Err(not_found());
        }

        let mut existing = Self::read_document(&path)?;
        existing
            .fields
            .extend(resolve_server_timestamps(fields, Utc::now()));
        Self::write_document(&path, &doc_id, existing.fields)?;

        tracing::debug!("updated document {}/{}", collection, doc_id);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let collection_dir = self.collection_dir(collection)?;
        let Ok(id) = DocumentId::parse(id) else {
            return Ok(());
        };

        match fs::remove_dir_all(id.sharded_dir(&collection_dir)) {
            Ok(()) => {
                tracing::debug!("deleted document {}/{}", collection, id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::FileDelete(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldValue;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn patient(name: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("nome_pac".into(), FieldValue::Text(name.into()));
        fields.insert("peso_pac".into(), FieldValue::Number(70.0));
        fields.insert("created_at".into(), FieldValue::ServerTimestamp);
        fields
    }

    #[test]
    fn add_writes_document_into_sharded_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());

        let id = store.add("pacientes", patient("Ana")).expect("add should succeed");

        let path = id
            .sharded_dir(&temp_dir.path().join("pacientes"))
            .join(DOCUMENT_FILENAME);
        assert!(path.is_file(), "document.json should exist");

        let raw = fs::read_to_string(&path).expect("should read document.json");
        assert!(raw.contains("\"timestamp\""), "server timestamp should be resolved");
        assert!(!raw.contains("server_timestamp"));
    }

    #[test]
    fn get_reads_back_typed_fields() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());
        let birth = Utc.with_ymd_and_hms(1990, 1, 15, 0, 0, 0).unwrap();

        let mut fields = patient("Ana");
        fields.insert("data_nasc_pac".into(), FieldValue::Timestamp(birth));
        let id = store.add("pacientes", fields).unwrap();

        let doc = store
            .get("pacientes", &id.to_string())
            .unwrap()
            .expect("document should exist");
        assert_eq!(doc.id, id);
        assert_eq!(doc.text("nome_pac"), Some("Ana"));
        assert_eq!(doc.number("peso_pac"), Some(70.0));
        assert_eq!(doc.timestamp("data_nasc_pac"), Some(birth));
    }

    #[test]
    fn get_returns_none_for_unknown_or_malformed_ids() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());

        assert!(store
            .get("pacientes", &DocumentId::new().to_string())
            .unwrap()
            .is_none());
        assert!(store.get("pacientes", "../../etc").unwrap().is_none());
    }

    #[test]
    fn list_returns_empty_for_nonexistent_collection() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());

        let docs = store.list_ordered_by("pacientes", "nome_pac").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn list_orders_and_skips_invalid_documents() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());
        store.add("pacientes", patient("Bruno")).unwrap();
        store.add("pacientes", patient("Ana")).unwrap();

        let broken = DocumentId::new().sharded_dir(&temp_dir.path().join("pacientes"));
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join(DOCUMENT_FILENAME), "{ not json").unwrap();

        let names: Vec<_> = store
            .list_ordered_by("pacientes", "nome_pac")
            .unwrap()
            .iter()
            .map(|d| d.text("nome_pac").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Ana", "Bruno"]);
    }

    #[test]
    fn schema_mismatch_reports_field_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());
        let id = DocumentId::new();
        let dir = id.sharded_dir(&temp_dir.path().join("pacientes"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(DOCUMENT_FILENAME),
            format!(r#"{{"id":"{id}","fields":{{"peso_pac":{{"type":"number","value":"heavy"}}}}}}"#),
        )
        .unwrap();

        let err = store
            .get("pacientes", &id.to_string())
            .expect_err("malformed document should fail");
        match err {
            StoreError::Deserialization { path, .. } => {
                assert!(path.contains("peso_pac"), "path was {path}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn update_merges_fields_and_persists() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());
        let id = store.add("pacientes", patient("Ana")).unwrap();
        let created = store
            .get("pacientes", &id.to_string())
            .unwrap()
            .unwrap()
            .timestamp("created_at");

        let mut change = Fields::new();
        change.insert("nome_pac".into(), FieldValue::Text("Ana Maria".into()));
        change.insert("updated_at".into(), FieldValue::ServerTimestamp);
        store.update("pacientes", &id.to_string(), change).unwrap();

        let doc = store.get("pacientes", &id.to_string()).unwrap().unwrap();
        assert_eq!(doc.text("nome_pac"), Some("Ana Maria"));
        assert_eq!(doc.timestamp("created_at"), created);
        assert!(doc.timestamp("updated_at").is_some());
    }

    #[test]
    fn readers_never_observe_a_partially_written_update() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());
        let id = store.add("pacientes", patient("Ana")).unwrap().to_string();
        let padding = "x".repeat(200 * 1024);
        let done = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..200 {
                    let mut change = Fields::new();
                    change.insert(
                        "nome_pac".into(),
                        FieldValue::Text(format!("Ana {i} {padding}")),
                    );
                    store.update("pacientes", &id, change).expect("update should succeed");
                }
                done.store(true, std::sync::atomic::Ordering::SeqCst);
            });

            let mut reads = 0;
            while reads < 200 || !done.load(std::sync::atomic::Ordering::SeqCst) {
                let listed = store.list_ordered_by("pacientes", "nome_pac").unwrap();
                assert_eq!(listed.len(), 1, "patient vanished from listing");

                let doc = store
                    .get("pacientes", &id)
                    .expect("get should not see a partial file")
                    .expect("document should exist");
                assert!(doc.text("nome_pac").is_some_and(|n| n.starts_with("Ana")));
                reads += 1;
            }
        });

        let entries: Vec<_> = fs::read_dir(
            DocumentId::parse(&id)
                .unwrap()
                .sharded_dir(&temp_dir.path().join("pacientes")),
        )
        .unwrap()
        .flatten()
        .map(|e| e.file_name())
        .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(DOCUMENT_FILENAME)]);
    }

    #[test]
    fn document_copied_under_another_id_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());
        let id = store.add("pacientes", patient("Ana")).unwrap();
        let collection_dir = temp_dir.path().join("pacientes");

        let copy_id = DocumentId::new();
        let copy_dir = copy_id.sharded_dir(&collection_dir);
        fs::create_dir_all(&copy_dir).unwrap();
        fs::copy(
            id.sharded_dir(&collection_dir).join(DOCUMENT_FILENAME),
            copy_dir.join(DOCUMENT_FILENAME),
        )
        .unwrap();

        let listed = store.list_ordered_by("pacientes", "nome_pac").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);

        let err = store
            .get("pacientes", &copy_id.to_string())
            .expect_err("mismatched id should fail");
        assert!(matches!(err, StoreError::IdMismatch { .. }));
    }

    #[test]
    fn update_of_missing_document_is_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());

        let err = store
            .update("pacientes", &DocumentId::new().to_string(), patient("X"))
            .expect_err("update should fail");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_document_and_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());
        let id = store.add("pacientes", patient("Ana")).unwrap();

        store.delete("pacientes", &id.to_string()).unwrap();
        store.delete("pacientes", &id.to_string()).unwrap();

        assert!(store.get("pacientes", &id.to_string()).unwrap().is_none());
        assert!(store
            .list_ordered_by("pacientes", "nome_pac")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn invalid_collection_is_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path());

        let err = store
            .add("../escape", patient("Ana"))
            .expect_err("add should fail");
        assert!(matches!(err, StoreError::InvalidCollection(_)));
    }
}
