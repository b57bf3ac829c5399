//! In-process document store.

use crate::document::{order_documents, resolve_server_timestamps};
use crate::{
    validate_collection_name, Document, DocumentId, DocumentStore, Fields, StoreError,
    StoreResult,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

type Collection = HashMap<DocumentId, Fields>;

/// A [`DocumentStore`] kept entirely in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn add(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId> {
        validate_collection_name(collection)?;
        let fields = resolve_server_timestamps(fields, Utc::now());

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let docs = collections.entry(collection.to_string()).or_default();

        let mut id = DocumentId::new();
        while docs.contains_key(&id) {
            id = DocumentId::new();
        }
        docs.insert(id.clone(), fields);
        Ok(id)
    }

    fn list_ordered_by(&self, collection: &str, field: &str) -> StoreResult<Vec<Document>> {
        validate_collection_name(collection)?;
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;

        let documents = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(order_documents(documents, field))
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        validate_collection_name(collection)?;
        let Ok(id) = DocumentId::parse(id) else {
            return Ok(None);
        };
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .map(|fields| Document {
                id,
                fields: fields.clone(),
            }))
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        validate_collection_name(collection)?;
        let not_found = || StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        let doc_id = DocumentId::parse(id).map_err(|_| not_found())?;
        let fields = resolve_server_timestamps(fields, Utc::now());

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(&doc_id))
            .ok_or_else(not_found)?;
        existing.extend(fields);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        validate_collection_name(collection)?;
        let Ok(id) = DocumentId::parse(id) else {
            return Ok(());
        };
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(&id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldValue;

    fn named(name: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("nome".into(), FieldValue::Text(name.into()));
        fields.insert("created_at".into(), FieldValue::ServerTimestamp);
        fields
    }

    #[test]
    fn add_then_get_returns_resolved_document() {
        let store = MemoryStore::new();
        let id = store.add("pacientes", named("Ana")).unwrap();

        let doc = store
            .get("pacientes", &id.to_string())
            .unwrap()
            .expect("document should exist");
        assert_eq!(doc.text("nome"), Some("Ana"));
        assert!(doc.timestamp("created_at").is_some());
    }

    #[test]
    fn collections_are_isolated() {
        let store = MemoryStore::new();
        let id = store.add("pacientes", named("Ana")).unwrap();

        assert!(store.get("outros", &id.to_string()).unwrap().is_none());
        assert!(store.list_ordered_by("outros", "nome").unwrap().is_empty());
    }

    #[test]
    fn update_merges_and_keeps_other_fields() {
        let store = MemoryStore::new();
        let id = store.add("pacientes", named("Ana")).unwrap();

        let mut change = Fields::new();
        change.insert("nome".into(), FieldValue::Text("Bia".into()));
        store.update("pacientes", &id.to_string(), change).unwrap();

        let doc = store.get("pacientes", &id.to_string()).unwrap().unwrap();
        assert_eq!(doc.text("nome"), Some("Bia"));
        assert!(doc.timestamp("created_at").is_some());
    }

    #[test]
    fn update_of_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("pacientes", &DocumentId::new().to_string(), Fields::new())
            .expect_err("update should fail");
        assert!(matches!(err, StoreError::NotFound { .. }));

        let err = store
            .update("pacientes", "not-an-id", Fields::new())
            .expect_err("update should fail");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = store.add("pacientes", named("Ana")).unwrap();

        store.delete("pacientes", &id.to_string()).unwrap();
        store.delete("pacientes", &id.to_string()).unwrap();
        store.delete("pacientes", "garbage").unwrap();
        assert!(store.get("pacientes", &id.to_string()).unwrap().is_none());
    }

    #[test]
    fn list_is_ordered_by_field() {
        let store = MemoryStore::new();
        for name in ["Carla", "Ana", "Bruno"] {
            store.add("pacientes", named(name)).unwrap();
        }

        let names: Vec<_> = store
            .list_ordered_by("pacientes", "nome")
            .unwrap()
            .iter()
            .map(|d| d.text("nome").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Ana", "Bruno", "Carla"]);
    }
}
