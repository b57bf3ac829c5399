//! Patient operations over a document store.
//!
//! Each operation is a single round-trip to the store. There is no validation and no
//! transactional grouping: concurrent edits of the same record are last-writer-wins.

use crate::config::CoreConfig;
use crate::constants::{FIELD_CREATED_AT, FIELD_NAME, FIELD_UPDATED_AT};
use crate::patient::{NewPatient, PatientForm, PatientView};
use crate::PatientResult;
use pacientes_store::{DocumentId, DocumentStore, FieldValue};
use std::sync::Arc;

/// Pure patient data operations - no HTTP concerns.
#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn DocumentStore>,
    collection: Arc<str>,
}

impl PatientService {
    /// Creates a service writing to `collection` of `store`.
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Opens the configured store and wraps it in a service.
    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.open_store(), cfg.collection())
    }

    /// Lists every patient, ordered by name ascending.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Store` if the store cannot be read.
    pub fn list_patients(&self) -> PatientResult<Vec<PatientView>> {
        let documents = self.store.list_ordered_by(&self.collection, FIELD_NAME)?;
        tracing::debug!("listed {} patients", documents.len());
        Ok(documents.iter().map(PatientView::from).collect())
    }

    /// Writes a new patient from a raw form and returns its id.
    ///
    /// Unparseable values fall back to their defaults; this never rejects input.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Store` if the write fails.
    pub fn create_patient(&self, form: &PatientForm) -> PatientResult<DocumentId> {
        let mut fields = NewPatient::from_form(form).to_fields();
        fields.insert(FIELD_CREATED_AT.into(), FieldValue::ServerTimestamp);

        let id = self.store.add(&self.collection, fields)?;
        tracing::info!("created patient {}", id);
        Ok(id)
    }

    /// Looks up one patient. Unknown ids yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Store` if the store cannot be read.
    pub fn find_patient(&self, id: &str) -> PatientResult<Option<PatientView>> {
        let document = self.store.get(&self.collection, id)?;
        Ok(document.as_ref().map(PatientView::from))
    }

    /// Overwrites all five patient fields of an existing record.
    ///
    /// Fields missing from `form` are written with their defaults, so omitting a field
    /// clears it. `created_at` is kept and `updated_at` is set.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Store` if the record does not exist or the write fails.
    pub fn update_patient(&self, id: &str, form: &PatientForm) -> PatientResult<()> {
        let mut fields = NewPatient::from_form(form).to_fields();
        fields.insert(FIELD_UPDATED_AT.into(), FieldValue::ServerTimestamp);

        self.store.update(&self.collection, id, fields)?;
        tracing::info!("updated patient {}", id);
        Ok(())
    }

    /// Deletes a patient. Deleting an unknown id succeeds.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Store` if the delete fails.
    pub fn delete_patient(&self, id: &str) -> PatientResult<()> {
        self.store.delete(&self.collection, id)?;
        tracing::info!("deleted patient {}", id);
        Ok(())
    }
}
