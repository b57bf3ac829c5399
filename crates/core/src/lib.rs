//! # Pacientes Core
//!
//! Core data operations for the pacientes patient record application.
//!
//! This crate contains:
//! - Patient form coercion and date conversion ([`patient`])
//! - The [`PatientService`] create/list/read/update/delete operations
//! - Startup configuration ([`CoreConfig`])
//!
//! **No HTTP concerns**: routing, rendering and response codes belong in `api-web`.

pub mod config;
pub mod constants;
pub mod error;
pub mod patient;
pub mod service;

pub use config::{store_backend_from_env_value, CoreConfig, StoreBackend};
pub use constants::{DEFAULT_PATIENT_DATA_DIR, PATIENTS_COLLECTION};
pub use error::{PatientError, PatientResult};
pub use pacientes_store::{DocumentId, DocumentStore};
pub use patient::{NewPatient, PatientForm, PatientView};
pub use service::PatientService;
