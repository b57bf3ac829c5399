//! Constants used throughout the pacientes core crate.
//!
//! Field names are the keys written to the document store and, identically, the
//! names of the HTML form inputs.

/// Default collection holding patient documents.
pub const PATIENTS_COLLECTION: &str = "pacientes";

/// Default directory for the file-backed store when none is configured.
pub const DEFAULT_PATIENT_DATA_DIR: &str = "patient_data";

/// Patient name.
pub const FIELD_NAME: &str = "nome_pac";

/// Birth date, stored as a timestamp at midnight UTC.
pub const FIELD_BIRTH_DATE: &str = "data_nasc_pac";

/// Weight.
pub const FIELD_WEIGHT: &str = "peso_pac";

/// Height.
pub const FIELD_HEIGHT: &str = "alt_pac";

/// Blood type code.
pub const FIELD_BLOOD_TYPE: &str = "tipo_sang";

/// Set by the store when the record is created.
pub const FIELD_CREATED_AT: &str = "created_at";

/// Set by the store whenever the record is overwritten.
pub const FIELD_UPDATED_AT: &str = "updated_at";
