use pacientes_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("document store error: {0}")]
    Store(#[from] StoreError),
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
