//! Route handlers.
//!
//! Every handler performs at most one store operation. Store calls are synchronous, so
//! they run on tokio's blocking pool. Failures are logged and collapse to a bare text
//! response; there is no retry and no structured error body.

use crate::form::{PatientPayload, PayloadRejection};
use crate::views;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use pacientes_core::{PatientError, PatientForm, PatientResult, PatientService};
use serde::Serialize;

type HandlerResult<T> = Result<T, (StatusCode, &'static str)>;

const MSG_INTERNAL: &str = "Erro interno do servidor";
const MSG_NOT_FOUND: &str = "Paciente não encontrado";
const MSG_CREATE_FAILED: &str = "Erro ao criar paciente";
const MSG_UPDATE_FAILED: &str = "Erro ao atualizar paciente";
const MSG_DELETE_FAILED: &str = "Erro ao deletar paciente";

/// Where every successful write sends the browser.
pub const LIST_PATH: &str = "/pacientes";

#[derive(Debug, thiserror::Error)]
enum TaskError {
    #[error(transparent)]
    Patient(#[from] PatientError),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs a patient operation on the blocking pool and waits for it.
async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, TaskError>
where
    F: FnOnce(&PatientService) -> PatientResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.patients.clone();
    Ok(tokio::task::spawn_blocking(move || op(&service)).await??)
}

fn internal_error(message: &'static str) -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Unwraps a patient body, collapsing a malformed one to the route's `500` text.
fn payload_or(
    payload: Result<PatientPayload, PayloadRejection>,
    message: &'static str,
) -> HandlerResult<PatientForm> {
    payload.map(|PatientPayload(form)| form).map_err(|e| {
        tracing::error!("Patient payload error: {:?}", e);
        internal_error(message)
    })
}

/// `302 Found` back to the patient list.
fn redirect_to_list() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, LIST_PATH)]).into_response()
}

#[derive(Debug, Serialize)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Liveness probe.
pub async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "pacientes is alive".into(),
    })
}

/// `GET /`
pub async fn index() -> Html<String> {
    Html(views::index_page())
}

/// `GET /pacientes`
///
/// # Errors
/// Returns `500 Internal Server Error` if the store cannot be read.
pub async fn list_patients(State(state): State<AppState>) -> HandlerResult<Html<String>> {
    match run_blocking(&state, |svc| svc.list_patients()).await {
        Ok(patients) => Ok(Html(views::patients_page(&patients))),
        Err(e) => {
            tracing::error!("List patients error: {:?}", e);
            Err(internal_error(MSG_INTERNAL))
        }
    }
}

/// `GET /criar`
pub async fn new_patient() -> Html<String> {
    Html(views::create_page())
}

/// `POST /criar`
///
/// # Errors
/// Returns `500 Internal Server Error` if the body is malformed or the write fails.
pub async fn create_patient(
    State(state): State<AppState>,
    payload: Result<PatientPayload, PayloadRejection>,
) -> HandlerResult<Response> {
    let form = payload_or(payload, MSG_CREATE_FAILED)?;
    match run_blocking(&state, move |svc| svc.create_patient(&form)).await {
        Ok(_) => Ok(redirect_to_list()),
        Err(e) => {
            tracing::error!("Create patient error: {:?}", e);
            Err(internal_error(MSG_CREATE_FAILED))
        }
    }
}

/// `GET /editar/:id`
///
/// # Errors
/// Returns `404 Not Found` if no patient has this id, and
/// `500 Internal Server Error` if the store cannot be read.
pub async fn edit_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Html<String>> {
    match run_blocking(&state, move |svc| svc.find_patient(&id)).await {
        Ok(Some(patient)) => Ok(Html(views::edit_page(&patient))),
        Ok(None) => Err((StatusCode::NOT_FOUND, MSG_NOT_FOUND)),
        Err(e) => {
            tracing::error!("Find patient error: {:?}", e);
            Err(internal_error(MSG_INTERNAL))
        }
    }
}

/// `POST /editar/:id`
///
/// # Errors
/// Returns `500 Internal Server Error` if the patient does not exist or the write fails.
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<PatientPayload, PayloadRejection>,
) -> HandlerResult<Response> {
    let form = payload_or(payload, MSG_UPDATE_FAILED)?;
    match run_blocking(&state, move |svc| svc.update_patient(&id, &form)).await {
        Ok(()) => Ok(redirect_to_list()),
        Err(e) => {
            tracing::error!("Update patient error: {:?}", e);
            Err(internal_error(MSG_UPDATE_FAILED))
        }
    }
}

/// `POST /deletar/:id`
///
/// # Errors
/// Returns `500 Internal Server Error` if the delete fails.
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Response> {
    match run_blocking(&state, move |svc| svc.delete_patient(&id)).await {
        Ok(()) => Ok(redirect_to_list()),
        Err(e) => {
            tracing::error!("Delete patient error: {:?}", e);
            Err(internal_error(MSG_DELETE_FAILED))
        }
    }
}
