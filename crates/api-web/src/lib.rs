//! # API Web
//!
//! Server-rendered HTML interface for the pacientes application.
//!
//! Handles:
//! - HTTP routes with axum
//! - HTML rendering of the list, create and edit pages
//! - urlencoded and JSON request bodies
//! - static assets (including the service worker) from the public directory
//!
//! Uses `pacientes-core` for all data operations.

#![warn(rust_2018_idioms)]

pub mod form;
pub mod handlers;
pub mod views;

use axum::{
    routing::{get, post},
    Router,
};
use pacientes_core::PatientService;
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub patients: PatientService,
}

impl AppState {
    pub fn new(patients: PatientService) -> Self {
        Self { patients }
    }
}

/// Builds the application router.
///
/// Requests that match no route are served from `public_dir`; unknown files are `404`.
pub fn router(state: AppState, public_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/pacientes", get(handlers::list_patients))
        .route(
            "/criar",
            get(handlers::new_patient).post(handlers::create_patient),
        )
        .route(
            "/editar/:id",
            get(handlers::edit_patient).post(handlers::update_patient),
        )
        .route("/deletar/:id", post(handlers::delete_patient))
        .fallback_service(ServeDir::new(public_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
