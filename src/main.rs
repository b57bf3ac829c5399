use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_web::AppState;
use pacientes_core::{
    store_backend_from_env_value, CoreConfig, PatientService, DEFAULT_PATIENT_DATA_DIR,
    PATIENTS_COLLECTION,
};

/// Main entry point for the pacientes web application
///
/// Resolves configuration from the environment once, opens the configured document
/// store and serves the HTML interface until Ctrl-C.
///
/// # Environment Variables
/// - `PACIENTES_ADDR`: bind address (default: "0.0.0.0:$PORT")
/// - `PORT`: port used when `PACIENTES_ADDR` is unset (default: "3000")
/// - `PACIENTES_STORE`: "file" or "memory" (default: "file")
/// - `PATIENT_DATA_DIR`: root of the file store (default: "patient_data")
/// - `PACIENTES_COLLECTION`: collection name (default: "pacientes")
/// - `PACIENTES_PUBLIC_DIR`: static asset directory (default: "public")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pacientes_run=info".parse()?)
                .add_directive("api_web=info".parse()?)
                .add_directive("pacientes_core=info".parse()?)
                .add_directive("pacientes_store=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PACIENTES_ADDR").unwrap_or_else(|_| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
        format!("0.0.0.0:{port}")
    });

    let backend = store_backend_from_env_value(std::env::var("PACIENTES_STORE").ok())?;
    let patient_data_dir = std::env::var("PATIENT_DATA_DIR")
        .unwrap_or_else(|_| DEFAULT_PATIENT_DATA_DIR.into());
    let collection =
        std::env::var("PACIENTES_COLLECTION").unwrap_or_else(|_| PATIENTS_COLLECTION.into());
    let public_dir = PathBuf::from(
        std::env::var("PACIENTES_PUBLIC_DIR").unwrap_or_else(|_| "public".into()),
    );

    let cfg = CoreConfig::new(PathBuf::from(patient_data_dir), collection, backend)?;
    if !public_dir.is_dir() {
        tracing::warn!(
            "public directory {} does not exist; static assets will 404",
            public_dir.display()
        );
    }

    tracing::info!(
        "++ Using {} store (collection {:?}, data dir {})",
        cfg.backend(),
        cfg.collection(),
        cfg.patient_data_dir().display()
    );

    let state = AppState::new(PatientService::from_config(&cfg));
    let app = api_web::router(state, &public_dir);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("++ Starting pacientes web on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- pacientes web stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
