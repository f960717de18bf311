// File: services/opencalendar_backend/src/main.rs
use opencalendar_backend::build_app;
use opencalendar_common::{log_error, Context, OpenCalendarError};
use opencalendar_config::load_config;
use opencalendar_gcal::auth::create_calendar_hub;
use opencalendar_gcal::credentials::{CredentialStore, StdinCodeProvider};
use opencalendar_gcal::service::GoogleCalendarService;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    opencalendar_common::logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_error(&err, "opencalendar stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), OpenCalendarError> {
    let config = Arc::new(load_config()?);

    // No request is served before a credential exists.
    let store = CredentialStore::new(&config.gcal)?;
    let credential = store.resolve(&StdinCodeProvider).await?;

    let hub = create_calendar_hub(&config.gcal.client_secret, &credential)
        .await
        .map_err(|err| OpenCalendarError::AuthError(err.to_string()))?;
    let calendar = Arc::new(GoogleCalendarService::new(
        Arc::new(hub),
        config.gcal.provider_timeout,
    ));

    let app = build_app(config.clone(), calendar);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Starting server at http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log_error(&err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
