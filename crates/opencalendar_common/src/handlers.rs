// --- File: crates/opencalendar_common/src/handlers.rs ---
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use opencalendar_config::AppConfig;
use std::sync::Arc;

/// `GET /`: 302 to the project homepage.
pub async fn homepage_redirect_handler(State(config): State<Arc<AppConfig>>) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, config.homepage_url.clone())],
    )
        .into_response()
}
