// --- File: crates/opencalendar_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::{HttpStatusCode, OpenCalendarError};

// Include the client module
pub mod client;

/// Extension trait for OpenCalendarError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for OpenCalendarError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            error!("request failed: {}", self);
        } else {
            warn!("request rejected: {}", self);
        }

        // Body shape is `{"error": "<message>"}`
        let body = Json(json!({ "error": self.to_string() }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for OpenCalendarError to make it easier to use in Axum handlers.
impl IntoResponse for OpenCalendarError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Converts a `Result<T, OpenCalendarError>` into a JSON handler result.
pub fn handle_json_result<T>(result: Result<T, OpenCalendarError>) -> Result<Json<T>, Response>
where
    T: serde::Serialize,
{
    result.map(Json).map_err(|err| err.into_response())
}
