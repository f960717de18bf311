// --- File: crates/opencalendar_common/src/lib.rs ---

pub mod error;     // Error handling
pub mod handlers;  // HTTP request handlers
pub mod http;      // HTTP utilities
pub mod logging;   // Logging utilities
pub mod routes;    // Route definitions
pub mod services;  // Provider-facing shared types

// Re-export the routes function to be used by the main backend service
pub use routes::routes;

// Re-export error types and utilities for easier access
pub use error::{
    internal_error, provider_error, validation_error, Context, HttpStatusCode,
    OpenCalendarError,
};

pub use http::{client::create_client, handle_json_result, IntoHttpResponse};

pub use logging::{init, init_with_level, log_error};
