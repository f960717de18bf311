// --- File: crates/opencalendar_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all OpenCalendar errors.
///
/// Crate-local errors (credential store, calendar service) convert into this
/// type via `From`, which fixes how they are rendered over HTTP.
#[derive(Error, Debug)]
pub enum OpenCalendarError {
    /// The request body or path did not have the required shape.
    /// The message is returned to the caller as-is.
    #[error("{0}")]
    ValidationError(String),

    /// The calendar provider rejected or failed the call.
    /// The message is the provider's own, surfaced verbatim.
    #[error("{0}")]
    ProviderError(String),

    /// A provider call exceeded the configured bound
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred while obtaining or loading OAuth credentials
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for OpenCalendarError {
    fn status_code(&self) -> u16 {
        match self {
            // Every request-level failure funnels to 400.
            OpenCalendarError::ValidationError(_) => 400,
            OpenCalendarError::ProviderError(_) => 400,
            OpenCalendarError::TimeoutError(_) => 400,
            OpenCalendarError::ConfigError(_) => 500,
            OpenCalendarError::AuthError(_) => 500,
            OpenCalendarError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, OpenCalendarError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, OpenCalendarError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, OpenCalendarError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| OpenCalendarError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, OpenCalendarError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| OpenCalendarError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<opencalendar_config::ConfigError> for OpenCalendarError {
    fn from(err: opencalendar_config::ConfigError) -> Self {
        OpenCalendarError::ConfigError(err.to_string())
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> OpenCalendarError {
    OpenCalendarError::ValidationError(message.to_string())
}

pub fn provider_error<T: fmt::Display>(message: T) -> OpenCalendarError {
    OpenCalendarError::ProviderError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> OpenCalendarError {
    OpenCalendarError::InternalError(message.to_string())
}
