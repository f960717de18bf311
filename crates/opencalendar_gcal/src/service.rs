// --- File: crates/opencalendar_gcal/src/service.rs ---
//! Google Calendar service implementation.
//!
//! [`CalendarProvider`] is the seam between the request logic and Google.
//! [`GoogleCalendarService`] talks to the real API through a [`HubType`];
//! tests swap in the recording double from [`mock`].

use google_calendar3::api::Event;
use opencalendar_common::services::{BoxFuture, EventLink};
use opencalendar_common::{provider_error, OpenCalendarError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::HubType;

/// Base of every Calendar v3 resource URL.
pub const CALENDAR_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3/";

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalServiceError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("{0}")]
    Rejected(String),
    #[error("calendar provider did not answer within {0:?}")]
    Timeout(Duration),
}

impl GcalServiceError {
    /// The message Google put in the error body, when there is one.
    ///
    /// Calendar errors look like `{"error": {"code": 404, "message": "Not Found"}}`;
    /// everything else falls back to the error's display text.
    pub fn provider_message(&self) -> String {
        match self {
            GcalServiceError::ApiError(google_calendar3::Error::BadRequest(body)) => body
                .pointer("/error/message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string()),
            GcalServiceError::ApiError(err) => err.to_string(),
            GcalServiceError::Rejected(message) => message.clone(),
            GcalServiceError::Timeout(_) => self.to_string(),
        }
    }
}

impl From<GcalServiceError> for OpenCalendarError {
    fn from(err: GcalServiceError) -> Self {
        match err {
            GcalServiceError::Timeout(_) => OpenCalendarError::TimeoutError(err.to_string()),
            other => provider_error(other.provider_message()),
        }
    }
}

/// Builds the REST URL of an events collection, or of one event in it.
pub fn event_resource_url(calendar_id: &str, event_id: Option<&str>) -> String {
    let mut url = format!("{}calendars/{}/events", CALENDAR_API_BASE_URL, calendar_id);
    if let Some(event_id) = event_id {
        url.push('/');
        url.push_str(event_id);
    }
    url
}

/// Event operations the proxy forwards to the calendar provider.
pub trait CalendarProvider: Send + Sync {
    /// Fetches a single event.
    fn get_event(&self, calendar_id: &str, event_id: &str)
        -> BoxFuture<'_, Event, GcalServiceError>;

    /// Partially updates an event with the fields set on `patch`.
    fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: Event,
    ) -> BoxFuture<'_, EventLink, GcalServiceError>;

    /// Creates a new event.
    fn insert_event(&self, calendar_id: &str, event: Event)
        -> BoxFuture<'_, EventLink, GcalServiceError>;
}

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    calendar_hub: Arc<HubType>,
    timeout: Option<Duration>,
}

impl GoogleCalendarService {
    /// Create a new Google Calendar service.
    ///
    /// `timeout` bounds every provider call; `None` waits indefinitely.
    pub fn new(calendar_hub: Arc<HubType>, timeout: Option<Duration>) -> Self {
        Self {
            calendar_hub,
            timeout,
        }
    }
}

async fn bounded<T, F>(timeout: Option<Duration>, call: F) -> Result<T, GcalServiceError>
where
    F: Future<Output = Result<T, google_calendar3::Error>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| GcalServiceError::Timeout(limit))?
            .map_err(GcalServiceError::from),
        None => call.await.map_err(GcalServiceError::from),
    }
}

fn event_link(event: &Event, response_url: String) -> EventLink {
    EventLink {
        id: event.id.clone(),
        html_link: event.html_link.clone(),
        response_url: Some(response_url),
    }
}

impl CalendarProvider for GoogleCalendarService {
    fn get_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> BoxFuture<'_, Event, GcalServiceError> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let calendar_hub = self.calendar_hub.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            debug!("Fetching event {} from calendar {}", event_id, calendar_id);
            let (_response, event) = bounded(
                timeout,
                calendar_hub.events().get(&calendar_id, &event_id).doit(),
            )
            .await?;
            Ok(event)
        })
    }

    fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: Event,
    ) -> BoxFuture<'_, EventLink, GcalServiceError> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let calendar_hub = self.calendar_hub.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let (_response, updated) = bounded(
                timeout,
                calendar_hub
                    .events()
                    .patch(patch, &calendar_id, &event_id)
                    .doit(),
            )
            .await?;
            info!("Patched event {} in calendar {}", event_id, calendar_id);
            Ok(event_link(
                &updated,
                event_resource_url(&calendar_id, Some(&event_id)),
            ))
        })
    }

    fn insert_event(
        &self,
        calendar_id: &str,
        event: Event,
    ) -> BoxFuture<'_, EventLink, GcalServiceError> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let (_response, created) = bounded(
                timeout,
                calendar_hub.events().insert(event, &calendar_id).doit(),
            )
            .await?;
            info!(
                "Created event {:?} in calendar {}",
                created.id, calendar_id
            );
            Ok(event_link(&created, event_resource_url(&calendar_id, None)))
        })
    }
}
