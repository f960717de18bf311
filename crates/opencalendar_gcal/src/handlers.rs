// File: crates/opencalendar_gcal/src/handlers.rs
use crate::logic::{create_event, invite_recipient, CreateEventRequest, SendInviteRequest};
use crate::service::CalendarProvider;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{Json, Response},
};
use opencalendar_common::services::EventLink;
use opencalendar_common::{handle_json_result, validation_error, OpenCalendarError};
use std::sync::Arc;

// Define shared state needed by GCal handlers
#[derive(Clone)]
pub struct GcalState {
    /// The authenticated calendar client, built once at startup.
    pub calendar: Arc<dyn CalendarProvider>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, OpenCalendarError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| validation_error(rejection.body_text()))
}

async fn send_invite(
    state: &GcalState,
    event_id: &str,
    payload: Result<Json<SendInviteRequest>, JsonRejection>,
) -> Result<EventLink, OpenCalendarError> {
    let invite = json_body(payload)?.validate(event_id)?;
    invite_recipient(state.calendar.as_ref(), invite).await
}

async fn create(
    state: &GcalState,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<EventLink, OpenCalendarError> {
    let event = json_body(payload)?.validate()?;
    create_event(state.calendar.as_ref(), event).await
}

/// Handler to add a recipient to an existing event.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/send/{event}",
    params(("event" = String, Path, description = "Id of the event in the primary calendar")),
    request_body = SendInviteRequest,
    responses(
        (status = 200, description = "Recipient added", body = EventLink),
        (status = 400, description = "Invalid input or provider failure")
    ),
    tag = "GCal"
))]
pub async fn send_invite_handler(
    State(state): State<Arc<GcalState>>,
    Path(event_id): Path<String>,
    payload: Result<Json<SendInviteRequest>, JsonRejection>,
) -> Result<Json<EventLink>, Response> {
    handle_json_result(send_invite(&state, &event_id, payload).await)
}

/// `POST /send` without an event id. Always answers with the missing-fields error.
#[axum::debug_handler]
pub async fn send_invite_without_event_handler(
    State(state): State<Arc<GcalState>>,
    payload: Result<Json<SendInviteRequest>, JsonRejection>,
) -> Result<Json<EventLink>, Response> {
    handle_json_result(send_invite(&state, "", payload).await)
}

/// Handler to create a new event in the primary calendar.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/create",
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Event created", body = EventLink),
        (status = 400, description = "Invalid event or provider failure")
    ),
    tag = "GCal"
))]
pub async fn create_event_handler(
    State(state): State<Arc<GcalState>>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Json<EventLink>, Response> {
    handle_json_result(create(&state, payload).await)
}
