// File: crates/opencalendar_gcal/src/doc.rs

#![cfg(feature = "openapi")]
use opencalendar_common::services::EventLink;
use utoipa::OpenApi;

use crate::logic::{
    AttendeeRequest, CreateEventRequest, EventTimeRequest, ReminderOverrideRequest,
    RemindersRequest, ResponseStatus, SendInviteRequest,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::send_invite_handler,
        crate::handlers::create_event_handler
    ),
    components(
        schemas(
            SendInviteRequest,
            ResponseStatus,
            CreateEventRequest,
            EventTimeRequest,
            AttendeeRequest,
            RemindersRequest,
            ReminderOverrideRequest,
            EventLink
        )
    ),
    tags(
        (name = "GCal", description = "Google Calendar event proxy")
    )
)]
pub struct GcalApiDoc;
