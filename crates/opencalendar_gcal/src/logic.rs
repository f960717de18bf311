// --- File: crates/opencalendar_gcal/src/logic.rs ---
use chrono::{DateTime, NaiveDate, Utc};
use google_calendar3::api::{Event, EventAttendee, EventDateTime, EventReminder, EventReminders};
use once_cell::sync::Lazy;
use opencalendar_common::services::{EventLink, PRIMARY_CALENDAR};
use opencalendar_common::{validation_error, OpenCalendarError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::service::CalendarProvider;

pub const MISSING_INVITE_FIELDS: &str = "event and recipient is required";

const REMINDER_METHODS: [&str; 2] = ["email", "popup"];
/// Google refuses reminder overrides beyond four weeks.
const MAX_REMINDER_MINUTES: i32 = 40_320;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

// --- Attendee response status ---

/// An attendee's answer to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    #[default]
    NeedsAction,
    Declined,
    Tentative,
    Accepted,
}

impl ResponseStatus {
    pub const ALL: [ResponseStatus; 4] = [
        ResponseStatus::NeedsAction,
        ResponseStatus::Declined,
        ResponseStatus::Tentative,
        ResponseStatus::Accepted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::NeedsAction => "needsAction",
            ResponseStatus::Declined => "declined",
            ResponseStatus::Tentative => "tentative",
            ResponseStatus::Accepted => "accepted",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders `["a","b",...]`, the way the allowed values appear in error messages.
fn quoted_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = values.into_iter().map(|v| format!("\"{}\"", v)).collect();
    format!("[{}]", quoted.join(","))
}

/// Error message for a response status outside the four literals.
pub fn invalid_response_message(field: &str) -> String {
    format!(
        "{} should be one of {}",
        field,
        quoted_list(ResponseStatus::ALL.iter().map(|s| s.as_str()))
    )
}

impl FromStr for ResponseStatus {
    type Err = OpenCalendarError;

    /// Case-sensitive: only the exact literals are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResponseStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| validation_error(invalid_response_message("response")))
    }
}

// --- Invite recipient ---

/// Body of `POST /send/{event}`.
#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SendInviteRequest {
    /// Email address of the person to invite.
    #[serde(default)]
    pub recipient: Option<String>,
    /// One of needsAction, declined, tentative, accepted. Defaults to needsAction.
    #[serde(default)]
    pub response: Option<String>,
}

/// A validated invitation, ready to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRecipient {
    pub event_id: String,
    pub recipient: String,
    pub response: ResponseStatus,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl SendInviteRequest {
    /// Checks the request before anything is sent to the provider.
    ///
    /// Missing fields are reported before an invalid response status.
    /// Event id and recipient are forwarded trimmed.
    pub fn validate(&self, event_id: &str) -> Result<InviteRecipient, OpenCalendarError> {
        let (event_id, recipient) =
            match (non_blank(Some(event_id)), non_blank(self.recipient.as_deref())) {
                (Some(event_id), Some(recipient)) => (event_id, recipient),
                _ => return Err(validation_error(MISSING_INVITE_FIELDS)),
            };

        let response = match self.response.as_deref() {
            None => ResponseStatus::default(),
            Some(raw) => raw.parse()?,
        };

        Ok(InviteRecipient {
            event_id: event_id.trim().to_string(),
            recipient: recipient.trim().to_string(),
            response,
        })
    }
}

/// Adds the recipient to the end of the event's attendee list.
///
/// Existing attendees are left untouched, including one with the same email.
pub fn append_attendee(event: &mut Event, recipient: &str, response: ResponseStatus) {
    event
        .attendees
        .get_or_insert_with(Vec::new)
        .push(EventAttendee {
            email: Some(recipient.to_string()),
            response_status: Some(response.as_str().to_string()),
            ..Default::default()
        });
}

/// Fetches the event, appends the recipient and patches the event back.
pub async fn invite_recipient(
    provider: &dyn CalendarProvider,
    invite: InviteRecipient,
) -> Result<EventLink, OpenCalendarError> {
    let mut event = provider
        .get_event(PRIMARY_CALENDAR, &invite.event_id)
        .await?;

    append_attendee(&mut event, &invite.recipient, invite.response);

    let link = provider
        .patch_event(PRIMARY_CALENDAR, &invite.event_id, event)
        .await?;
    info!(
        "Invited {} to event {} ({})",
        invite.recipient, invite.event_id, invite.response
    );
    Ok(link)
}

// --- Create event ---

/// Start or end of an event. Timed events use `dateTime`, all-day events `date`.
#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventTimeRequest {
    /// RFC 3339 timestamp, e.g. 2015-05-28T09:00:00-07:00
    pub date_time: Option<String>,
    /// Calendar date, e.g. 2015-05-28
    pub date: Option<String>,
    /// IANA time zone name, e.g. America/Los_Angeles
    pub time_zone: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttendeeRequest {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub optional: Option<bool>,
    pub response_status: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(deny_unknown_fields)]
pub struct ReminderOverrideRequest {
    /// `email` or `popup`
    pub method: Option<String>,
    pub minutes: Option<i32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemindersRequest {
    pub use_default: Option<bool>,
    pub overrides: Option<Vec<ReminderOverrideRequest>>,
}

/// Body of `POST /create`.
///
/// Fields the proxy does not forward, such as `recurrence`, are refused
/// instead of being dropped.
#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(deny_unknown_fields)]
pub struct CreateEventRequest {
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start: Option<EventTimeRequest>,
    pub end: Option<EventTimeRequest>,
    pub attendees: Option<Vec<AttendeeRequest>>,
    pub reminders: Option<RemindersRequest>,
}

fn required_text(field: &str, value: &Option<String>, errors: &mut Vec<String>) -> Option<String> {
    match non_blank(value.as_deref()) {
        Some(text) => Some(text.to_string()),
        None => {
            errors.push(format!("{} is required", field));
            None
        }
    }
}

fn event_time(
    field: &str,
    value: &Option<EventTimeRequest>,
    errors: &mut Vec<String>,
) -> Option<EventDateTime> {
    let Some(time) = value else {
        errors.push(format!("{} is required", field));
        return None;
    };

    let date_time = match time.date_time.as_deref() {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(_) => {
                errors.push(format!("{}.dateTime must be an RFC 3339 timestamp", field));
                return None;
            }
        },
        None => None,
    };

    let date = match time.date.as_deref() {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.push(format!("{}.date must be formatted as YYYY-MM-DD", field));
                return None;
            }
        },
        None => None,
    };

    if date_time.is_none() && date.is_none() {
        errors.push(format!("{}.dateTime is required", field));
        return None;
    }

    Some(EventDateTime {
        date_time,
        date,
        time_zone: time.time_zone.clone(),
    })
}

fn attendee(index: usize, request: &AttendeeRequest, errors: &mut Vec<String>) -> EventAttendee {
    let email = non_blank(request.email.as_deref()).map(str::trim);
    match email {
        Some(email) if EMAIL_SHAPE.is_match(email) => {}
        Some(_) => errors.push(format!("attendees[{}].email must be a valid email address", index)),
        None => errors.push(format!("attendees[{}].email is required", index)),
    }

    if let Some(status) = request.response_status.as_deref() {
        if status.parse::<ResponseStatus>().is_err() {
            errors.push(invalid_response_message(&format!(
                "attendees[{}].responseStatus",
                index
            )));
        }
    }

    EventAttendee {
        email: email.map(str::to_string),
        display_name: request.display_name.clone(),
        optional: request.optional,
        response_status: request.response_status.clone(),
        ..Default::default()
    }
}

fn reminders(request: &RemindersRequest, errors: &mut Vec<String>) -> EventReminders {
    let overrides = request.overrides.as_ref().map(|overrides| {
        overrides
            .iter()
            .enumerate()
            .map(|(index, reminder)| {
                match reminder.method.as_deref() {
                    Some(method) if REMINDER_METHODS.contains(&method) => {}
                    _ => errors.push(format!(
                        "reminders.overrides[{}].method should be one of {}",
                        index,
                        quoted_list(REMINDER_METHODS)
                    )),
                }
                match reminder.minutes {
                    Some(minutes) if (0..=MAX_REMINDER_MINUTES).contains(&minutes) => {}
                    _ => errors.push(format!(
                        "reminders.overrides[{}].minutes must be between 0 and {}",
                        index, MAX_REMINDER_MINUTES
                    )),
                }
                EventReminder {
                    method: reminder.method.clone(),
                    minutes: reminder.minutes,
                }
            })
            .collect()
    });

    EventReminders {
        use_default: request.use_default,
        overrides,
    }
}

impl CreateEventRequest {
    /// Validates the whole payload and converts it into the provider's event.
    ///
    /// Every problem is collected; the error message joins them with `; `.
    pub fn validate(&self) -> Result<Event, OpenCalendarError> {
        let mut errors = Vec::new();

        let summary = required_text("summary", &self.summary, &mut errors);
        let location = required_text("location", &self.location, &mut errors);
        let description = required_text("description", &self.description, &mut errors);
        let start = event_time("start", &self.start, &mut errors);
        let end = event_time("end", &self.end, &mut errors);

        if let (Some(start), Some(end)) = (&start, &end) {
            let reversed = match (start.date_time, end.date_time, start.date, end.date) {
                (Some(start_at), Some(end_at), _, _) => Some(end_at < start_at),
                (None, None, Some(start_on), Some(end_on)) => Some(end_on < start_on),
                _ => None,
            };
            match reversed {
                Some(true) => errors.push("end must not be before start".to_string()),
                Some(false) => {}
                None => errors
                    .push("start and end must both use dateTime or both use date".to_string()),
            }
        }

        let attendees = self.attendees.as_ref().map(|attendees| {
            attendees
                .iter()
                .enumerate()
                .map(|(index, request)| attendee(index, request, &mut errors))
                .collect::<Vec<_>>()
        });
        let reminders = self
            .reminders
            .as_ref()
            .map(|request| reminders(request, &mut errors));

        if !errors.is_empty() {
            return Err(validation_error(errors.join("; ")));
        }

        Ok(Event {
            summary,
            location,
            description,
            start,
            end,
            attendees,
            reminders,
            ..Default::default()
        })
    }
}

/// Inserts a validated event into the primary calendar.
pub async fn create_event(
    provider: &dyn CalendarProvider,
    event: Event,
) -> Result<EventLink, OpenCalendarError> {
    let summary = event.summary.clone().unwrap_or_default();
    let link = provider.insert_event(PRIMARY_CALENDAR, event).await?;
    info!("Created event '{}' with id {:?}", summary, link.id);
    Ok(link)
}
