// --- File: crates/opencalendar_gcal/src/routes.rs ---

use crate::handlers::{
    create_event_handler, send_invite_handler, send_invite_without_event_handler, GcalState,
};
use axum::{routing::post, Router};
use std::sync::Arc;

/// Creates a router containing all routes for the Google Calendar feature.
///
/// The state already holds a ready calendar client, so every route can serve
/// as soon as the router exists.
pub fn routes(state: Arc<GcalState>) -> Router {
    Router::new()
        .route("/send", post(send_invite_without_event_handler))
        .route("/send/{event}", post(send_invite_handler))
        .route("/create", post(create_event_handler))
        .with_state(state)
}
