// --- File: crates/opencalendar_common/src/services.rs ---
//! Shared types for calendar provider integrations.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Calendar id used for every event operation.
pub const PRIMARY_CALENDAR: &str = "primary";

/// What the proxy reports back after a provider write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EventLink {
    /// The provider's event id.
    pub id: Option<String>,
    /// Link to the event in the provider's web UI.
    #[serde(rename = "htmlLink")]
    pub html_link: Option<String>,
    /// The resource URL the provider request was sent to.
    #[serde(rename = "responseURL")]
    pub response_url: Option<String>,
}
