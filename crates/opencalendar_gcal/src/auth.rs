// File: crates/opencalendar_gcal/src/auth.rs
use crate::credentials::StoredCredential;
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{authorized_user::AuthorizedUserSecret, AuthorizedUserAuthenticator},
    CalendarHub,
};
use opencalendar_config::ClientSecret;
use serde_json::json;
use std::error::Error;
use tracing::{info, warn};

// Type aliases for clarity
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

/// Builds the refresh-capable secret yup-oauth2 expects for an
/// "authorized user" credential.
pub fn authorized_user_secret(
    secret: &ClientSecret,
    refresh_token: &str,
) -> Result<AuthorizedUserSecret, serde_json::Error> {
    serde_json::from_value(json!({
        "type": "authorized_user",
        "client_id": secret.client_id,
        "client_secret": secret.client_secret,
        "refresh_token": refresh_token,
    }))
}

/// Creates the Calendar client from the resolved credential.
///
/// With a refresh token the hub gets an authenticator that renews the access
/// token on its own. Without one the stored access token is used as is and
/// calls start failing once it expires.
pub async fn create_calendar_hub(
    secret: &ClientSecret,
    credential: &StoredCredential,
) -> Result<HubType, Box<dyn Error + Send + Sync>> {
    let https = HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build();

    // Create client without specifying body type
    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    let hub = match credential.refresh_token.as_deref() {
        Some(refresh_token) => {
            let user_secret = authorized_user_secret(secret, refresh_token)?;
            let auth = AuthorizedUserAuthenticator::builder(user_secret)
                .build()
                .await?;
            info!("calendar client: using refreshable credentials");
            CalendarHub::new(client, auth)
        }
        None => {
            warn!("calendar client: no refresh token stored; access token will not be renewed");
            CalendarHub::new(client, credential.access_token.clone())
        }
    };

    Ok(hub)
}
