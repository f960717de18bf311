// --- File: crates/opencalendar_gcal/src/credentials.rs ---
//! OAuth2 credential store.
//!
//! Resolves the token pair used to call Google Calendar. A persisted token
//! file is the fast path; without one, the installed-application
//! authorization-code flow is driven through a [`CodeProvider`] and the
//! resulting token is written back to disk.
//!
//! ```text
//! TokenFound ─────────────────────────────▶ TokenObtained
//! NoToken ──▶ AwaitingUserCode ──┬────────▶ TokenObtained
//!                                └────────▶ Failed
//! ```
//!
//! No expiry check happens at load time. Refreshing is left to the calendar
//! client (see [`crate::auth::create_calendar_hub`]).

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use opencalendar_common::http::client::DEFAULT_TIMEOUT_SECS;
use opencalendar_common::{create_client, log_error, OpenCalendarError};
use opencalendar_config::{ClientSecret, GcalConfig};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const SCOPE_URL_PREFIX: &str = "https://www.googleapis.com/auth/";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("failed to read token file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse token file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write token file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid authorization endpoint {0}")]
    AuthUri(String),
    #[error("failed to read authorization code: {0}")]
    CodeInput(String),
    #[error("no authorization code was entered")]
    EmptyCode,
    #[error("Error retrieving access token: {0}")]
    Exchange(String),
    #[error("token endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<CredentialError> for OpenCalendarError {
    fn from(err: CredentialError) -> Self {
        OpenCalendarError::AuthError(err.to_string())
    }
}

/// Where the credential store currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    NoToken,
    TokenFound,
    AwaitingUserCode,
    TokenObtained,
    Failed,
}

impl fmt::Display for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialState::NoToken => "NoToken",
            CredentialState::TokenFound => "TokenFound",
            CredentialState::AwaitingUserCode => "AwaitingUserCode",
            CredentialState::TokenObtained => "TokenObtained",
            CredentialState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

fn transition(from: CredentialState, to: CredentialState) {
    info!("credentials: {} -> {}", from, to);
}

/// The persisted OAuth2 token pair.
///
/// Field names follow the token file layout Google client libraries write,
/// so an existing `token.json` keeps working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Expiry as epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl StoredCredential {
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Informational only; nothing refuses an expired credential.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry().is_some_and(|expiry| expiry <= now)
    }
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    scope: Option<String>,
    token_type: Option<String>,
    id_token: Option<String>,
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_credential(self, now: DateTime<Utc>) -> StoredCredential {
        StoredCredential {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            scope: self.scope,
            token_type: self.token_type,
            id_token: self.id_token,
            // An expiry chrono cannot represent is dropped rather than trusted.
            expiry_date: self
                .expires_in
                .and_then(Duration::try_seconds)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .map(|expiry| expiry.timestamp_millis()),
        }
    }
}

#[derive(Deserialize, Debug)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Expands scope short names (`calendar.events`) into Google scope URLs.
/// Values that are already URLs are kept as they are.
pub fn scope_urls(scopes: &[String]) -> Vec<String> {
    scopes
        .iter()
        .map(|scope| {
            if scope.starts_with("https://") {
                scope.clone()
            } else {
                format!("{}{}", SCOPE_URL_PREFIX, scope)
            }
        })
        .collect()
}

/// Supplies the authorization code for the out-of-band consent step.
#[async_trait]
pub trait CodeProvider: Send + Sync {
    /// Shows `auth_url` to whoever can grant access and waits for the code
    /// they copy back.
    async fn obtain_code(&self, auth_url: &str) -> Result<String, CredentialError>;
}

/// Prints the authorization URL and reads one line from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinCodeProvider;

#[async_trait]
impl CodeProvider for StdinCodeProvider {
    async fn obtain_code(&self, auth_url: &str) -> Result<String, CredentialError> {
        println!("Authorize this app by visiting this url: {}", auth_url);
        println!("Enter the code from that page here: ");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|err| CredentialError::CodeInput(err.to_string()))?;
        Ok(line)
    }
}

/// File-backed store for the single [`StoredCredential`].
pub struct CredentialStore {
    path: PathBuf,
    client_secret: ClientSecret,
    scopes: Vec<String>,
    redirect_uri: String,
    http: reqwest::Client,
}

impl CredentialStore {
    pub fn new(config: &GcalConfig) -> Result<Self, CredentialError> {
        Ok(Self {
            path: config.token_path.clone(),
            client_secret: config.client_secret.clone(),
            scopes: scope_urls(&config.scopes),
            redirect_uri: config.redirect_uri.clone(),
            http: create_client(DEFAULT_TIMEOUT_SECS, true)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The consent page URL the operator has to visit.
    pub fn authorization_url(&self) -> Result<Url, CredentialError> {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.client_secret.auth_uri,
            &[
                ("access_type", "offline"),
                ("response_type", "code"),
                ("client_id", self.client_secret.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|err| CredentialError::AuthUri(format!("{}: {}", self.client_secret.auth_uri, err)))
    }

    /// Reads the persisted credential. `Ok(None)` when no file exists.
    pub async fn load(&self) -> Result<Option<StoredCredential>, CredentialError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CredentialError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CredentialError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Overwrites the token file with `credential`.
    ///
    /// Writes a sibling temp file and renames it over the target so a crash
    /// never leaves a half-written token behind.
    pub async fn save(&self, credential: &StoredCredential) -> Result<(), CredentialError> {
        let write_err = |source| CredentialError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let content = serde_json::to_string(credential)
            .map_err(|err| write_err(io::Error::new(io::ErrorKind::InvalidData, err)))?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            if let Err(err) = tokio::fs::set_permissions(&self.path, perms).await {
                warn!("could not restrict permissions on {:?}: {}", self.path, err);
            }
        }

        info!("Token stored to {:?}", self.path);
        Ok(())
    }

    /// Trades an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<StoredCredential, CredentialError> {
        let params = [
            ("code", code),
            ("client_id", self.client_secret.client_id.as_str()),
            ("client_secret", self.client_secret.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.client_secret.token_uri)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(TokenErrorResponse {
                    error,
                    error_description: Some(description),
                }) => format!("{}: {}", error, description),
                Ok(TokenErrorResponse { error, .. }) => error,
                Err(_) => format!("{} {}", status, body),
            };
            return Err(CredentialError::Exchange(message));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| CredentialError::Exchange(format!("unreadable token response: {}", err)))?;
        Ok(token.into_credential(Utc::now()))
    }

    /// Runs the interactive authorization-code flow.
    ///
    /// On success the credential is persisted and returned. On failure
    /// nothing is written.
    pub async fn acquire(
        &self,
        code_provider: &dyn CodeProvider,
    ) -> Result<StoredCredential, CredentialError> {
        let auth_url = self.authorization_url()?;
        transition(CredentialState::NoToken, CredentialState::AwaitingUserCode);

        let outcome = match code_provider.obtain_code(auth_url.as_str()).await {
            Ok(code) => {
                let code = code.trim();
                if code.is_empty() {
                    Err(CredentialError::EmptyCode)
                } else {
                    self.exchange_code(code).await
                }
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(credential) => {
                // A failed write only costs a new prompt on the next start.
                if let Err(err) = self.save(&credential).await {
                    log_error(&err, "credentials: token obtained but not persisted");
                }
                transition(CredentialState::AwaitingUserCode, CredentialState::TokenObtained);
                Ok(credential)
            }
            Err(err) => {
                transition(CredentialState::AwaitingUserCode, CredentialState::Failed);
                Err(err)
            }
        }
    }

    /// Loads the persisted credential, or acquires a new one when the file is
    /// missing or unreadable as a token.
    pub async fn resolve(
        &self,
        code_provider: &dyn CodeProvider,
    ) -> Result<StoredCredential, CredentialError> {
        match self.load().await {
            Ok(Some(credential)) => {
                transition(CredentialState::TokenFound, CredentialState::TokenObtained);
                if credential.is_expired_at(Utc::now()) {
                    info!("credentials: stored access token has expired; relying on refresh");
                }
                Ok(credential)
            }
            Ok(None) => {
                info!("credentials: no token file at {:?}", self.path);
                self.acquire(code_provider).await
            }
            Err(err @ CredentialError::Parse { .. }) => {
                warn!("credentials: {}; requesting a new token", err);
                self.acquire(code_provider).await
            }
            Err(err) => Err(err),
        }
    }
}
