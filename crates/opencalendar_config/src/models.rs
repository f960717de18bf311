// --- File: crates/opencalendar_config/src/models.rs ---

use config::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_APP_PORT: u16 = 3001;
pub const DEFAULT_APP_HOST: &str = "0.0.0.0";
pub const DEFAULT_SCOPES: &str = "calendar.events";
pub const DEFAULT_TOKEN_PATH: &str = "token.json";
pub const DEFAULT_HOMEPAGE_URL: &str = "https://github.com/hrz8/opencalendar#readme";
/// Out-of-band redirect: Google shows the code on a page for the operator to copy.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_app_port() -> u16 {
    DEFAULT_APP_PORT
}

fn default_app_host() -> String {
    DEFAULT_APP_HOST.to_string()
}

fn default_scopes() -> String {
    DEFAULT_SCOPES.to_string()
}

fn default_token_path() -> String {
    DEFAULT_TOKEN_PATH.to_string()
}

fn default_homepage_url() -> String {
    DEFAULT_HOMEPAGE_URL.to_string()
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// --- Raw environment view ---
// One field per recognised variable, lowercased the way the `config`
// Environment source reports keys.
#[derive(Debug, Deserialize, Clone)]
pub struct EnvConfig {
    #[serde(default = "default_app_port")]
    pub app_port: u16,
    /// Hosting platforms inject PORT; it wins over APP_PORT when present.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_app_host")]
    pub app_host: String,
    #[serde(default)]
    pub use_whitelist: bool,
    #[serde(default)]
    pub whitelist_origin: Option<String>,
    #[serde(default)]
    pub google_service_account: Option<String>,
    #[serde(default = "default_scopes")]
    pub google_service_scopes: String,
    #[serde(default)]
    pub google_service_redirect_uri: Option<String>,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    #[serde(default = "default_homepage_url")]
    pub homepage_url: String,
    #[serde(default)]
    pub provider_timeout_secs: Option<u64>,
}

// --- General Server Config ---
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Cross-origin Config ---
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub use_whitelist: bool,
    pub whitelist_origins: Vec<String>,
}

impl CorsConfig {
    /// Whether a request carrying `origin` may read the response.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        !self.use_whitelist || self.whitelist_origins.iter().any(|o| o == origin)
    }
}

// --- Google OAuth client secret ---
// Mirrors the `installed` / `web` section of the JSON downloaded from the
// Google Cloud console.
#[derive(Deserialize, Clone)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecret")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .field("redirect_uris", &self.redirect_uris)
            .finish()
    }
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Parses the client-secret JSON, accepting either an `installed` or a
    /// `web` application section.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let file: ClientSecretFile = serde_json::from_str(raw).map_err(|err| {
            ConfigError::Message(format!("GOOGLE_SERVICE_ACCOUNT is not valid JSON: {err}"))
        })?;
        file.installed.or(file.web).ok_or_else(|| {
            ConfigError::Message(
                "GOOGLE_SERVICE_ACCOUNT must contain an `installed` or `web` section".to_string(),
            )
        })
    }
}

// --- Google Calendar Config ---
#[derive(Debug, Clone)]
pub struct GcalConfig {
    pub client_secret: ClientSecret,
    /// Scope short names (e.g. `calendar.events`) or full scope URLs.
    pub scopes: Vec<String>,
    pub redirect_uri: String,
    pub token_path: PathBuf,
    pub provider_timeout: Option<Duration>,
}

// --- Unified App Configuration ---
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub gcal: GcalConfig,
    pub homepage_url: String,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl TryFrom<EnvConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(env: EnvConfig) -> Result<Self, Self::Error> {
        let whitelist_origins = env
            .whitelist_origin
            .as_deref()
            .map(split_list)
            .unwrap_or_default();
        if env.use_whitelist && whitelist_origins.is_empty() {
            return Err(ConfigError::Message(
                "WHITELIST_ORIGIN is required when USE_WHITELIST is enabled".to_string(),
            ));
        }

        let raw_secret = env
            .google_service_account
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::NotFound("GOOGLE_SERVICE_ACCOUNT".to_string()))?;
        let client_secret = ClientSecret::from_json(raw_secret)?;

        let scopes = split_list(&env.google_service_scopes);
        if scopes.is_empty() {
            return Err(ConfigError::Message(
                "GOOGLE_SERVICE_SCOPES must name at least one scope".to_string(),
            ));
        }

        let redirect_uri = env
            .google_service_redirect_uri
            .filter(|s| !s.trim().is_empty())
            .or_else(|| client_secret.redirect_uris.first().cloned())
            .unwrap_or_else(|| OOB_REDIRECT_URI.to_string());

        Ok(AppConfig {
            server: ServerConfig {
                host: env.app_host,
                port: env.port.unwrap_or(env.app_port),
            },
            cors: CorsConfig {
                use_whitelist: env.use_whitelist,
                whitelist_origins,
            },
            gcal: GcalConfig {
                client_secret,
                scopes,
                redirect_uri,
                token_path: PathBuf::from(env.token_path),
                provider_timeout: env
                    .provider_timeout_secs
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            },
            homepage_url: env.homepage_url,
        })
    }
}
