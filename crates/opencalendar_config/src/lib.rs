use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use once_cell::sync::OnceCell;
use std::env;
use tracing::debug;

pub mod models;
pub use config::ConfigError;
pub use models::*;

/// Loads the application configuration from the process environment.
///
/// A `.env` file is read first (see [`ensure_dotenv_loaded`]); variables
/// already present in the environment take precedence over it.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let dotenv_path = ensure_dotenv_loaded();
    debug!("configuration: dotenv path {}", dotenv_path);

    let builder = Config::builder().add_source(
        Environment::default()
            .try_parsing(true)
            .ignore_empty(true),
    );
    load_from_builder(builder)
}

/// Builds an [`AppConfig`] from an arbitrary `config` builder.
///
/// Keys are the lowercased variable names (`app_port`, `use_whitelist`, ...).
pub fn load_from_builder(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    let raw: EnvConfig = builder.build()?.try_deserialize()?;
    AppConfig::try_from(raw)
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The path is taken from `DOTENV_OVERRIDE`, then from a first command line
/// argument starting with `.env`, and defaults to `.env`. A missing file is
/// not an error. Returns the path that was tried.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_JSON: &str = r#"{"installed":{"client_id":"cid.apps.googleusercontent.com","client_secret":"shh","redirect_uris":["http://localhost"]}}"#;

    fn base() -> ConfigBuilder<DefaultState> {
        Config::builder()
            .set_override("google_service_account", SECRET_JSON)
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = load_from_builder(base()).unwrap();
        assert_eq!(config.server.port, DEFAULT_APP_PORT);
        assert_eq!(config.server.host, DEFAULT_APP_HOST);
        assert!(!config.cors.use_whitelist);
        assert_eq!(config.gcal.scopes, vec!["calendar.events".to_string()]);
        assert_eq!(config.gcal.token_path.to_str(), Some(DEFAULT_TOKEN_PATH));
        assert_eq!(config.gcal.redirect_uri, "http://localhost");
        assert!(config.gcal.provider_timeout.is_none());
        assert_eq!(config.homepage_url, DEFAULT_HOMEPAGE_URL);
    }

    #[test]
    fn test_port_overrides_app_port() {
        let builder = base()
            .set_override("app_port", 4000)
            .unwrap()
            .set_override("port", 8080)
            .unwrap();
        let config = load_from_builder(builder).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_missing_client_secret_is_fatal() {
        let err = load_from_builder(Config::builder()).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_SERVICE_ACCOUNT"), "got: {err}");
    }

    #[test]
    fn test_client_secret_without_app_section_is_rejected() {
        let builder = Config::builder()
            .set_override("google_service_account", r#"{"other":{}}"#)
            .unwrap();
        let err = load_from_builder(builder).unwrap_err();
        assert!(err.to_string().contains("installed"), "got: {err}");
    }

    #[test]
    fn test_whitelist_requires_origins() {
        let builder = base().set_override("use_whitelist", true).unwrap();
        let err = load_from_builder(builder).unwrap_err();
        assert!(err.to_string().contains("WHITELIST_ORIGIN"), "got: {err}");
    }

    #[test]
    fn test_whitelist_origins_are_split_and_trimmed() {
        let builder = base()
            .set_override("use_whitelist", true)
            .unwrap()
            .set_override("whitelist_origin", "https://a.example, https://b.example,")
            .unwrap();
        let config = load_from_builder(builder).unwrap();
        assert_eq!(
            config.cors.whitelist_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(config.cors.is_origin_allowed("https://b.example"));
        assert!(!config.cors.is_origin_allowed("https://evil.example"));
    }

    #[test]
    fn test_disabled_whitelist_allows_any_origin() {
        let cors = CorsConfig::default();
        assert!(cors.is_origin_allowed("https://anything.example"));
    }

    #[test]
    fn test_redirect_uri_prefers_explicit_value() {
        let builder = base()
            .set_override("google_service_redirect_uri", "https://app.example/callback")
            .unwrap();
        let config = load_from_builder(builder).unwrap();
        assert_eq!(config.gcal.redirect_uri, "https://app.example/callback");
    }

    #[test]
    fn test_redirect_uri_falls_back_to_oob() {
        let builder = Config::builder()
            .set_override(
                "google_service_account",
                r#"{"web":{"client_id":"cid","client_secret":"shh"}}"#,
            )
            .unwrap();
        let config = load_from_builder(builder).unwrap();
        assert_eq!(config.gcal.redirect_uri, OOB_REDIRECT_URI);
    }

    #[test]
    fn test_client_secret_debug_is_redacted() {
        let secret = ClientSecret::from_json(SECRET_JSON).unwrap();
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("shh"));
        assert!(rendered.contains("<redacted>"));
    }
}
