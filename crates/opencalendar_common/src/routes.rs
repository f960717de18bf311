// --- File: crates/opencalendar_common/src/routes.rs ---

use axum::{routing::get, Router};
use opencalendar_config::AppConfig;
use std::sync::Arc;

use crate::handlers::homepage_redirect_handler;

/// Creates a router containing the routes shared by every deployment.
pub fn routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(homepage_redirect_handler))
        .with_state(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use opencalendar_config::{ClientSecret, CorsConfig, GcalConfig, ServerConfig};
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn test_config(homepage_url: &str) -> Arc<AppConfig> {
        Arc::new(AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            cors: CorsConfig::default(),
            gcal: GcalConfig {
                client_secret: ClientSecret::from_json(
                    r#"{"installed":{"client_id":"cid","client_secret":"shh"}}"#,
                )
                .unwrap(),
                scopes: vec!["calendar.events".to_string()],
                redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
                token_path: PathBuf::from("token.json"),
                provider_timeout: None,
            },
            homepage_url: homepage_url.to_string(),
        })
    }

    #[tokio::test]
    async fn test_root_redirects_to_homepage() {
        let app = routes(test_config("https://example.com/readme"));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://example.com/readme"
        );
    }
}
