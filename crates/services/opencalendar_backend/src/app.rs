// File: services/opencalendar_backend/src/app.rs
use axum::{
    http::{request::Parts, HeaderValue},
    response::{IntoResponse, Response},
    Router,
};
use opencalendar_common::internal_error;
use opencalendar_config::{AppConfig, CorsConfig};
use opencalendar_gcal::handlers::GcalState;
use opencalendar_gcal::service::CalendarProvider;
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as CorsAny, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{error, Level};

/// Assembles the full application: the shared routes, the calendar routes
/// and the middleware stack.
pub fn build_app(config: Arc<AppConfig>, calendar: Arc<dyn CalendarProvider>) -> Router {
    let gcal_state = Arc::new(GcalState { calendar });

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = opencalendar_common::routes(config.clone())
        .merge(opencalendar_gcal::routes::routes(gcal_state));

    #[cfg(feature = "openapi")]
    {
        use opencalendar_gcal::doc::GcalApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(info(
            title = "OpenCalendar API",
            version = "0.1.0",
            description = "Google Calendar proxy",
            license(name = "MIT", url = "https://opensource.org/licenses/MIT")
        ))]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(GcalApiDoc::openapi());
        app = app.merge(SwaggerUi::new("/docs").url("/docs/openapi.json", openapi_doc));
    }

    with_middleware(app, &config.cors)
}

/// Wraps `router` in panic catching, request tracing and CORS, outermost last.
pub fn with_middleware(router: Router, cors: &CorsConfig) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(cors_layer(cors))
}

/// Reflects the request origin back when it may read the response.
///
/// Origins outside the whitelist get no CORS headers; the request itself is
/// still served.
pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let allow_origin = if cors.use_whitelist {
        let cors = cors.clone();
        AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            origin
                .to_str()
                .map(|origin| cors.is_origin_allowed(origin))
                .unwrap_or(false)
        })
    } else {
        AllowOrigin::mirror_request()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(CorsAny)
        .allow_headers(CorsAny)
}

/// A panicking handler is logged and answered with a 500; the server keeps running.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("handler panicked: {}", detail);

    internal_error("unexpected failure while handling the request").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::routing::get;
    use google_calendar3::api::Event;
    use opencalendar_common::services::{BoxFuture, EventLink};
    use opencalendar_config::{ClientSecret, GcalConfig, ServerConfig};
    use opencalendar_gcal::service::GcalServiceError;
    use std::path::PathBuf;
    use tower::ServiceExt;

    struct NoEvents;

    impl CalendarProvider for NoEvents {
        fn get_event(&self, _: &str, _: &str) -> BoxFuture<'_, Event, GcalServiceError> {
            Box::pin(async { Err(GcalServiceError::Rejected("Not Found".to_string())) })
        }

        fn patch_event(&self, _: &str, _: &str, _: Event) -> BoxFuture<'_, EventLink, GcalServiceError> {
            Box::pin(async { Err(GcalServiceError::Rejected("Not Found".to_string())) })
        }

        fn insert_event(&self, _: &str, _: Event) -> BoxFuture<'_, EventLink, GcalServiceError> {
            Box::pin(async { Ok(EventLink::default()) })
        }
    }

    fn config(cors: CorsConfig) -> Arc<AppConfig> {
        Arc::new(AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            cors,
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
            homepage_url: "https://github.com/hrz8/opencalendar#readme".to_string(),
        })
    }

    fn whitelist(origins: &[&str]) -> CorsConfig {
        CorsConfig {
            use_whitelist: true,
            whitelist_origins: origins.iter().map(|o| o.to_string()).collect(),
        }
    }

    fn app(cors: CorsConfig) -> Router {
        build_app(config(cors), Arc::new(NoEvents))
    }

    fn get_from(uri: &str, origin: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_redirects_through_full_stack() {
        let response = app(CorsConfig::default())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://github.com/hrz8/opencalendar#readme"
        );
    }

    #[tokio::test]
    async fn test_any_origin_is_mirrored_without_whitelist() {
        let response = app(CorsConfig::default())
            .oneshot(get_from("/", "https://anywhere.example"))
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://anywhere.example"
        );
    }

    #[tokio::test]
    async fn test_whitelisted_origin_is_allowed() {
        let response = app(whitelist(&["https://a.example", "https://b.example"]))
            .oneshot(get_from("/", "https://b.example"))
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://b.example"
        );
    }

    #[tokio::test]
    async fn test_unlisted_origin_gets_no_cors_headers() {
        let response = app(whitelist(&["https://a.example"]))
            .oneshot(get_from("/", "https://evil.example"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_preflight_for_whitelisted_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/create")
            .header(header::ORIGIN, "https://a.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app(whitelist(&["https://a.example"]))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://a.example"
        );
    }

    #[tokio::test]
    async fn test_provider_error_reaches_client_as_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/send/evt123")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"recipient":"a@b.com"}"#))
            .unwrap();

        let response = app(CorsConfig::default()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Not Found"}));
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_server_error() {
        async fn boom() -> &'static str {
            panic!("handler exploded")
        }
        let router = Router::new().route("/boom", get(boom));
        let app = with_middleware(router, &CorsConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["error"],
            "Internal error: unexpected failure while handling the request"
        );
    }
}
