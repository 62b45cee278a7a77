use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::auth::{auth_middleware, AuthService};
use crate::config::CorsConfig;
use crate::metrics::MetricsService;

use super::handlers::{get_metrics, get_schema, health_check, refresh_export, AppState};

pub fn create_api_router(
    service: Arc<MetricsService>,
    auth_service: Arc<AuthService>,
    cors: &CorsConfig,
) -> Router {
    let state = Arc::new(AppState { service });

    let protected_routes = Router::new()
        .route("/metrics", get(get_metrics))
        .route("/refresh", post(refresh_export))
        .route("/schema", get(get_schema))
        .route_layer(middleware::from_fn(
            move |headers: HeaderMap, req: Request, next: Next| {
                let auth = Arc::clone(&auth_service);
                auth_middleware(auth, headers, req, next)
            },
        ))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", protected_routes)
        .layer(cors_layer(cors))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
        ]);

    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
