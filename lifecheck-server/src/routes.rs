//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::{
    health, login_handler, profile_handler, ready, register_handler,
    upload_profile_picture_handler, verification_status_handler, verify_handler, AppState,
};
use crate::openapi::ApiDoc;

/// Create the application router with default config (for testing)
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(&Config::default(), state)
}

/// Create the application router with custom configuration
pub fn create_router_with_config(config: &Config, state: AppState) -> Router {
    // Configure CORS based on allowed_origins
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        }
        _ => {
            tracing::warn!("CORS: Allowing all origins (dev mode)");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // Request body limit; replaces axum's 2 MB extractor default so clips fit
    let body_limit = RequestBodyLimitLayer::new(config.body_limit_mb * 1024 * 1024);

    // Request timeout
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    // Base router with common layers
    let router = Router::new()
        .route("/verify/{username}", post(verify_handler))
        .route(
            "/verification-status/{username}",
            get(verification_status_handler),
        )
        .route(
            "/upload-profile-picture/{username}",
            post(upload_profile_picture_handler),
        )
        .route("/users/register", post(register_handler))
        .route("/users/login", post(login_handler))
        .route("/users/profile/{username}", get(profile_handler))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(body_limit)
        .layer(timeout);

    // Conditionally apply rate limiting (disabled in tests, enabled in production)
    let governor_conf = config
        .rate_limit_enabled
        .then(|| {
            GovernorConfigBuilder::default()
                .per_second(config.rate_limit_per_sec)
                .burst_size(config.rate_limit_burst)
                .finish()
        })
        .flatten();

    match governor_conf {
        Some(governor_conf) => {
            tracing::info!(
                "Rate limiting: {} req/s (burst: {})",
                config.rate_limit_per_sec,
                config.rate_limit_burst
            );

            router
                .layer(GovernorLayer::new(Arc::new(governor_conf)))
                .layer(TraceLayer::new_for_http())
        }
        None => {
            if config.rate_limit_enabled {
                tracing::warn!(
                    per_sec = config.rate_limit_per_sec,
                    burst = config.rate_limit_burst,
                    "Rate limiting: invalid settings, DISABLED"
                );
            } else {
                tracing::warn!("Rate limiting: DISABLED");
            }
            router.layer(TraceLayer::new_for_http())
        }
    }
}
