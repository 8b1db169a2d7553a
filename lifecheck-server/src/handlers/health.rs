//! Health check handlers
//!
//! Provides health and readiness endpoints for monitoring and orchestration.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::handlers::AppState;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// Server version from Cargo.toml
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    /// Service name
    #[schema(example = "lifecheck-server")]
    pub service: &'static str,
    /// Configured liveness backend: "http" or "process"
    #[schema(example = "http")]
    pub backend: &'static str,
    /// User directory backend: "memory" or "postgres"
    #[schema(example = "postgres")]
    pub directory: &'static str,
}

/// Health check
///
/// Returns JSON with service status, version and the configured backends.
/// Used for monitoring and load balancer health checks. The external
/// liveness service is not probed.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "lifecheck-server",
        backend: state.orchestrator.backend().as_str(),
        directory: state.directory().name(),
    })
}

/// Readiness response for Kubernetes
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    /// Optional message explaining status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Readiness probe
///
/// Returns 200 once the user directory answers, 503 otherwise.
/// Unlike /health, this touches the backing store.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "User directory unreachable")
    )
)]
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, ApiError> {
    let directory = state.directory();
    directory.check_health().await.map_err(|e| {
        tracing::warn!(directory = directory.name(), error = %e, "Readiness check failed");
        ApiError::service_unavailable("User directory unreachable")
    })?;

    Ok(Json(ReadyResponse {
        ready: true,
        message: None,
    }))
}
