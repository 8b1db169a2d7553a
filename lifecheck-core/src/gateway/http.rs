//! HTTP liveness backend with primary/fallback endpoints.
//!
//! The hosted model exposes two entry points whose contracts drift
//! independently. The primary takes the two files as multipart parts; the
//! fallback takes a single `data` field holding a JSON array of the two file
//! locations. The fallback is tried once, and only when the primary was
//! unreachable, answered with an endpoint-shape status, or answered 2xx with a
//! body that is not JSON. A reachable primary that rejects the request
//! (400, 401, 403, ...) is not retried. The configured timeout bounds the
//! whole exchange, fallback included.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use super::{timeout_from_env, Backend, LivenessGateway, DEFAULT_TIMEOUT};
use crate::error::{LivenessError, Result};
use crate::normalize::RawExternalReply;

/// Default hosted liveness endpoint.
pub const DEFAULT_BASE_URL: &str = "https://sushanadhikari-lightweight-liveliness.hf.space";

/// Default primary (multipart) endpoint path.
pub const DEFAULT_PRIMARY_PATH: &str = "/call/predict";

/// Default fallback (JSON argument) endpoint path.
pub const DEFAULT_FALLBACK_PATH: &str = "/api/predict";

/// Longest response excerpt quoted in error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// Configuration for the HTTP backend.
#[derive(Clone)]
pub struct HttpGatewayConfig {
    /// Base URL of the liveness service
    pub base_url: String,
    /// Path of the multipart endpoint
    pub primary_path: String,
    /// Path of the JSON-argument endpoint
    pub fallback_path: String,
    /// Bearer credential attached to both attempts when set
    pub bearer_token: Option<String>,
    /// Bound on one whole check, fallback included
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGatewayConfig")
            .field("base_url", &self.base_url)
            .field("primary_path", &self.primary_path)
            .field("fallback_path", &self.fallback_path)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            primary_path: DEFAULT_PRIMARY_PATH.to_string(),
            fallback_path: DEFAULT_FALLBACK_PATH.to_string(),
            bearer_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpGatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional: `LIVENESS_API_URL`, `LIVENESS_API_TOKEN`,
    /// `LIVENESS_PRIMARY_PATH`, `LIVENESS_FALLBACK_PATH`, `LIVENESS_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            base_url: var("LIVENESS_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            primary_path: var("LIVENESS_PRIMARY_PATH")
                .unwrap_or_else(|| DEFAULT_PRIMARY_PATH.to_string()),
            fallback_path: var("LIVENESS_FALLBACK_PATH")
                .unwrap_or_else(|| DEFAULT_FALLBACK_PATH.to_string()),
            bearer_token: var("LIVENESS_API_TOKEN"),
            timeout: timeout_from_env(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Outcome of a failed primary attempt.
#[derive(Debug)]
enum PrimaryFailure {
    /// Worth trying the fallback endpoint
    Switch(LivenessError),
    /// The capability answered and refused; surface as-is
    Fatal(LivenessError),
}

/// HTTP liveness gateway.
pub struct HttpGateway {
    client: Client,
    config: HttpGatewayConfig,
}

impl HttpGateway {
    /// Create a new HTTP gateway.
    #[instrument(level = "debug", skip_all, fields(
        base_url = %config.base_url,
        timeout_ms = config.timeout.as_millis() as u64
    ))]
    pub fn new(config: HttpGatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                LivenessError::Internal(format!("Failed to create HTTP client: {e}"))
            })?;

        debug!("HTTP liveness gateway created");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpGatewayConfig {
        &self.config
    }

    async fn call_primary(
        &self,
        reference_photo: &Path,
        staged_video: &Path,
    ) -> std::result::Result<String, PrimaryFailure> {
        let url = self.config.url(&self.config.primary_path);

        // Local read failures are not the capability's fault
        let photo_part = file_part(reference_photo).await.map_err(PrimaryFailure::Fatal)?;
        let video_part = file_part(staged_video).await.map_err(PrimaryFailure::Fatal)?;
        let form = Form::new()
            .part("profile_image", photo_part)
            .part("video_file", video_part);

        let response = self
            .authorized(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                PrimaryFailure::Switch(LivenessError::Transport(format!(
                    "Primary endpoint unreachable: {e}"
                )))
            })?;

        let status = response.status();
        debug!(status = %status, endpoint = %url, "Primary endpoint responded");

        if !status.is_success() {
            let excerpt = excerpt(&response.text().await.unwrap_or_default());
            return Err(if is_endpoint_shape_status(status) {
                PrimaryFailure::Switch(LivenessError::Transport(format!(
                    "Primary endpoint returned status {status}: {excerpt}"
                )))
            } else {
                PrimaryFailure::Fatal(LivenessError::Capability(format!(
                    "Liveness service rejected the request with status {status}: {excerpt}"
                )))
            });
        }

        let body = response.text().await.map_err(|e| {
            PrimaryFailure::Switch(LivenessError::Transport(format!(
                "Failed to read primary response: {e}"
            )))
        })?;

        if serde_json::from_str::<serde_json::Value>(&body).is_err() {
            return Err(PrimaryFailure::Switch(LivenessError::Capability(format!(
                "Primary endpoint returned a non-JSON body: {}",
                excerpt(&body)
            ))));
        }

        Ok(body)
    }

    async fn call_fallback(&self, reference_photo: &Path, staged_video: &Path) -> Result<String> {
        let url = self.config.url(&self.config.fallback_path);

        let arguments = serde_json::to_string(&[
            reference_photo.to_string_lossy(),
            staged_video.to_string_lossy(),
        ])
        .map_err(|e| LivenessError::Internal(format!("Failed to encode arguments: {e}")))?;
        let form = Form::new().text("data", arguments);

        let response = self
            .authorized(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| LivenessError::Transport(format!("Fallback endpoint unreachable: {e}")))?;

        let status = response.status();
        debug!(status = %status, endpoint = %url, "Fallback endpoint responded");

        if !status.is_success() {
            let excerpt = excerpt(&response.text().await.unwrap_or_default());
            return Err(LivenessError::Transport(format!(
                "Fallback endpoint returned status {status}: {excerpt}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| LivenessError::Transport(format!("Failed to read fallback response: {e}")))
    }

    /// Primary attempt, then the fallback when the primary is worth switching from.
    async fn exchange(&self, reference_photo: &Path, staged_video: &Path) -> Result<String> {
        match self.call_primary(reference_photo, staged_video).await {
            Ok(body) => Ok(body),
            Err(PrimaryFailure::Fatal(err)) => {
                warn!(error = %err, "Primary endpoint refused the request");
                Err(err)
            }
            Err(PrimaryFailure::Switch(primary_err)) => {
                warn!(error = %primary_err, "Primary endpoint failed, trying fallback");
                self.call_fallback(reference_photo, staged_video)
                    .await
                    .map_err(|fallback_err| {
                        LivenessError::Transport(format!(
                            "Both liveness endpoints failed (primary: {}; fallback: {})",
                            primary_err.detail(),
                            fallback_err.detail()
                        ))
                    })
            }
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl LivenessGateway for HttpGateway {
    #[instrument(
        level = "info",
        skip(self),
        fields(backend = "http", base_url = %self.config.base_url)
    )]
    async fn check(&self, reference_photo: &Path, staged_video: &Path) -> Result<RawExternalReply> {
        let start = Instant::now();

        let body = tokio::time::timeout(
            self.config.timeout,
            self.exchange(reference_photo, staged_video),
        )
        .await
        .map_err(|_| {
            warn!(
                timeout_ms = self.config.timeout.as_millis() as u64,
                "Liveness service timed out"
            );
            LivenessError::Transport(format!(
                "Liveness service did not answer within {}s",
                self.config.timeout.as_secs_f32()
            ))
        })??;

        info!(
            latency_ms = start.elapsed().as_millis() as u64,
            response_bytes = body.len(),
            "Liveness service answered"
        );
        Ok(RawExternalReply::Http { body })
    }

    fn backend(&self) -> Backend {
        Backend::Http
    }
}

/// Statuses that suggest the endpoint convention itself is wrong or down.
pub fn is_endpoint_shape_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NOT_FOUND
            | StatusCode::METHOD_NOT_ALLOWED
            | StatusCode::UNSUPPORTED_MEDIA_TYPE
            | StatusCode::UNPROCESSABLE_ENTITY
    ) || status.is_server_error()
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        LivenessError::Internal(format!("Failed to read {}: {e}", path.display()))
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(guess_mime(path))
        .map_err(|e| LivenessError::Internal(format!("Invalid part MIME type: {e}")))
}

/// Content type from the file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
