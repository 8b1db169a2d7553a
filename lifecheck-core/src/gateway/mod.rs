//! Liveness capability backends.
//!
//! The external liveness model is reachable in two ways:
//!
//! - **HTTP** - a hosted inference endpoint taking the reference photo and the
//!   clip as multipart form data, with a JSON-argument fallback endpoint
//! - **Process** - a local executable taking `(videoPath, photoPath)` and
//!   answering with its exit code and captured output
//!
//! Both sit behind [`LivenessGateway`] so the orchestrator never knows which
//! one is configured. Every call is bounded by the configured timeout.
//!
//! ```no_run
//! use lifecheck_core::gateway::{GatewayConfig, GatewayFactory};
//!
//! # async fn example() -> lifecheck_core::Result<()> {
//! let gateway = GatewayFactory::create(GatewayConfig::from_env())?;
//! let reply = gateway
//!     .check("uploads/ref.jpg".as_ref(), "temp-videos/clip.mp4".as_ref())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod process;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use http::{guess_mime, HttpGateway, HttpGatewayConfig};
pub use process::{ProcessGateway, ProcessGatewayConfig};

use crate::error::Result;
use crate::normalize::RawExternalReply;

/// Default bound on one liveness call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A liveness-detection backend.
///
/// Implementations must be thread-safe (`Send + Sync`) and must not leave
/// sockets or child processes behind once `check` returns.
#[async_trait]
pub trait LivenessGateway: Send + Sync {
    /// Ask the capability whether `staged_video` shows a live person
    /// matching `reference_photo`.
    ///
    /// Fails with [`LivenessError::Transport`](crate::LivenessError::Transport)
    /// when the capability cannot be reached or times out, and with
    /// [`LivenessError::Capability`](crate::LivenessError::Capability) when it
    /// refuses the request.
    async fn check(&self, reference_photo: &Path, staged_video: &Path) -> Result<RawExternalReply>;

    /// Which backend this is.
    fn backend(&self) -> Backend;
}

/// Backend identifier for logs and health output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Http,
    Process,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Process => "process",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend selection. One backend serves every call; they are never mixed.
#[derive(Debug, Clone)]
pub enum GatewayConfig {
    Http(HttpGatewayConfig),
    Process(ProcessGatewayConfig),
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::Http(HttpGatewayConfig::default())
    }
}

impl GatewayConfig {
    /// Load backend selection from environment variables.
    ///
    /// `LIVENESS_BACKEND` picks `http` (default) or `process`; the remaining
    /// variables are read by the per-backend `from_env` constructors.
    pub fn from_env() -> Self {
        match std::env::var("LIVENESS_BACKEND")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            Ok("process") => Self::Process(ProcessGatewayConfig::from_env()),
            Ok("http") | Err(_) => Self::Http(HttpGatewayConfig::from_env()),
            Ok(other) => {
                tracing::warn!(backend = other, "Unknown LIVENESS_BACKEND, using http");
                Self::Http(HttpGatewayConfig::from_env())
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::Http(_) => Backend::Http,
            Self::Process(_) => Backend::Process,
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            Self::Http(c) => c.timeout,
            Self::Process(c) => c.timeout,
        }
    }
}

/// Read `LIVENESS_TIMEOUT_SECS`, ignoring zero and unparsable values.
pub(crate) fn timeout_from_env() -> Duration {
    std::env::var("LIVENESS_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT)
}

/// Factory for creating liveness gateways.
pub struct GatewayFactory;

impl GatewayFactory {
    /// Create a gateway from configuration.
    pub fn create(config: GatewayConfig) -> Result<Arc<dyn LivenessGateway>> {
        match config {
            GatewayConfig::Http(http_config) => {
                let gateway = HttpGateway::new(http_config)?;
                Ok(Arc::new(gateway))
            }
            GatewayConfig::Process(process_config) => {
                let gateway = ProcessGateway::new(process_config)?;
                Ok(Arc::new(gateway))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_http() {
        let config = GatewayConfig::default();
        assert_eq!(config.backend(), Backend::Http);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_factory_creates_both_backends() {
        let http = GatewayFactory::create(GatewayConfig::default()).unwrap();
        assert_eq!(http.backend(), Backend::Http);

        let process =
            GatewayFactory::create(GatewayConfig::Process(ProcessGatewayConfig::default()))
                .unwrap();
        assert_eq!(process.backend(), Backend::Process);
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::Http.to_string(), "http");
        assert_eq!(Backend::Process.to_string(), "process");
    }
}
