//! Runtime configuration for lifecheck-server
//!
//! Every knob is read from the environment once at startup. `Config::default()`
//! gives the same values without touching the environment and is what the
//! tests build routers with.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use lifecheck_core::GatewayConfig;

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

#[derive(Debug, Clone)]
pub struct Config {
    /// `PORT`, 3000
    pub port: u16,
    /// `HOST`, 127.0.0.1
    pub host: IpAddr,
    /// `ALLOWED_ORIGINS`, comma-separated; unset allows any origin
    pub allowed_origins: Option<Vec<String>>,
    /// `BODY_LIMIT_MB`, 60 (must exceed the 50 MB clip ceiling)
    pub body_limit_mb: usize,
    /// `REQUEST_TIMEOUT_SECS`, 180 (must exceed the liveness timeout)
    pub timeout_secs: u64,
    /// `RATE_LIMIT_ENABLED`, on unless set to `false`; off in `Default`
    pub rate_limit_enabled: bool,
    /// `RATE_LIMIT_PER_SEC`, 10
    pub rate_limit_per_sec: u64,
    /// `RATE_LIMIT_BURST`, 20
    pub rate_limit_burst: u32,
    /// `UPLOAD_DIR`, reference photos
    pub upload_dir: PathBuf,
    /// `TEMP_DIR`, staged clips
    pub temp_dir: PathBuf,
    /// `DATABASE_URL`; the in-memory directory is used when unset
    pub database_url: Option<String>,
    /// `DATABASE_MAX_CONNECTIONS`, 20
    pub database_max_connections: u32,
    /// `DATABASE_MIN_CONNECTIONS`, 2
    pub database_min_connections: u32,
    /// `LIVENESS_*` variables
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: LOOPBACK,
            allowed_origins: None,
            body_limit_mb: 60,
            timeout_secs: 180,
            rate_limit_enabled: false,
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            upload_dir: PathBuf::from("uploads"),
            temp_dir: PathBuf::from("temp-videos"),
            database_url: None,
            database_max_connections: 20,
            database_min_connections: 2,
            gateway: GatewayConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = match std::env::var("HOST") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(host = %raw, "Unparsable HOST, binding to loopback");
                LOOPBACK
            }),
            Err(_) => defaults.host,
        };

        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            host,
            allowed_origins: env_list("ALLOWED_ORIGINS"),
            body_limit_mb: env_parse("BODY_LIMIT_MB").unwrap_or(defaults.body_limit_mb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_parse("RATE_LIMIT_PER_SEC")
                .unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            upload_dir: env_path("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            temp_dir: env_path("TEMP_DIR").unwrap_or(defaults.temp_dir),
            database_url: env_nonempty("DATABASE_URL"),
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            database_min_connections: env_parse("DATABASE_MIN_CONNECTIONS")
                .unwrap_or(defaults.database_min_connections),
            gateway: GatewayConfig::from_env(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Warn about settings that will cut liveness calls short.
    pub fn warn_on_inconsistencies(&self) {
        let liveness_secs = self.gateway.timeout().as_secs();
        if self.timeout_secs <= liveness_secs {
            tracing::warn!(
                request_timeout_secs = self.timeout_secs,
                liveness_timeout_secs = liveness_secs,
                "Request timeout does not exceed liveness timeout; slow checks will be cut off"
            );
        }

        let clip_ceiling_mb = lifecheck_core::MAX_VIDEO_SIZE / (1024 * 1024);
        if self.body_limit_mb <= clip_ceiling_mb {
            tracing::warn!(
                body_limit_mb = self.body_limit_mb,
                clip_ceiling_mb,
                "Body limit does not exceed the clip size ceiling; large clips will be refused early"
            );
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_nonempty(name).and_then(|v| v.parse().ok())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_nonempty(name).map(PathBuf::from)
}

fn env_list(name: &str) -> Option<Vec<String>> {
    env_nonempty(name).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}
