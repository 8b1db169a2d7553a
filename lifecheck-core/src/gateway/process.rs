//! Local-process liveness backend.
//!
//! Runs an executable as `<program> [args_prefix...] <videoPath> <photoPath>`
//! and reports its exit code together with stdout followed by stderr. The
//! child is killed if the call times out or the future is dropped.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::{timeout_from_env, Backend, LivenessGateway, DEFAULT_TIMEOUT};
use crate::error::{LivenessError, Result};
use crate::normalize::RawExternalReply;

/// Default interpreter for the bundled model script.
pub const DEFAULT_PROGRAM: &str = "python3";

/// Default model script, relative to the working directory.
pub const DEFAULT_SCRIPT: &str = "liveness-model/enhanced_liveness_check.py";

/// Configuration for the process backend.
#[derive(Debug, Clone)]
pub struct ProcessGatewayConfig {
    /// Executable to run
    pub program: String,
    /// Arguments placed before the two file paths
    pub args_prefix: Vec<String>,
    /// Bound on one run, after which the child is killed
    pub timeout: Duration,
}

impl Default for ProcessGatewayConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args_prefix: vec![DEFAULT_SCRIPT.to_string()],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ProcessGatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional: `LIVENESS_PROGRAM`, `LIVENESS_SCRIPT` (set empty to run the
    /// program with no script argument), `LIVENESS_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let program = std::env::var("LIVENESS_PROGRAM")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());

        let args_prefix = match std::env::var("LIVENESS_SCRIPT") {
            Ok(script) if script.trim().is_empty() => Vec::new(),
            Ok(script) => vec![script.trim().to_string()],
            Err(_) => vec![DEFAULT_SCRIPT.to_string()],
        };

        Self {
            program,
            args_prefix,
            timeout: timeout_from_env(),
        }
    }
}

/// Gateway that shells out to a local liveness executable.
#[derive(Debug)]
pub struct ProcessGateway {
    config: ProcessGatewayConfig,
}

impl ProcessGateway {
    pub fn new(config: ProcessGatewayConfig) -> Result<Self> {
        if config.program.trim().is_empty() {
            return Err(LivenessError::Internal(
                "Liveness program must not be empty".into(),
            ));
        }
        debug!(program = %config.program, "Process liveness gateway created");
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProcessGatewayConfig {
        &self.config
    }
}

#[async_trait]
impl LivenessGateway for ProcessGateway {
    #[instrument(
        level = "info",
        skip(self),
        fields(backend = "process", program = %self.config.program)
    )]
    async fn check(&self, reference_photo: &Path, staged_video: &Path) -> Result<RawExternalReply> {
        let start = Instant::now();

        let child = Command::new(&self.config.program)
            .args(&self.config.args_prefix)
            .arg(staged_video)
            .arg(reference_photo)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                warn!(error = %e, "Failed to start liveness process");
                LivenessError::Transport(format!(
                    "Failed to start liveness process '{}': {e}",
                    self.config.program
                ))
            })?;

        // Dropping the wait future on timeout drops the child, which kills it
        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(
                    timeout_secs = self.config.timeout.as_secs(),
                    "Liveness process timed out"
                );
                LivenessError::Transport(format!(
                    "Liveness process timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            })?
            .map_err(|e| LivenessError::Transport(format!("Liveness process failed: {e}")))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        let exit_code = output.status.code();
        info!(
            latency_ms = start.elapsed().as_millis() as u64,
            exit_code = ?exit_code,
            "Liveness process finished"
        );

        Ok(RawExternalReply::Process {
            exit_code,
            output: combined,
        })
    }

    fn backend(&self) -> Backend {
        Backend::Process
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_runs_bundled_script() {
        let config = ProcessGatewayConfig::default();
        assert_eq!(config.program, "python3");
        assert_eq!(config.args_prefix, vec![DEFAULT_SCRIPT.to_string()]);
    }

    #[test]
    fn test_empty_program_rejected() {
        let config = ProcessGatewayConfig {
            program: " ".into(),
            ..Default::default()
        };
        assert!(matches!(
            ProcessGateway::new(config),
            Err(LivenessError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_transport_error() {
        let gateway = ProcessGateway::new(ProcessGatewayConfig {
            program: "/nonexistent/liveness-binary".into(),
            args_prefix: Vec::new(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let err = gateway
            .check(Path::new("ref.jpg"), Path::new("clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, LivenessError::Transport(_)));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        /// Gateway running `script` under `/bin/sh`; `$1` is the video, `$2` the photo.
        fn shell(script: &str, timeout: Duration) -> ProcessGateway {
            ProcessGateway::new(ProcessGatewayConfig {
                program: "/bin/sh".into(),
                args_prefix: vec!["-c".into(), script.into(), "sh".into()],
                timeout,
            })
            .unwrap()
        }

        #[tokio::test]
        async fn test_exit_zero_with_argument_order() {
            let gateway = shell(
                r#"echo "VERIFICATION_SUCCESS video=$1 photo=$2"; exit 0"#,
                Duration::from_secs(10),
            );

            let reply = gateway
                .check(Path::new("ref.jpg"), Path::new("clip.mp4"))
                .await
                .unwrap();

            match reply {
                RawExternalReply::Process { exit_code, output } => {
                    assert_eq!(exit_code, Some(0));
                    assert!(output.contains("video=clip.mp4 photo=ref.jpg"));
                }
                other => panic!("unexpected reply: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_nonzero_exit_collects_stdout_then_stderr() {
            let gateway = shell(
                "echo out; echo err 1>&2; exit 1",
                Duration::from_secs(10),
            );

            let reply = gateway
                .check(Path::new("ref.jpg"), Path::new("clip.mp4"))
                .await
                .unwrap();

            assert_eq!(
                reply,
                RawExternalReply::Process {
                    exit_code: Some(1),
                    output: "out\nerr\n".into(),
                }
            );
        }

        #[tokio::test]
        async fn test_timeout_is_transport_error() {
            let gateway = shell("sleep 5", Duration::from_millis(200));

            let start = Instant::now();
            let err = gateway
                .check(Path::new("ref.jpg"), Path::new("clip.mp4"))
                .await
                .unwrap_err();

            assert!(matches!(err, LivenessError::Transport(ref msg) if msg.contains("timed out")));
            assert!(start.elapsed() < Duration::from_secs(4));
        }
    }
}
