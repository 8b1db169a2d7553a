//! Check command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use lifecheck_core::{
    media, normalize, Backend, DetailValue, GatewayConfig, GatewayFactory, HttpGatewayConfig,
    MediaKind, ProcessGatewayConfig, TemporaryMediaStore, VerificationVerdict,
};
use tracing::{debug, info, warn};

use crate::exit_codes::{self, ExitCode};
use crate::utils::{default_temp_dir, load_media};

/// Gateway configuration from the environment, with the backend optionally
/// forced from the command line.
pub fn gateway_config(backend: Option<Backend>) -> GatewayConfig {
    match backend {
        Some(Backend::Http) => GatewayConfig::Http(HttpGatewayConfig::from_env()),
        Some(Backend::Process) => GatewayConfig::Process(ProcessGatewayConfig::from_env()),
        None => GatewayConfig::from_env(),
    }
}

/// Execute the check command.
pub async fn execute(
    photo: PathBuf,
    video: PathBuf,
    backend: Option<Backend>,
    temp_dir: Option<PathBuf>,
    json: bool,
) -> Result<ExitCode> {
    // The reference photo is handed over by path, it only has to exist
    tokio::fs::metadata(&photo)
        .await
        .with_context(|| format!("Failed to read photo: {}", photo.display()))?;

    let clip = load_media(&video).await?;
    media::validate(&clip, MediaKind::Video)
        .map_err(lifecheck_core::LivenessError::from)
        .with_context(|| format!("Unusable video: {}", video.display()))?;

    let config = gateway_config(backend);
    let gateway = GatewayFactory::create(config).context("Failed to set up liveness backend")?;

    let staging = TemporaryMediaStore::new(temp_dir.unwrap_or_else(default_temp_dir))
        .context("Failed to prepare staging directory")?;
    let staged = staging
        .stage(clip.data, clip.file_name.as_deref())
        .await
        .context("Failed to stage video")?;

    info!(
        backend = %gateway.backend(),
        photo = %photo.display(),
        staged = %staged.path().display(),
        "Running liveness check"
    );

    let reply = gateway.check(&photo, staged.path()).await;
    staged.release();
    let reply = reply.context("Liveness check failed")?;
    debug!(?reply, "Raw liveness reply");

    let verdict = normalize(&reply);

    if json {
        let rendered =
            serde_json::to_string_pretty(&verdict).context("Failed to serialize verdict")?;
        println!("{rendered}");
    } else {
        print_verdict(&verdict);
    }

    if verdict.verified() {
        Ok(ExitCode::success())
    } else {
        warn!(reason = verdict.reason(), "Liveness not confirmed");
        Ok(ExitCode::error(
            exit_codes::VERIFICATION_FAILED,
            format!("Not verified: {}", verdict.reason()),
        ))
    }
}

fn print_verdict(verdict: &VerificationVerdict) {
    println!();
    if verdict.verified() {
        println!("{}", "╔════════════════════════════════════════╗".green());
        println!(
            "{}",
            "║              VERIFIED                  ║".green().bold()
        );
        println!("{}", "╚════════════════════════════════════════╝".green());
    } else {
        println!("{}", "╔════════════════════════════════════════╗".red());
        println!(
            "{}",
            "║            NOT VERIFIED                ║".red().bold()
        );
        println!("{}", "╚════════════════════════════════════════╝".red());
    }
    println!();
    println!("   {} {}", "Reason:".dimmed(), verdict.reason());
    println!(
        "   {} {:.1}%",
        "Confidence:".dimmed(),
        verdict.confidence() * 100.0
    );

    for (key, value) in verdict.details() {
        // The full model transcript is only shown with --json
        if key == "fullResult" || key == "rawResponse" {
            continue;
        }
        println!("   {} {}", format!("{key}:").dimmed(), render_detail(value));
    }
}

fn render_detail(value: &DetailValue) -> String {
    match value {
        DetailValue::Flag(flag) => flag.to_string(),
        DetailValue::Number(n) => n.to_string(),
        DetailValue::Text(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_backend_overrides_environment() {
        assert_eq!(
            gateway_config(Some(Backend::Process)).backend(),
            Backend::Process
        );
        assert_eq!(gateway_config(Some(Backend::Http)).backend(), Backend::Http);
    }

    #[test]
    fn test_render_detail() {
        assert_eq!(render_detail(&DetailValue::Flag(true)), "true");
        assert_eq!(render_detail(&DetailValue::Number(0.5)), "0.5");
        assert_eq!(render_detail(&"blink".into()), "blink");
    }
}
