//! Status command implementation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use lifecheck_core::{verification_required, FRESHNESS_WINDOW_DAYS};

use crate::exit_codes::{self, ExitCode};
use crate::utils::{format_timestamp, parse_instant};

/// Execute the status command.
///
/// `last` is the previous verification instant (absent when the user never
/// verified); `at` overrides the evaluation instant, which defaults to now.
pub fn execute(last: Option<String>, at: Option<String>, json: bool) -> Result<ExitCode> {
    let last = last.as_deref().map(parse_instant).transpose()?;
    let now = match at.as_deref() {
        Some(value) => parse_instant(value)?,
        None => Utc::now(),
    };

    let required = verification_required(last, now);

    if json {
        let rendered = serde_json::json!({
            "lastVerificationDate": last,
            "evaluatedAt": now,
            "verificationRequired": required,
            "freshnessWindowDays": FRESHNESS_WINDOW_DAYS,
        });
        println!("{rendered:#}");
    } else {
        print_status(last, now, required);
    }

    if required {
        Ok(ExitCode::error(
            exit_codes::VERIFICATION_FAILED,
            "Re-verification required",
        ))
    } else {
        Ok(ExitCode::success())
    }
}

fn print_status(last: Option<DateTime<Utc>>, now: DateTime<Utc>, required: bool) {
    match last {
        Some(last) => {
            let age = now.signed_duration_since(last).num_days();
            println!(
                "   {} {} ({} days ago)",
                "Last verified:".dimmed(),
                format_timestamp(last),
                age
            );
        }
        None => println!("   {} {}", "Last verified:".dimmed(), "never".yellow()),
    }

    if required {
        println!(
            "   {} {}",
            "Status:".dimmed(),
            "RE-VERIFICATION REQUIRED".red().bold()
        );
    } else {
        println!(
            "   {} {} (window: {} days)",
            "Status:".dimmed(),
            "up to date".green(),
            FRESHNESS_WINDOW_DAYS
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_verified_requires_verification() {
        let exit = execute(None, Some("2026-10-16T00:00:00Z".into()), true).unwrap();
        assert_eq!(exit.code, exit_codes::VERIFICATION_FAILED);
    }

    #[test]
    fn test_fresh_verification_is_up_to_date() {
        let exit = execute(
            Some("2026-09-01T00:00:00Z".into()),
            Some("2026-10-16T00:00:00Z".into()),
            false,
        )
        .unwrap();
        assert_eq!(exit, ExitCode::success());
    }

    #[test]
    fn test_invalid_timestamp_is_an_error() {
        assert!(execute(Some("yesterday".into()), None, false).is_err());
    }
}
