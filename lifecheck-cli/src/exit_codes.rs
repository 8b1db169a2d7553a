//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use lifecheck_core::LivenessError;

/// Successful execution (live person verified, or no re-verification due).
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (not verified, or re-verification required).
/// Maps to EX_DATAERR from sysexits.h.
pub const VERIFICATION_FAILED: i32 = 65;

/// Cannot open or use an input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Liveness service unreachable or refusing requests.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const SERVICE_UNAVAILABLE: i32 = 69;

/// Represents an exit code with optional error context.
#[derive(Debug, PartialEq, Eq)]
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify by the first typed error in the chain
        let code = err
            .chain()
            .find_map(|cause| {
                if let Some(e) = cause.downcast_ref::<LivenessError>() {
                    Some(match e {
                        LivenessError::Transport(_) | LivenessError::Capability(_) => {
                            SERVICE_UNAVAILABLE
                        }
                        LivenessError::InvalidMedia(_) | LivenessError::NoProfilePhoto => {
                            INPUT_ERROR
                        }
                        _ => GENERAL_ERROR,
                    })
                } else if cause.downcast_ref::<std::io::Error>().is_some() {
                    Some(INPUT_ERROR)
                } else if cause.downcast_ref::<chrono::ParseError>().is_some() {
                    Some(USAGE_ERROR)
                } else {
                    None
                }
            })
            .unwrap_or(GENERAL_ERROR);

        Self {
            code,
            message: Some(message),
        }
    }
}
