//! Lifecheck CLI - Run liveness checks on local files.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use lifecheck_core::Backend;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Verified / no re-verification due
  1   General error
  64  Invalid arguments
  65  Not verified / re-verification required
  66  Input file missing or unusable
  69  Liveness service unavailable";

#[derive(Parser)]
#[command(name = "lifecheck")]
#[command(author, version, about = "Liveness verification for registered users", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    /// Hosted inference endpoint (LIVENESS_API_URL)
    Http,
    /// Local executable (LIVENESS_PROGRAM, LIVENESS_SCRIPT)
    Process,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Http => Backend::Http,
            BackendArg::Process => Backend::Process,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a clip shows the live person in a reference photo
    Check {
        /// Reference photo of the person
        #[arg(long, value_name = "FILE")]
        photo: PathBuf,

        /// Clip to check (mp4, webm, mov, avi or mkv)
        #[arg(long, value_name = "FILE")]
        video: PathBuf,

        /// Liveness backend (defaults to LIVENESS_BACKEND, then http)
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,

        /// Staging directory for the clip
        #[arg(long, value_name = "DIR")]
        temp_dir: Option<PathBuf>,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Tell whether re-verification is due under the freshness window
    Status {
        /// Last successful verification (RFC 3339); omit if never verified
        #[arg(long, value_name = "RFC3339")]
        last: Option<String>,

        /// Evaluate at this instant instead of now (RFC 3339)
        #[arg(long, value_name = "RFC3339")]
        at: Option<String>,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lifecheck={0},lifecheck_core={0}",
            cli.log_level
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check {
            photo,
            video,
            backend,
            temp_dir,
            json,
        } => {
            commands::check::execute(photo, video, backend.map(Backend::from), temp_dir, json)
                .await
        }
        Commands::Status { last, at, json } => commands::status::execute(last, at, json),
    };

    let exit = result.unwrap_or_else(|err| ExitCode::from_anyhow(&err));

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    // Exit codes are all in 0..=255
    std::process::ExitCode::from(exit.code as u8)
}
