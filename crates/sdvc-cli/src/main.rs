//! # sdvc CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sdvc_cli::config::load_settings;
use sdvc_cli::issue::{run_issue, IssueArgs};
use sdvc_cli::keygen::{run_keygen, KeygenArgs};
use sdvc_cli::present::{run_present, PresentArgs};
use sdvc_cli::verify::{run_verify, VerifyArgs};

/// Selective disclosure credentials from the command line.
///
/// Issue SD-JWT credentials with blinded claims, derive presentations that
/// reveal only chosen claims, and verify them.
#[derive(Parser, Debug)]
#[command(name = "sdvc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the issuer settings file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 or P-256 key pair as JWK files.
    Keygen(KeygenArgs),

    /// Blind and sign a JSON claim set.
    Issue(IssueArgs),

    /// Derive a presentation revealing selected claims.
    Present(PresentArgs),

    /// Verify a presentation and print the disclosed claims.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!("sdvc CLI starting");

    let result = match cli.command {
        Commands::Keygen(args) => run_keygen(&args),
        Commands::Issue(args) => {
            load_settings(cli.config.as_deref()).and_then(|settings| run_issue(&args, &settings))
        }
        Commands::Present(args) => run_present(&args),
        Commands::Verify(args) => run_verify(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
