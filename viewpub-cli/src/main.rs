//! viewpub: publish generated dashboard views and check they are live.
//!
//! # Usage
//!
//! ```text
//! viewpub deploy   [--config PATH] [--views-dir DIR] [--provider P] [--base-url URL]
//!                  [--dry-run | --check-only] [--json]
//! viewpub validate [--config PATH] [--base-url URL] [--file NAME...] [--from-remote]
//!                  [--no-content] [--timeout SECS] [--concurrency N] [--json]
//! viewpub manifest [DIR]
//! ```
//!
//! `-v` raises logging to info, `-vv` to debug. `RUST_LOG` takes precedence.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{deploy::DeployArgs, manifest::ManifestArgs, validate::ValidateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "viewpub",
    version,
    about = "Publish generated JSON views to a static host and verify them",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload changed views, then publish the new manifest.
    Deploy(DeployArgs),

    /// Fetch published views over the public read path and check them.
    Validate(ValidateArgs),

    /// Print the manifest for a local view directory.
    Manifest(ManifestArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    log::debug!("viewpub v{}", env!("CARGO_PKG_VERSION"));
    match cli.command {
        Commands::Deploy(args) => args.run(),
        Commands::Validate(args) => args.run(),
        Commands::Manifest(args) => args.run(),
    }
}
