//! CLI entry point for examwatch.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

mod app_config;
mod cli;
mod commands;
mod output;

use cli::{Args, Command};
use commands::RunContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = app_config::load_config(args.config.as_deref())?;
    match (&loaded.path, &loaded.config) {
        (Some(path), Some(_)) => debug!(path = %path.display(), "Loaded config file"),
        (path, None) => debug!(path = ?path, "No config file, using defaults"),
        (None, Some(_)) => {}
    }

    let ctx = RunContext::new(&args, loaded.file_config())?;
    debug!(state_dir = %ctx.state_dir.display(), "Resolved state directory");

    match &args.command {
        Command::Listing(listing) => commands::run_listing_command(&ctx, listing).await?,
        Command::Exams(exams) => commands::run_exams_command(&ctx, exams).await?,
        Command::Result(result) => commands::run_result_command(&ctx, result).await?,
    }

    info!("Done");
    Ok(())
}
