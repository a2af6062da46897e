//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Watch a public listing for new entries and collect exam results from a member portal.
#[derive(Parser, Debug)]
#[command(name = "examwatch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $XDG_CONFIG_HOME/examwatch/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON instead of text lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory for the seen set and result cache
    #[arg(long, value_name = "DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Timeout for pages and login in seconds (1-3600)
    #[arg(long, value_name = "SECS", global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub request_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report listing entries not seen before
    Listing(ListingArgs),
    /// List the member's exams
    Exams(ExamsArgs),
    /// Extract the result from one result document
    Result(ResultArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ListingArgs {
    /// Listing URL (overrides `listing_url` in the config file)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Walk every page (offsets 0-260) instead of only the first
    #[arg(long)]
    pub full: bool,

    /// Do not record the reported entries as seen
    #[arg(long)]
    pub no_commit: bool,

    /// Delay between backfill pages in milliseconds (0 to disable, max 60000)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub page_delay: Option<u64>,
}

#[derive(ClapArgs, Debug)]
pub struct PortalArgs {
    /// Portal base URL (overrides `portal_url` in the config file)
    #[arg(long, value_name = "URL")]
    pub portal_url: Option<String>,

    /// Portal username (falls back to EXAMWATCH_USERNAME); the password is read from EXAMWATCH_PASSWORD
    #[arg(short, long)]
    pub username: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ExamsArgs {
    #[command(flatten)]
    pub portal: PortalArgs,

    /// Also download and extract every published result
    #[arg(long)]
    pub results: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ResultArgs {
    #[command(flatten)]
    pub portal: PortalArgs,

    /// Result document URL
    #[arg(value_name = "URL")]
    pub url: String,
}
