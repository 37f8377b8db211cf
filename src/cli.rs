//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Parser, Subcommand};

use crate::client::{BMKG_BASE_URL, FeedType};
use crate::output::Format;

/// Latest Indonesian earthquake information from BMKG.
#[derive(Parser, Debug)]
#[command(name = "gempawatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// BMKG TEWS base URL
    #[arg(long, global = true, default_value = BMKG_BASE_URL)]
    pub base_url: String,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the latest earthquake (one-shot fetch and exit)
    Latest(LatestArgs),

    /// List recent earthquakes from a BMKG feed
    List(ListArgs),

    /// Refresh the latest earthquake in the terminal
    Watch(WatchArgs),

    /// Start the web UI server
    Ui(UiArgs),
}

/// Arguments for the `latest` command.
#[derive(Parser, Debug)]
pub struct LatestArgs {
    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Feed to fetch: autogempa, terkini, dirasakan
    #[arg(long, default_value = "terkini", value_parser = parse_feed_type)]
    pub feed: FeedType,

    /// Minimum magnitude to show
    #[arg(long)]
    pub min_magnitude: Option<f64>,

    /// Maximum number of reports to show
    #[arg(long, short = 'n', default_value = "15")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `watch` command.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Poll interval in seconds (minimum 30)
    #[arg(long, default_value = "300")]
    pub poll_interval: u64,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `ui` command.
#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Refresh interval in seconds (minimum 30)
    #[arg(long, default_value = "300")]
    pub poll_interval: u64,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Parse a feed type from string.
fn parse_feed_type(s: &str) -> Result<FeedType, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}
