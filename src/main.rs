//! gempawatch - Latest Indonesian earthquake information from BMKG.
//!
//! Fetches the most recent BMKG earthquake report and presents it in the
//! terminal or on a web page with a Leaflet map, a current-report card,
//! preparedness guidance and an emergency request form.

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

mod card;
mod cli;
mod client;
mod emergency;
mod errors;
mod html;
mod map;
mod mitigation;
mod models;
mod output;
mod refresher;
mod server;

use cli::{Cli, Command};
use client::BmkgClient;
use models::EarthquakeReport;
use refresher::{RefreshConfig, TracingDiagnostics, fetch_latest_report};

/// Minimum poll interval accepted from the command line.
const MIN_POLL_INTERVAL_SECS: u64 = 30;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let client =
        BmkgClient::with_base_url(&cli.base_url).context("failed to create BMKG client")?;

    match cli.command {
        Command::Latest(args) => cmd_latest(&client, args),
        Command::List(args) => cmd_list(&client, args),
        Command::Watch(args) => cmd_watch(&client, args),
        Command::Ui(args) => cmd_ui(client, args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Clamp a requested poll interval to the minimum.
fn clamp_poll_interval(requested: u64) -> u64 {
    let interval = requested.max(MIN_POLL_INTERVAL_SECS);
    if interval != requested {
        tracing::warn!(
            "poll interval clamped to minimum of {} seconds",
            MIN_POLL_INTERVAL_SECS
        );
    }
    interval
}

/// Execute the `latest` command - one-shot fetch of the latest report.
fn cmd_latest(client: &BmkgClient, args: cli::LatestArgs) -> Result<()> {
    let report = client
        .fetch_latest_report()
        .context("failed to fetch latest earthquake")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_reports(&mut handle, &[report], args.format)?;

    Ok(())
}

/// Execute the `list` command - recent reports from a listing feed.
fn cmd_list(client: &BmkgClient, args: cli::ListArgs) -> Result<()> {
    let mut reports = client
        .fetch_feed(args.feed)
        .context("failed to fetch earthquake feed")?;

    if let Some(min) = args.min_magnitude {
        reports.retain(|r| r.magnitude >= min);
    }
    reports.truncate(args.limit);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_reports(&mut handle, &reports, args.format)?;

    Ok(())
}

/// Execute the `watch` command - periodic refresh in the terminal.
///
/// Runs until interrupted. A report is only printed when it differs from the
/// last one shown.
fn cmd_watch(client: &BmkgClient, args: cli::WatchArgs) -> Result<()> {
    let poll_interval = clamp_poll_interval(args.poll_interval);

    tracing::info!("watching BMKG latest earthquake (poll every {}s)", poll_interval);

    {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "\x1b[1m🌏 gempawatch\x1b[0m")?;
        writeln!(
            handle,
            "\x1b[2mSource: {} | Poll: {}s | Press Ctrl+C to stop\x1b[0m",
            client.base_url(),
            poll_interval
        )?;
        writeln!(handle, "\x1b[2m─────────────────────────────────────────────────────────────────────\x1b[0m")?;
    }

    let mut last_shown: Option<EarthquakeReport> = None;
    let mut poll_count = 0u64;

    loop {
        poll_count += 1;

        let report = fetch_latest_report(client, &TracingDiagnostics);
        if let Some(report) = take_if_new(&mut last_shown, report) {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if let Err(e) = output::write_reports(&mut handle, std::slice::from_ref(report), args.format) {
                tracing::warn!("failed to write report: {}", e);
            }
            let _ = handle.flush();
        } else {
            tracing::debug!("poll #{}: no new report", poll_count);
        }

        std::thread::sleep(Duration::from_secs(poll_interval));
    }
}

/// Remember `report` if it differs from the last one shown and return it.
///
/// Only the most recent report is kept.
fn take_if_new(
    last_shown: &mut Option<EarthquakeReport>,
    report: Option<EarthquakeReport>,
) -> Option<&EarthquakeReport> {
    let report = report?;
    if last_shown.as_ref() == Some(&report) {
        return None;
    }
    *last_shown = Some(report);
    last_shown.as_ref()
}

/// Execute the `ui` command - start web server.
fn cmd_ui(client: BmkgClient, args: cli::UiArgs) -> Result<()> {
    let poll_interval = clamp_poll_interval(args.poll_interval);
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        refresh: RefreshConfig {
            interval: Duration::from_secs(poll_interval),
            base_url: client.base_url().to_string(),
        },
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌏 gempawatch Web UI\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Source:  {}", client.base_url());
    println!("  Refresh: {poll_interval}s");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config, client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_poll_interval() {
        assert_eq!(clamp_poll_interval(5), 30);
        assert_eq!(clamp_poll_interval(300), 300);
    }

    #[test]
    fn test_watch_shows_each_report_once() {
        let mut last_shown = None;
        let first = map::tests::sample_report(5.5);
        let second = map::tests::sample_report(6.1);

        assert_eq!(take_if_new(&mut last_shown, Some(first.clone())), Some(&first));
        assert_eq!(take_if_new(&mut last_shown, Some(first.clone())), None);
        assert_eq!(take_if_new(&mut last_shown, None), None);
        assert_eq!(last_shown.as_ref(), Some(&first));

        assert_eq!(take_if_new(&mut last_shown, Some(second.clone())), Some(&second));
        assert_eq!(last_shown.as_ref(), Some(&second));
    }
}
