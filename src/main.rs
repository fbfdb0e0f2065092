use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use trackfeed::catalog::{fetch_tracks, StopReason};
use trackfeed::config::Config;
use trackfeed::feed::write_feed;

const DEFAULT_CONFIG_PATH: &str = "trackfeed.toml";

#[derive(Parser, Debug)]
#[command(
    name = "trackfeed",
    version,
    about = "Render the music catalog as an RSS feed for email campaigns"
)]
struct Args {
    /// Config file (missing file = built-in defaults)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write the feed here instead of the configured output path
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Stop after this many catalog pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            output: None,
            max_pages: None,
        }
    }
}

/// Parses the command line without ever exiting the process.
///
/// Returns `None` after printing `--help` or `--version`. Unusable arguments
/// are logged and replaced by the defaults.
fn parse_args<I, T>(argv: I) -> Option<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Args::try_parse_from(argv) {
        Ok(args) => Some(args),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            None
        }
        Err(e) => {
            tracing::error!(
                kind = %e.kind(),
                error = %e.to_string().trim_end(),
                "Invalid command-line arguments, using defaults"
            );
            Some(Args::default())
        }
    }
}

/// Loads config, falling back to defaults when the file is unusable.
fn load_config(args: &Args) -> Config {
    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(
                path = %args.config.display(),
                error = %e,
                "Failed to load config, using defaults"
            );
            Config::default()
        }
    };

    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
    if args.max_pages.is_some() {
        config.max_pages = args.max_pages;
    }
    config
}

async fn run(config: Config) -> Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("trackfeed/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let outcome = fetch_tracks(&client, &config.fetch_options()).await;

    match &outcome.stop {
        StopReason::Failed(e) => tracing::warn!(
            error = %e,
            tracks = outcome.tracks.len(),
            "Catalog fetch ended early, writing partial feed"
        ),
        stop => tracing::info!(
            reason = ?stop,
            pages = outcome.pages_fetched,
            tracks = outcome.tracks.len(),
            skipped = outcome.skipped,
            "Catalog fetch complete"
        ),
    }

    write_feed(&outcome.tracks, &config.channel(), &config.output_path).with_context(|| {
        format!(
            "Failed to write feed to '{}'",
            config.output_path.display()
        )
    })?;

    tracing::info!(
        path = %config.output_path.display(),
        items = outcome.tracks.len(),
        "Feed written"
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(args) = parse_args(std::env::args_os()) else {
        return;
    };
    let config = load_config(&args);

    // Every failure is logged and swallowed; the process always exits 0
    if let Err(e) = run(config).await {
        tracing::error!(error = %format!("{e:#}"), "Feed generation failed");
    }
}
