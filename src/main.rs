//! CLI entry point for the arxiv-harvest tool.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use arxiv_harvest::download::{Fetcher, HttpClient, RetryPolicy};
use arxiv_harvest::harvest::Harvester;
use arxiv_harvest::history::History;
use arxiv_harvest::search::ArxivClient;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
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

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    // The download directory is an unrecoverable precondition: create it
    // up front and abort the run if that fails.
    std::fs::create_dir_all(&args.dir)
        .with_context(|| format!("failed to create download directory {}", args.dir.display()))?;
    let dir = args
        .dir
        .canonicalize()
        .with_context(|| format!("failed to resolve download directory {}", args.dir.display()))?;

    let history_path = args.history_path();
    let mut history = History::load(&history_path);
    debug!(
        path = %history_path.display(),
        entries = history.len(arxiv_harvest::search::SOURCE_KEY),
        "history loaded"
    );

    info!(query = %args.query, max = args.max, dir = %dir.display(), "searching arXiv");

    let harvester = Harvester::new(
        ArxivClient::new(args.api_endpoint.clone()),
        Fetcher::new(
            HttpClient::new(),
            RetryPolicy::new(args.max_retries, Duration::from_millis(args.retry_delay)),
        ),
        Duration::from_millis(args.page_delay),
    );

    let stats = harvester
        .run(&args.query, args.max, &dir, &mut history, &history_path)
        .await?;

    info!(
        downloaded = stats.downloaded(),
        skipped = stats.skipped(),
        dir = %dir.display(),
        "run complete"
    );

    Ok(())
}
