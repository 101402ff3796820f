//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use arxiv_harvest::download::DEFAULT_MAX_ATTEMPTS;
use arxiv_harvest::search::DEFAULT_ENDPOINT;

/// Batch download arXiv PDFs matching a search query.
///
/// Searches the arXiv API for the query, downloads the matching PDFs to the
/// target directory, and skips anything already recorded in the history
/// file from prior runs.
#[derive(Parser, Debug)]
#[command(name = "arxiv-harvest")]
#[command(author, version, about)]
pub struct Args {
    /// Search query (e.g. 'machine unlearning')
    #[arg(long)]
    pub query: String,

    /// Target count of new downloads
    #[arg(long, default_value_t = 10)]
    pub max: usize,

    /// Download directory (created if absent)
    #[arg(long, default_value = "./downloads")]
    pub dir: PathBuf,

    /// History file location (defaults to <dir>/history.json)
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Fetch attempts per item (1-10)
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: u32,

    /// Delay between fetch attempts in milliseconds (max 60000)
    #[arg(long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub retry_delay: u64,

    /// Pause between result pages in milliseconds (max 60000)
    #[arg(long, default_value_t = 3000, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub page_delay: u64,

    /// Search API endpoint (override for mirrors or testing)
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub api_endpoint: Url,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Resolves the history file path: explicit flag, or `<dir>/history.json`.
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.history
            .clone()
            .unwrap_or_else(|| self.dir.join("history.json"))
    }
}
