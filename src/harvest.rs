//! Paginated harvest loop: search, dedup, fetch, record.
//!
//! The driver keeps issuing search queries until either the requested count
//! of *new* (non-duplicate) items has been downloaded or the upstream source
//! is exhausted. Each iteration requests a batch sized as the original
//! target plus the cumulative skipped count, compensating for duplicates
//! that consume quota without producing new downloads. The overshoot is a
//! heuristic, not an exact guarantee.
//!
//! Fully sequential: one search request and at most one download in flight
//! at any time.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use arxiv_harvest::download::{Fetcher, HttpClient, RetryPolicy};
//! use arxiv_harvest::harvest::Harvester;
//! use arxiv_harvest::history::History;
//! use arxiv_harvest::search::ArxivClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let harvester = Harvester::new(
//!     ArxivClient::default(),
//!     Fetcher::new(HttpClient::new(), RetryPolicy::default()),
//!     Duration::from_secs(3),
//! );
//! let mut history = History::load(Path::new("./downloads/history.json"));
//! let stats = harvester
//!     .run(
//!         "machine unlearning",
//!         10,
//!         Path::new("./downloads"),
//!         &mut history,
//!         Path::new("./downloads/history.json"),
//!     )
//!     .await?;
//! println!("downloaded {}, skipped {}", stats.downloaded(), stats.skipped());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::download::{Fetcher, pdf_filename};
use crate::history::{History, HistoryError};
use crate::search::{ArxivClient, QueryForm, SOURCE_KEY, SearchError};

/// Upper bound on pagination iterations per run.
///
/// The overshoot heuristic alone does not guarantee termination against a
/// source that keeps returning already-downloaded items; this cap bounds
/// such runs. Any source that exhausts or satisfies the target within the
/// cap behaves identically with or without it.
pub const MAX_PAGES: usize = 50;

/// Errors that end a harvest run early.
///
/// Fetch failures are not in here: a failed item is logged and dropped from
/// the run so a future run can retry it.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The search API could not be queried.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// The history file could not be written after a successful download.
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Counters accumulated across pagination iterations of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    downloaded: usize,
    skipped: usize,
}

impl RunStats {
    /// Returns the number of newly downloaded items.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded
    }

    /// Returns the number of items skipped as already-downloaded duplicates.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Paginated search driver wiring the search client, fetcher, and history.
#[derive(Debug, Clone)]
pub struct Harvester {
    search: ArxivClient,
    fetcher: Fetcher,
    page_delay: Duration,
}

impl Harvester {
    /// Creates a driver.
    ///
    /// `page_delay` is the fixed pause between network-bearing pagination
    /// iterations (upstream rate-limit etiquette).
    #[must_use]
    pub fn new(search: ArxivClient, fetcher: Fetcher, page_delay: Duration) -> Self {
        Self {
            search,
            fetcher,
            page_delay,
        }
    }

    /// Runs the harvest loop until `target` new items are downloaded or the
    /// source is exhausted.
    ///
    /// `history` is consulted before every fetch and written through to
    /// `history_path` after every successful one, so history on disk is
    /// durable as of the last completed item even under abrupt termination.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] when a search request fails or the history
    /// file cannot be written. Individual fetch failures are logged and do
    /// not end the run.
    #[instrument(skip_all, fields(query = %query, max = target))]
    pub async fn run(
        &self,
        query: &str,
        target: usize,
        dir: &Path,
        history: &mut History,
        history_path: &Path,
    ) -> Result<RunStats, HarvestError> {
        let mut stats = RunStats::default();
        let mut offset = 0usize;
        let mut pages = 0usize;

        while stats.downloaded < target {
            if pages > 0 {
                debug!(delay_ms = self.page_delay.as_millis(), "pausing between pages");
                tokio::time::sleep(self.page_delay).await;
            }

            // Overshoot: duplicates consumed quota on earlier pages, so ask
            // for that many extra candidates this time.
            let batch = target + stats.skipped;

            let mut items = self
                .search
                .search(QueryForm::ExactPhrase, query, offset, batch)
                .await?;
            if items.is_empty() {
                debug!(offset, "primary formulation empty, trying title/abstract");
                items = self
                    .search
                    .search(QueryForm::TitleAbstract, query, offset, batch)
                    .await?;
            }
            if items.is_empty() {
                info!(offset, "source exhausted");
                break;
            }

            for item in items {
                if stats.downloaded >= target {
                    break;
                }

                if history.contains(SOURCE_KEY, &item.id) {
                    debug!(id = %item.id, "already downloaded, skipping");
                    stats.skipped += 1;
                    continue;
                }

                info!(id = %item.id, title = %item.title, "found");
                let destination = dir.join(pdf_filename(&item.title, &item.id));
                match self.fetcher.fetch(&item.pdf_url, &destination).await {
                    Ok(()) => {
                        history.record(SOURCE_KEY, &item.id, &item.title);
                        history.save(history_path)?;
                        stats.downloaded += 1;
                        info!(
                            id = %item.id,
                            path = %destination.display(),
                            downloaded = stats.downloaded,
                            "downloaded"
                        );
                    }
                    Err(error) => {
                        // Not a skip: the item stays out of history so a
                        // future run retries it.
                        warn!(id = %item.id, %error, "fetch failed, dropping item for this run");
                    }
                }
            }

            pages += 1;
            if pages >= MAX_PAGES {
                warn!(pages, "page cap reached, ending run");
                break;
            }
            offset += batch;
        }

        info!(
            downloaded = stats.downloaded,
            skipped = stats.skipped,
            "harvest complete"
        );
        Ok(stats)
    }
}
