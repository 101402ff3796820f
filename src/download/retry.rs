//! Bounded retry for transient download failures.
//!
//! Every failure kind (network error, timeout, error status, filesystem
//! error) is retried the same way: up to a fixed attempt count with a fixed
//! delay between attempts. An item that still fails after the last attempt
//! is reported to the caller, which leaves no history entry so a future run
//! picks it up again.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::client::HttpClient;
use super::error::FetchError;

/// Default maximum fetch attempts per item (including the initial attempt).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay between fetch attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Configuration for retry behavior: attempt bound and fixed inter-attempt delay.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay slept between consecutive attempts.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    ///
    /// `max_attempts` is clamped to at least 1 (the initial attempt always runs).
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Fetcher combining the streaming HTTP client with a bounded retry policy.
///
/// One fetcher is created per run and reused for every item, so all
/// downloads share the client's connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: HttpClient,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher from a client and retry policy.
    #[must_use]
    pub fn new(client: HttpClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Downloads `url` to `destination`, retrying on any failure.
    ///
    /// Sleeps the policy delay between attempts. Returns the last error once
    /// attempts are exhausted.
    ///
    /// # Errors
    ///
    /// Returns the final [`FetchError`] after `max_attempts` failed attempts.
    #[instrument(skip(self), fields(url = %url, max_attempts = self.policy.max_attempts))]
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        let mut attempt = 1;
        loop {
            match self.client.download_to_path(url, destination).await {
                Ok(bytes) => {
                    debug!(attempt, bytes, "fetch succeeded");
                    return Ok(());
                }
                Err(error) if attempt < self.policy.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = self.policy.delay.as_millis(),
                        %error,
                        "fetch attempt failed, will retry"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!(attempt, %error, "fetch failed, attempts exhausted");
                    return Err(error);
                }
            }
        }
    }
}
