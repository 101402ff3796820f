//! HTTP client wrapper for downloading files.
//!
//! This module provides the `HttpClient` struct which handles streaming
//! downloads with proper timeout configuration and error handling.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::FetchError;
use crate::user_agent;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// HTTP client for downloading files with streaming support.
///
/// Designed to be created once and reused for multiple downloads, taking
/// advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use arxiv_harvest::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// client
///     .download_to_path("https://arxiv.org/pdf/2301.01234.pdf", Path::new("./paper.pdf"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Downloads a file from `url` to the exact `destination` path.
    ///
    /// The body is streamed to disk chunk by chunk; a file already present
    /// at `destination` is overwritten. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    #[instrument(skip(self), fields(url = %url))]
    pub async fn download_to_path(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<u64, FetchError> {
        debug!("starting download");

        Url::parse(url).map_err(|_| FetchError::invalid_url(url.to_string()))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::http_status(url, response.status().as_u16()));
        }

        if destination.exists() {
            warn!(path = %destination.display(), "overwriting existing file");
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| FetchError::io(destination.to_path_buf(), e))?;

        let stream_result = stream_to_file(&mut file, response, url, destination).await;

        if stream_result.is_err() {
            // Don't leave incomplete data behind for a failed attempt.
            debug!(path = %destination.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(destination).await;
        }

        let bytes_written = stream_result?;

        debug!(
            path = %destination.display(),
            bytes = bytes_written,
            "download complete"
        );

        Ok(bytes_written)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Streams response body to file, returning bytes written.
///
/// Extracted to enable cleanup on error in the caller.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    destination: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(destination.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(destination.to_path_buf(), e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_success_writes_body() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/test.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PDF content here"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/test.pdf", mock_server.uri());
        let dest = temp_dir.path().join("test.pdf");

        let result = client.download_to_path(&url, &dest).await;

        assert!(result.is_ok(), "Expected Ok, got: {:?}", result);
        assert_eq!(result.unwrap(), 16);
        assert_eq!(std::fs::read(&dest).unwrap(), b"PDF content here");
    }

    #[tokio::test]
    async fn test_download_overwrites_existing_file() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/paper.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new content"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/paper.pdf", mock_server.uri());
        let dest = temp_dir.path().join("paper.pdf");
        std::fs::write(&dest, b"old content").unwrap();

        client.download_to_path(&url, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new content");
    }

    #[tokio::test]
    async fn test_download_404_returns_http_status_error() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/missing.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/missing.pdf", mock_server.uri());
        let dest = temp_dir.path().join("missing.pdf");

        let result = client.download_to_path(&url, &dest).await;

        match result {
            Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {:?}", other),
        }
        assert!(!dest.exists(), "No file should be created on HTTP error");
    }

    #[tokio::test]
    async fn test_download_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let client = HttpClient::new();

        let result = client
            .download_to_path("not-a-valid-url", &temp_dir.path().join("x.pdf"))
            .await;

        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_download_large_file_streams() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        // 1MB body to verify streaming works end to end
        let large_content = vec![0u8; 1024 * 1024];

        Mock::given(method("GET"))
            .and(path("/large.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(large_content.clone()))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/large.pdf", mock_server.uri());
        let dest = temp_dir.path().join("large.pdf");

        let bytes = client.download_to_path(&url, &dest).await.unwrap();

        assert_eq!(bytes, 1024 * 1024);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 1024 * 1024);
    }

    #[tokio::test]
    async fn test_download_cleanup_on_read_timeout() {
        // Partial file must be removed when the stream fails (e.g. read timeout)
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"data")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::new_with_timeouts(30, 1);
        let url = format!("{}/slow.pdf", mock_server.uri());
        let dest = temp_dir.path().join("slow.pdf");

        let result = client.download_to_path(&url, &dest).await;
        assert!(result.is_err(), "expected timeout or network error");
        assert!(
            !dest.exists(),
            "Partial file must be cleaned up after stream error"
        );
    }
}
