//! HTTP download engine for streaming files to disk.
//!
//! This module provides functionality for downloading files from HTTP/HTTPS
//! URLs with streaming support to handle large files efficiently.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Bounded retry with a fixed inter-attempt delay
//! - Filenames derived from record titles
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use arxiv_harvest::download::{Fetcher, HttpClient, RetryPolicy};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(HttpClient::new(), RetryPolicy::default());
//! fetcher
//!     .fetch("https://arxiv.org/pdf/2301.01234.pdf", Path::new("./paper.pdf"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod filename;
mod retry;

pub use client::{CONNECT_TIMEOUT_SECS, HttpClient, READ_TIMEOUT_SECS};
pub use error::FetchError;
pub use filename::{pdf_filename, sanitize_title};
pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, Fetcher, RetryPolicy};
