//! arXiv search API client (Atom feed).
//!
//! arXiv exposes an Atom API at `https://export.arxiv.org/api/query` that
//! accepts a query string plus an offset/count pair. This module issues one
//! such request per call and parses the feed into transient result items;
//! pagination policy lives in the harvest driver, not here.
//!
//! Parsing is deliberately minimal and resilient: a malformed feed stops the
//! parse at the error and returns the entries collected so far.

use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::user_agent;

/// Key under which arXiv records are stored in the history file.
pub const SOURCE_KEY: &str = "arxiv";

/// Public arXiv API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://export.arxiv.org/api/query";

/// Connect/read timeout for search requests (feeds are small).
const SEARCH_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while querying the search API.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network-level failure issuing the search request.
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("search query failed: HTTP {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },
}

/// Query formulation sent to the search API.
///
/// The driver tries [`QueryForm::ExactPhrase`] first and falls back to
/// [`QueryForm::TitleAbstract`] when a page comes back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryForm {
    /// Exact-phrase match across all fields: `all:"<query>"`.
    ExactPhrase,
    /// Field-scoped OR over title and abstract: `ti:"<query>" OR abs:"<query>"`.
    TitleAbstract,
}

impl QueryForm {
    /// Renders the formulation into arXiv query syntax.
    ///
    /// Double quotes in the input would break the phrase syntax and are
    /// stripped.
    #[must_use]
    pub fn render(self, query: &str) -> String {
        let q = query.trim().replace('"', "");
        match self {
            Self::ExactPhrase => format!("all:\"{q}\""),
            Self::TitleAbstract => format!("ti:\"{q}\" OR abs:\"{q}\""),
        }
    }
}

/// One search result, alive for a single loop iteration.
#[derive(Debug, Clone, Serialize)]
pub struct SearchItem {
    /// arXiv identifier (e.g. `2301.01234v2`).
    pub id: String,
    /// Paper title (whitespace-normalized).
    pub title: String,
    /// Abstract excerpt (whitespace-normalized).
    pub summary: String,
    /// Direct PDF URL.
    pub pdf_url: String,
}

/// Client for the arXiv search API.
///
/// Holds a pooled HTTP client and the endpoint to query; the endpoint is
/// overridable for tests and mirrors.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ArxivClient {
    /// Creates a client against the given endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(endpoint: Url) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, endpoint }
    }

    /// Returns the endpoint this client queries.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Issues one search request and parses the resulting feed.
    ///
    /// Results are sorted newest-first (`sortBy=submittedDate` descending)
    /// so pagination over a stable corpus is deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on network failure or a non-success status.
    #[instrument(skip_all, fields(query = %query, offset, batch))]
    pub async fn search(
        &self,
        form: QueryForm,
        query: &str,
        offset: usize,
        batch: usize,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("search_query", &form.render(query))
            .append_pair("start", &offset.to_string())
            .append_pair("max_results", &batch.to_string())
            .append_pair("sortBy", "submittedDate")
            .append_pair("sortOrder", "descending");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let items = parse_atom(&body);
        debug!(results = items.len(), "search page parsed");
        Ok(items)
    }
}

impl Default for ArxivClient {
    /// Creates a client against the public arXiv endpoint.
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"))
    }
}

/// Canonical PDF URL for an arXiv identifier.
#[must_use]
pub fn canonical_pdf_url(id: &str) -> String {
    format!("https://arxiv.org/pdf/{}.pdf", id.trim())
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts the arXiv identifier from an `<id>` entry URL.
///
/// Examples:
/// - `http://arxiv.org/abs/2301.01234v1` → `2301.01234v1`
/// - `http://arxiv.org/abs/cs/9901001v1` → `cs/9901001v1`
fn arxiv_id_from_url(url: &str) -> Option<String> {
    let u = url.trim();
    let i = u.find("/abs/")?;
    let tail = u[i + "/abs/".len()..].trim_matches('/').trim();
    (!tail.is_empty()).then(|| tail.to_string())
}

/// Parses an arXiv Atom feed into result items.
///
/// We use quick-xml because Atom namespaces make regex parsing brittle.
/// Tag names are matched by suffix so namespace prefixes don't matter.
fn parse_atom(body: &str) -> Vec<SearchItem> {
    let mut items = Vec::new();

    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    #[derive(Default)]
    struct Entry {
        id_url: String,
        title: String,
        summary: String,
        pdf_url: Option<String>,
        in_entry: bool,
        cur_text: String,
    }

    let mut cur = Entry::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name.ends_with("entry") {
                    cur = Entry::default();
                    cur.in_entry = true;
                }
                if cur.in_entry && name.ends_with("link") {
                    if let Some(href) = pdf_link_href(&e) {
                        cur.pdf_url = Some(href);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if cur.in_entry && name.ends_with("link") {
                    if let Some(href) = pdf_link_href(&e) {
                        cur.pdf_url = Some(href);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if cur.in_entry {
                    let txt = t.unescape().map(|t| t.to_string()).unwrap_or_default();
                    cur.cur_text.push_str(&txt);
                    cur.cur_text.push(' ');
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if cur.in_entry {
                    let txt = normalize_ws(&cur.cur_text);
                    if name.ends_with("id") {
                        cur.id_url = txt;
                    } else if name.ends_with("title") {
                        cur.title = txt;
                    } else if name.ends_with("summary") {
                        cur.summary = txt;
                    }
                    cur.cur_text.clear();

                    if name.ends_with("entry") {
                        cur.in_entry = false;
                        match arxiv_id_from_url(&cur.id_url) {
                            Some(id) => {
                                let pdf_url = cur
                                    .pdf_url
                                    .take()
                                    .unwrap_or_else(|| canonical_pdf_url(&id));
                                items.push(SearchItem {
                                    id,
                                    title: std::mem::take(&mut cur.title),
                                    summary: std::mem::take(&mut cur.summary),
                                    pdf_url,
                                });
                            }
                            None => {
                                warn!(id_url = %cur.id_url, "dropping entry without an arXiv id");
                            }
                        }
                    }
                }
            }
            Err(error) => {
                warn!(%error, parsed = items.len(), "feed parse failed, keeping entries so far");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    items
}

/// Extracts the href of a `rel="related" type="application/pdf"` link.
fn pdf_link_href(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    let mut rel = None;
    let mut ty = None;
    let mut href = None;
    for a in e.attributes().flatten() {
        let k = String::from_utf8_lossy(a.key.as_ref()).to_string();
        let v = a.unescape_value().map(|v| v.to_string()).unwrap_or_default();
        match k.as_str() {
            "rel" => rel = Some(v),
            "type" => ty = Some(v),
            "href" => href = Some(v),
            _ => {}
        }
    }
    if rel.as_deref() == Some("related") && ty.as_deref() == Some("application/pdf") {
        href
    } else {
        None
    }
}
