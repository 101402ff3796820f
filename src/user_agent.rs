//! Shared User-Agent string for API and download HTTP traffic.
//!
//! Single source for project URL and UA format so search and download
//! requests stay consistent and easy to update (good citizenship; RFC 9308).

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/arxiv-harvest";

/// Default User-Agent sent with every request (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("arxiv-harvest/{version} (academic-research-tool; +{PROJECT_UA_URL})")
}
