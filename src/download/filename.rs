//! Filename derivation from record titles.
//!
//! Download filenames are built from the paper title, not from the URL or
//! response headers: the title is what the user searched by, and arXiv PDF
//! URLs carry only the numeric identifier.

/// Sanitizes a record title for use as a filename stem.
///
/// Keeps alphanumerics, spaces, underscores, and hyphens; every other
/// character is dropped. Leading/trailing whitespace is trimmed.
///
/// Two distinct titles can sanitize to the same string, in which case the
/// later download overwrites the earlier file (last writer wins).
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Builds the `<sanitized-title>.pdf` filename for a record.
///
/// An empty sanitized title (a title made entirely of stripped characters)
/// falls back to the record identifier so the file is still nameable.
#[must_use]
pub fn pdf_filename(title: &str, fallback_id: &str) -> String {
    let stem = sanitize_title(title);
    if stem.is_empty() {
        format!("{}.pdf", sanitize_title(fallback_id))
    } else {
        format!("{stem}.pdf")
    }
}
