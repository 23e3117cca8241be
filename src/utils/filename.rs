//! File naming and query encoding helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid filename regex"));

/// Strip everything but word characters, whitespace and `-` from a title.
///
/// Falls back to `download` when nothing usable is left.
pub fn sanitize_title(title: &str) -> String {
    let cleaned = UNSAFE_CHARS_RE.replace_all(title, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned.to_string()
    }
}

/// File name for a book PDF
pub fn pdf_file_name(title: &str) -> String {
    format!("{}.pdf", sanitize_title(title))
}

/// File name for a book cover
pub fn cover_file_name(title: &str) -> String {
    format!("{}_cover.jpg", sanitize_title(title))
}

/// Last path segment of a URL, used as the file name for direct downloads
pub fn url_file_name(url: &str) -> String {
    url.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("download.pdf")
        .to_string()
}

/// Form-encode a query value (spaces become `+`)
pub fn plus_encode(query: &str) -> String {
    url::form_urlencoded::byte_serialize(query.as_bytes()).collect()
}
