//! Identifier classification.
//!
//! An identifier is whatever the caller typed: a direct link to a PDF, a
//! past-paper query such as `past paper BICT2303 2023`, or a book title.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Phrases that mark an identifier as an academic past-paper query
const PAST_PAPER_KEYWORDS: &[&str] = &["past paper", "exam paper"];

static COURSE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]{2,4}\s?\d{3})").expect("valid course code regex"));

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(20\d{2})").expect("valid year regex"));

static PDF_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.pdf$").expect("valid suffix regex"));

/// Resolution strategy selected for an identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Strategy {
    /// Fetch this URL as-is
    DirectUrl(String),
    /// Search the institutional catalog
    PastPaper(String),
    /// Run the source fallback chain for this title
    Book(String),
}

impl Strategy {
    /// Classify an identifier. Never fails.
    ///
    /// The input is trimmed first. Anything starting with `http` (any case) is
    /// a direct URL; anything mentioning a past-paper keyword is an academic
    /// search; everything else is a book title.
    pub fn classify(identifier: &str) -> Self {
        let identifier = identifier.trim();
        let lower = identifier.to_lowercase();

        if lower.starts_with("http") {
            Strategy::DirectUrl(identifier.to_string())
        } else if PAST_PAPER_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Strategy::PastPaper(identifier.to_string())
        } else {
            Strategy::Book(identifier.to_string())
        }
    }

    /// The trimmed identifier this strategy was built from
    pub fn identifier(&self) -> &str {
        match self {
            Strategy::DirectUrl(s) | Strategy::PastPaper(s) | Strategy::Book(s) => s,
        }
    }

    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::DirectUrl(_) => "direct_url",
            Strategy::PastPaper(_) => "past_paper",
            Strategy::Book(_) => "book",
        }
    }
}

/// First course-code-like token, e.g. `BICT230` from `BICT2303` or `CS 101`
pub fn extract_course_code(text: &str) -> Option<String> {
    COURSE_CODE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// First four-digit year starting with `20`
pub fn extract_year(text: &str) -> Option<String> {
    YEAR_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Drop a trailing `.pdf` (any case) and surrounding whitespace from a title
pub fn strip_pdf_suffix(title: &str) -> String {
    PDF_SUFFIX_RE.replace(title.trim(), "").trim().to_string()
}
