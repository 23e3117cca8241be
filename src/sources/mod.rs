//! PDF source plugins and the fallback chain.
//!
//! Every lookup strategy implements [`Source`]. A source takes a cleaned book
//! title and either finds a downloadable PDF link, finds nothing, or fails.
//! Sources never download the PDF themselves; the resolver does that once a
//! link has been found.
//!
//! The [`FallbackChain`] runs sources in a fixed order and stops at the first
//! one that finds a link. The default chain is:
//!
//! 1. [`PdfDriveSource`] - scrapes PDFDrive search and book pages
//! 2. [`ArchiveSource`] - Internet Archive advanced search JSON API
//! 3. [`WebSearchSource`] - HTML web search for `<title> filetype:pdf`
//!
//! Two further lookups sit outside the chain: [`CatalogSource`] (the
//! institutional library catalog used for past papers) and
//! [`GoogleBooksSource`] (cover thumbnails).

mod archive;
mod catalog;
mod chain;
mod google_books;
mod pdfdrive;
mod web_search;

pub mod mock;

pub use archive::ArchiveSource;
pub use catalog::CatalogSource;
pub use chain::{ChainHit, FallbackChain};
pub use google_books::GoogleBooksSource;
pub use mock::{CallLog, MockBehavior, MockSource};
pub use pdfdrive::PdfDriveSource;
pub use web_search::WebSearchSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A PDF link found by a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPdf {
    /// Absolute URL of the PDF
    pub url: String,

    /// Title used to name the downloaded file
    pub title: String,
}

impl ResolvedPdf {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Outcome of a single lookup stage
#[derive(Debug)]
pub enum StageOutcome {
    /// The stage found a PDF link
    Found(ResolvedPdf),
    /// The stage ran but had nothing to offer
    Empty,
    /// The stage failed; the chain moves on
    Failed(SourceError),
}

impl StageOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, StageOutcome::Found(_))
    }

    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            StageOutcome::Found(_) => "found",
            StageOutcome::Empty => "empty",
            StageOutcome::Failed(_) => "failed",
        }
    }
}

impl From<Result<Option<ResolvedPdf>, SourceError>> for StageOutcome {
    fn from(result: Result<Option<ResolvedPdf>, SourceError>) -> Self {
        match result {
            Ok(Some(pdf)) => StageOutcome::Found(pdf),
            Ok(None) => StageOutcome::Empty,
            Err(e) => StageOutcome::Failed(e),
        }
    }
}

/// The Source trait defines the interface for every lookup strategy in the chain.
///
/// # Implementing a New Source
///
/// 1. Create a struct holding an [`HttpClient`](crate::utils::HttpClient) and its base URL
/// 2. Implement `id`, `name` and `find_pdf`
/// 3. Register it with [`FallbackChain::register`] at the position it should run
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (used in logs, e.g. "pdfdrive")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Look for a downloadable PDF matching `title`
    async fn find_pdf(&self, title: &str) -> Result<Option<ResolvedPdf>, SourceError>;

    /// Run the lookup and fold its result into a [`StageOutcome`]
    async fn lookup(&self, title: &str) -> StageOutcome {
        self.find_pdf(title).await.into()
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// No response, or no body data, within the allowed time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Parsing error (JSON, HTML, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's Display drops the cause ("error decoding response body")
        let mut message = err.to_string();
        let mut cause = std::error::Error::source(&err);
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }

        if err.is_timeout() {
            SourceError::Timeout(message)
        } else {
            SourceError::Network(message)
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<image::ImageError> for SourceError {
    fn from(err: image::ImageError) -> Self {
        SourceError::Image(err.to_string())
    }
}

/// Resolve `href` against the page it was found on
pub(crate) fn absolute_url(page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    url::Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_outcome_from_result() {
        let found = StageOutcome::from(Ok::<_, SourceError>(Some(ResolvedPdf::new(
            "https://x/y.pdf",
            "y",
        ))));
        assert!(found.is_found());

        let empty = StageOutcome::from(Ok::<_, SourceError>(None));
        assert_eq!(empty.label(), "empty");

        let failed = StageOutcome::from(Err::<Option<ResolvedPdf>, _>(SourceError::Parse(
            "bad".to_string(),
        )));
        assert_eq!(failed.label(), "failed");
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://www.pdfdrive.com", "/dune-e1.html").as_deref(),
            Some("https://www.pdfdrive.com/dune-e1.html")
        );
        assert_eq!(
            absolute_url("https://opac.example.edu/cgi-bin/koha/opac-search.pl?q=x", "files/a.pdf")
                .as_deref(),
            Some("https://opac.example.edu/cgi-bin/koha/files/a.pdf")
        );
        assert_eq!(
            absolute_url("https://a.example", "https://b.example/x.pdf").as_deref(),
            Some("https://b.example/x.pdf")
        );
        assert_eq!(absolute_url("https://a.example", "  "), None);
    }

    #[test]
    fn test_status_error_message() {
        let err = SourceError::Status {
            status: 503,
            url: "https://archive.org/advancedsearch.php".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 503 from https://archive.org/advancedsearch.php"
        );
    }
}
