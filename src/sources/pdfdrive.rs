//! PDFDrive source implementation.
//!
//! PDFDrive has no API. The search page lists results as `a.ai-search`
//! anchors; the linked book page embeds the PDF location in a
//! `data-preview` attribute.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;

use crate::sources::{absolute_url, ResolvedPdf, Source, SourceError};
use crate::utils::{plus_encode, HttpClient};

static PREVIEW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-preview="(.+?\.pdf)""#).expect("valid preview regex"));

/// A search hit on the PDFDrive results page
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchHit {
    book_url: String,
    title: Option<String>,
}

/// PDFDrive search source
#[derive(Debug, Clone)]
pub struct PdfDriveSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl PdfDriveSource {
    pub fn new(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Search page URL for a title, also offered to users as a manual alternative
    pub fn search_page(base_url: &str, title: &str) -> String {
        format!(
            "{}/search?q={}",
            base_url.trim_end_matches('/'),
            plus_encode(title)
        )
    }

    /// First result anchor on a search page
    fn parse_first_hit(&self, html: &str) -> Option<SearchHit> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("a.ai-search").ok()?;
        let anchor = document.select(&selector).next()?;

        let href = anchor.value().attr("href")?;
        let book_url = absolute_url(&self.base_url, href)?;
        let title = anchor
            .value()
            .attr("title")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Some(SearchHit { book_url, title })
    }

    /// PDF location embedded in a book page
    fn parse_preview(&self, html: &str, book_url: &str) -> Option<String> {
        let captures = PREVIEW_RE.captures(html)?;
        absolute_url(book_url, captures.get(1)?.as_str())
    }
}

#[async_trait]
impl Source for PdfDriveSource {
    fn id(&self) -> &str {
        "pdfdrive"
    }

    fn name(&self) -> &str {
        "PDFDrive"
    }

    async fn find_pdf(&self, title: &str) -> Result<Option<ResolvedPdf>, SourceError> {
        let search_url = Self::search_page(&self.base_url, title);
        let search_html = self
            .client
            .get_text(&search_url, self.client.search_timeout())
            .await?;

        let Some(hit) = self.parse_first_hit(&search_html) else {
            tracing::debug!(source = "pdfdrive", title, "no search results");
            return Ok(None);
        };

        let book_html = self
            .client
            .get_text(&hit.book_url, self.client.search_timeout())
            .await?;

        let Some(pdf_url) = self.parse_preview(&book_html, &hit.book_url) else {
            tracing::debug!(
                source = "pdfdrive",
                book_url = %hit.book_url,
                "book page has no preview link"
            );
            return Ok(None);
        };

        let title = hit.title.unwrap_or_else(|| title.to_string());
        Ok(Some(ResolvedPdf::new(pdf_url, title)))
    }
}
