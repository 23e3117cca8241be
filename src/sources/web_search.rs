//! Generic web search source.
//!
//! Queries the DuckDuckGo HTML endpoint for `<title> filetype:pdf` and takes
//! the first of the top results that points at a PDF. Result anchors are
//! usually redirect links carrying the target in a `uddg` query parameter.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;

use crate::sources::{ResolvedPdf, Source, SourceError};
use crate::utils::{plus_encode, HttpClient};

/// Number of search results inspected
const MAX_RESULTS: usize = 5;

const REDIRECT_HOST: &str = "https://duckduckgo.com";

/// Web search source
#[derive(Debug, Clone)]
pub struct WebSearchSource {
    client: Arc<HttpClient>,
    search_url: String,
}

impl WebSearchSource {
    pub fn new(client: Arc<HttpClient>, search_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
        }
    }

    fn query_url(&self, title: &str) -> String {
        let query = format!("{} filetype:pdf", title);
        let separator = if self.search_url.contains('?') { '&' } else { '?' };
        format!("{}{}q={}", self.search_url, separator, plus_encode(&query))
    }

    /// Target URLs of the top result links, in page order
    fn parse_result_links(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let Ok(selector) = Selector::parse("a.result__a") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(decode_result_link)
            .take(MAX_RESULTS)
            .collect()
    }
}

/// Unwrap a result href into the URL it points at
fn decode_result_link(href: &str) -> Option<String> {
    let href = href.trim();
    let parsed = if href.starts_with("//") {
        url::Url::parse(&format!("https:{}", href)).ok()?
    } else if href.starts_with('/') {
        url::Url::parse(REDIRECT_HOST).ok()?.join(href).ok()?
    } else {
        url::Url::parse(href).ok()?
    };

    let target = parsed
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned());

    Some(target.unwrap_or_else(|| parsed.to_string()))
}

/// Whether a URL's path names a PDF file
fn is_pdf_link(link: &str) -> bool {
    url::Url::parse(link)
        .map(|u| u.path().to_lowercase().ends_with(".pdf"))
        .unwrap_or(false)
}

#[async_trait]
impl Source for WebSearchSource {
    fn id(&self) -> &str {
        "web"
    }

    fn name(&self) -> &str {
        "Web Search"
    }

    async fn find_pdf(&self, title: &str) -> Result<Option<ResolvedPdf>, SourceError> {
        let url = self.query_url(title);
        let html = self
            .client
            .get_text(&url, self.client.search_timeout())
            .await?;

        let links = Self::parse_result_links(&html);
        tracing::debug!(source = "web", title, results = links.len(), "web search results");

        Ok(links
            .into_iter()
            .find(|link| is_pdf_link(link))
            .map(|link| ResolvedPdf::new(link, title)))
    }
}
