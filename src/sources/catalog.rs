//! Institutional library catalog (Koha OPAC) lookup for past papers.

use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;

use crate::sources::{absolute_url, ResolvedPdf, SourceError, StageOutcome};
use crate::utils::{plus_encode, HttpClient};

/// Koha OPAC search for downloadable past papers
#[derive(Debug, Clone)]
pub struct CatalogSource {
    client: Arc<HttpClient>,
    base_url: String,
    search_timeout: Duration,
}

impl CatalogSource {
    pub fn new(
        client: Arc<HttpClient>,
        base_url: impl Into<String>,
        search_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            search_timeout,
        }
    }

    /// Name reported as the `source` of catalog downloads
    pub fn name(&self) -> &str {
        "MZUNI Library"
    }

    /// OPAC search URL for a query
    pub fn search_url(base_url: &str, query: &str) -> String {
        format!(
            "{}/cgi-bin/koha/opac-search.pl?q={}",
            base_url.trim_end_matches('/'),
            plus_encode(query)
        )
    }

    /// Links on a results page that look like downloads, made absolute
    fn parse_download_links(html: &str, page_url: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| {
                let lower = href.to_lowercase();
                lower.ends_with(".pdf") || lower.contains("download")
            })
            .filter_map(|href| absolute_url(page_url, href))
            .collect()
    }

    async fn first_download_link(&self, query: &str) -> Result<Option<ResolvedPdf>, SourceError> {
        let url = Self::search_url(&self.base_url, query);
        let html = self.client.get_text(&url, self.search_timeout).await?;

        let links = Self::parse_download_links(&html, &url);
        tracing::debug!(source = "catalog", query, links = links.len(), "catalog links");

        Ok(links
            .into_iter()
            .next()
            .map(|link| ResolvedPdf::new(link, query)))
    }

    /// Search the catalog and report the first downloadable link
    pub async fn find_download_link(&self, query: &str) -> StageOutcome {
        self.first_download_link(query).await.into()
    }
}
