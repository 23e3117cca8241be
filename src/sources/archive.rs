//! Internet Archive source implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::sources::{ResolvedPdf, Source, SourceError};
use crate::utils::{plus_encode, HttpClient};

#[derive(Debug, Deserialize)]
struct AdvancedSearchResponse {
    #[serde(default)]
    response: Option<ResponseBody>,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    identifier: Option<String>,
}

/// Internet Archive advanced-search source
///
/// Items are assumed to host a PDF named after their identifier at
/// `/download/{id}/{id}.pdf`.
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl ArchiveSource {
    pub fn new(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Human search page for a title, offered as a manual alternative
    pub fn search_page(base_url: &str, title: &str) -> String {
        format!(
            "{}/search.php?query={}",
            base_url.trim_end_matches('/'),
            plus_encode(title)
        )
    }

    fn api_url(&self, title: &str) -> String {
        format!(
            "{}/advancedsearch.php?q={}&fl[]=identifier&rows=50&output=json",
            self.base_url,
            plus_encode(&format!("title:({})", title))
        )
    }

    fn download_url(&self, identifier: &str) -> String {
        let id = urlencoding::encode(identifier);
        format!("{}/download/{}/{}.pdf", self.base_url, id, id)
    }

    /// First identifier in a search response
    fn first_identifier(body: &str) -> Result<Option<String>, SourceError> {
        let parsed: AdvancedSearchResponse = serde_json::from_str(body)?;
        Ok(parsed
            .response
            .into_iter()
            .flat_map(|r| r.docs)
            .filter_map(|d| d.identifier)
            .find(|id| !id.trim().is_empty()))
    }
}

#[async_trait]
impl Source for ArchiveSource {
    fn id(&self) -> &str {
        "archive"
    }

    fn name(&self) -> &str {
        "Internet Archive"
    }

    async fn find_pdf(&self, title: &str) -> Result<Option<ResolvedPdf>, SourceError> {
        let url = self.api_url(title);
        let body = self
            .client
            .get_text(&url, self.client.search_timeout())
            .await?;

        let Some(identifier) = Self::first_identifier(&body)? else {
            tracing::debug!(source = "archive", title, "no matching items");
            return Ok(None);
        };

        Ok(Some(ResolvedPdf::new(self.download_url(&identifier), title)))
    }
}
