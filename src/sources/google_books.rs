//! Google Books volumes API, used for cover thumbnails.

use serde::Deserialize;
use std::sync::Arc;

use crate::sources::SourceError;
use crate::utils::HttpClient;

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
}

/// Google Books metadata lookup
#[derive(Debug, Clone)]
pub struct GoogleBooksSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl GoogleBooksSource {
    pub fn new(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Thumbnail of the first volume matching `title`
    pub async fn thumbnail_url(&self, title: &str) -> Result<Option<String>, SourceError> {
        let url = format!(
            "{}/books/v1/volumes?q={}",
            self.base_url,
            urlencoding::encode(title)
        );
        let body = self
            .client
            .get_text(&url, self.client.search_timeout())
            .await?;
        Self::first_thumbnail(&body)
    }

    fn first_thumbnail(body: &str) -> Result<Option<String>, SourceError> {
        let parsed: VolumesResponse = serde_json::from_str(body)?;
        Ok(parsed
            .items
            .into_iter()
            .next()
            .and_then(|v| v.volume_info)
            .and_then(|info| info.image_links)
            .and_then(|links| links.thumbnail))
    }
}
