//! HTTP client utilities.

use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Shared HTTP client with the configured user agent and timeouts
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    search_timeout: Duration,
    download_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &HttpConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.search_timeout())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            search_timeout: config.search_timeout(),
            download_timeout: config.download_timeout(),
        })
    }

    /// GET with the search/metadata timeout
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url).timeout(self.search_timeout)
    }

    /// GET with no overall deadline; the caller bounds each read
    pub fn get_streaming(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// GET with an explicit timeout covering the whole exchange
    pub fn get_with_timeout(&self, url: &str, timeout: Duration) -> RequestBuilder {
        self.client.get(url).timeout(timeout)
    }

    /// Timeout applied to search and metadata requests
    pub fn search_timeout(&self) -> Duration {
        self.search_timeout
    }

    /// Longest pause allowed between chunks of an artifact download
    pub fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    /// GET a page and return its body, failing on non-2xx status
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, SourceError> {
        let response = self.get_with_timeout(url, timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}
