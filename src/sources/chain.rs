//! Ordered fallback chain over PDF sources.

use std::sync::Arc;

use super::{
    archive::ArchiveSource, pdfdrive::PdfDriveSource, web_search::WebSearchSource, ResolvedPdf,
    Source, StageOutcome,
};
use crate::config::EndpointConfig;
use crate::utils::HttpClient;

/// The first successful stage of a chain run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHit {
    /// ID of the source that found the PDF
    pub source_id: String,

    /// Human-readable name of that source
    pub source_name: String,

    pub pdf: ResolvedPdf,
}

/// Sources tried in registration order until one finds a PDF
///
/// Failures and empty results are logged and never stop the chain; the first
/// `Found` does.
#[derive(Debug, Clone, Default)]
pub struct FallbackChain {
    sources: Vec<Arc<dyn Source>>,
}

impl FallbackChain {
    /// Create an empty chain
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create the default chain: PDFDrive, then Internet Archive, then web search
    pub fn new(client: Arc<HttpClient>, endpoints: &EndpointConfig) -> Self {
        let mut chain = Self::empty();

        chain.register(Arc::new(PdfDriveSource::new(
            Arc::clone(&client),
            endpoints.pdfdrive.clone(),
        )));
        chain.register(Arc::new(ArchiveSource::new(
            Arc::clone(&client),
            endpoints.archive.clone(),
        )));
        chain.register(Arc::new(WebSearchSource::new(
            client,
            endpoints.web_search.clone(),
        )));

        chain
    }

    /// Append a source to the end of the chain
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.push(source);
    }

    /// Source IDs in the order they run
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Run each source in order, stopping at the first that finds a PDF
    pub async fn resolve(&self, title: &str) -> Option<ChainHit> {
        for source in &self.sources {
            tracing::info!(source = source.id(), title, "searching {}", source.name());

            match source.lookup(title).await {
                StageOutcome::Found(pdf) => {
                    tracing::info!(source = source.id(), url = %pdf.url, "found PDF");
                    return Some(ChainHit {
                        source_id: source.id().to_string(),
                        source_name: source.name().to_string(),
                        pdf,
                    });
                }
                StageOutcome::Empty => {
                    tracing::debug!(source = source.id(), title, "no result");
                }
                StageOutcome::Failed(e) => {
                    tracing::warn!(source = source.id(), title, error = %e, "source failed");
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::sources::mock::{CallLog, MockBehavior, MockSource};

    #[test]
    fn test_default_chain_order() {
        let client = Arc::new(HttpClient::new(&HttpConfig::default()).unwrap());
        let chain = FallbackChain::new(client, &EndpointConfig::default());

        assert_eq!(chain.ids().collect::<Vec<_>>(), vec!["pdfdrive", "archive", "web"]);
        assert_eq!(chain.len(), 3);
        assert!(!chain.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_stops_at_first_found() {
        let log = CallLog::default();
        let mut chain = FallbackChain::empty();
        chain.register(Arc::new(MockSource::new("a", MockBehavior::Fail, &log)));
        chain.register(Arc::new(MockSource::new(
            "b",
            MockBehavior::Found("https://b.example/x.pdf".to_string()),
            &log,
        )));
        chain.register(Arc::new(MockSource::new(
            "c",
            MockBehavior::Found("https://c.example/x.pdf".to_string()),
            &log,
        )));

        let hit = chain.resolve("Dune").await.unwrap();

        assert_eq!(hit.source_id, "b");
        assert_eq!(hit.pdf.url, "https://b.example/x.pdf");
        assert_eq!(log.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_resolve_exhausts_chain() {
        let log = CallLog::default();
        let mut chain = FallbackChain::empty();
        chain.register(Arc::new(MockSource::new("a", MockBehavior::Empty, &log)));
        chain.register(Arc::new(MockSource::new("b", MockBehavior::Fail, &log)));
        chain.register(Arc::new(MockSource::new("c", MockBehavior::Empty, &log)));

        assert!(chain.resolve("Dune").await.is_none());
        assert_eq!(log.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_empty_chain_resolves_nothing() {
        assert!(FallbackChain::empty().resolve("Dune").await.is_none());
    }
}
