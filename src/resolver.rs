//! Resolution of a single identifier into a [`FetchOutcome`].
//!
//! The [`Resolver`] classifies an identifier and runs the matching strategy:
//!
//! - direct URL: download it if it names a PDF
//! - past paper: one institutional catalog lookup, otherwise manual resources
//! - book title: the [`FallbackChain`], then the artifact and cover downloads
//!
//! Every failure is folded into the returned outcome. Nothing here retries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::models::{
    extract_course_code, extract_year, strip_pdf_suffix, FetchOutcome, Strategy,
};
use crate::sources::{
    ArchiveSource, CatalogSource, FallbackChain, GoogleBooksSource, PdfDriveSource, ResolvedPdf,
    SourceError, StageOutcome,
};
use crate::utils::{
    cover_file_name, pdf_file_name, sanitize_title, save_cover, stream_to_file, url_file_name,
    HttpClient,
};

/// Message for direct URLs that don't end in `.pdf`
pub const NOT_A_PDF_MESSAGE: &str = "URL doesn't point to a PDF file";

const PAST_PAPER_INFO_MESSAGE: &str = "No direct download found. Try these resources:";

const ACADEMIC_PORTALS: &[&str] = &["https://www.academia.edu/", "https://www.researchgate.net/"];

const PAST_PAPER_TIPS: &[&str] = &[
    "Try searching with exact course code and year (e.g. 'CS 101 2020')",
    "Some resources may require institutional login",
];

/// Resolves identifiers against the configured sources
#[derive(Debug)]
pub struct Resolver {
    config: Config,
    client: Arc<HttpClient>,
    chain: FallbackChain,
    catalog: CatalogSource,
    covers: GoogleBooksSource,
}

impl Resolver {
    /// Create a resolver with the default fallback chain
    pub fn new(config: Config) -> Result<Self, SourceError> {
        let client = Arc::new(HttpClient::new(&config.http)?);
        let chain = FallbackChain::new(Arc::clone(&client), &config.endpoints);
        Ok(Self::with_chain(config, client, chain))
    }

    /// Create a resolver with a custom fallback chain
    pub fn with_chain(config: Config, client: Arc<HttpClient>, chain: FallbackChain) -> Self {
        let catalog = CatalogSource::new(
            Arc::clone(&client),
            config.endpoints.opac.clone(),
            config.http.catalog_search_timeout(),
        );
        let covers =
            GoogleBooksSource::new(Arc::clone(&client), config.endpoints.google_books.clone());

        Self {
            config,
            client,
            chain,
            catalog,
            covers,
        }
    }

    fn download_dir(&self) -> &Path {
        &self.config.downloads.directory
    }

    /// Resolve one identifier end to end
    pub async fn fetch(&self, identifier: &str) -> FetchOutcome {
        if identifier.trim().is_empty() {
            return FetchOutcome::error("No identifier given");
        }

        let strategy = Strategy::classify(identifier);
        tracing::info!(
            strategy = strategy.label(),
            identifier = strategy.identifier(),
            "resolving identifier"
        );

        if let Err(e) = tokio::fs::create_dir_all(self.download_dir()).await {
            return FetchOutcome::error(format!(
                "Could not create download directory {}: {}",
                self.download_dir().display(),
                e
            ));
        }

        match strategy {
            Strategy::DirectUrl(url) => self.fetch_direct(&url).await,
            Strategy::PastPaper(query) => self.fetch_past_paper(&query).await,
            Strategy::Book(title) => self.fetch_book(&title).await,
        }
    }

    /// Download a URL as-is, provided it names a PDF
    pub async fn fetch_direct(&self, url: &str) -> FetchOutcome {
        if !url.to_lowercase().ends_with(".pdf") {
            return FetchOutcome::error(NOT_A_PDF_MESSAGE);
        }

        let path = self.download_dir().join(url_file_name(url));
        match stream_to_file(&self.client, url, &path, self.client.download_timeout()).await {
            Ok(_) => FetchOutcome::success("Downloaded PDF from URL", path),
            Err(e) => {
                tracing::warn!(url, error = %e, "direct download failed");
                FetchOutcome::error(e.to_string())
            }
        }
    }

    /// Run the fallback chain for a book title
    pub async fn fetch_book(&self, raw_title: &str) -> FetchOutcome {
        let title = strip_pdf_suffix(raw_title);

        match self.chain.resolve(&title).await {
            Some(hit) => self
                .download_artifact(&hit.pdf)
                .await
                .with_source(hit.source_name),
            None => {
                let endpoints = &self.config.endpoints;
                FetchOutcome::error(format!("Could not find PDF for '{}'", title))
                    .with_alternatives(vec![
                        PdfDriveSource::search_page(&endpoints.pdfdrive, &title),
                        ArchiveSource::search_page(&endpoints.archive, &title),
                    ])
            }
        }
    }

    /// Download a resolved book PDF and try to add a cover
    async fn download_artifact(&self, pdf: &ResolvedPdf) -> FetchOutcome {
        let path = self.download_dir().join(pdf_file_name(&pdf.title));

        if let Err(e) =
            stream_to_file(&self.client, &pdf.url, &path, self.client.download_timeout()).await
        {
            tracing::warn!(url = %pdf.url, error = %e, "PDF download failed");
            return FetchOutcome::error(e.to_string());
        }

        let cover = self.fetch_cover(&pdf.title).await;
        FetchOutcome::success(format!("Downloaded '{}'", pdf.title), path).with_cover(cover)
    }

    /// Best-effort cover image; failures are logged and dropped
    pub async fn fetch_cover(&self, title: &str) -> Option<PathBuf> {
        if !self.config.downloads.fetch_covers {
            return None;
        }

        match self.try_fetch_cover(title).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(title, error = %e, "cover image not found");
                None
            }
        }
    }

    async fn try_fetch_cover(&self, title: &str) -> Result<Option<PathBuf>, SourceError> {
        let Some(thumbnail) = self.covers.thumbnail_url(title).await? else {
            tracing::debug!(title, "no thumbnail for title");
            return Ok(None);
        };

        let path = self.download_dir().join(cover_file_name(title));
        save_cover(&self.client, &thumbnail, &path).await?;
        Ok(Some(path))
    }

    /// One catalog lookup; manual resources when it yields nothing
    pub async fn fetch_past_paper(&self, query: &str) -> FetchOutcome {
        let course_code = extract_course_code(query);
        let year = extract_year(query);
        tracing::info!(query, ?course_code, ?year, "searching {}", self.catalog.name());

        match self.catalog.find_download_link(query).await {
            StageOutcome::Found(pdf) => {
                let file_name = past_paper_file_name(course_code.as_deref(), year.as_deref());
                let path = self.download_dir().join(file_name);
                let timeout = self.config.http.catalog_download_timeout();

                match stream_to_file(&self.client, &pdf.url, &path, timeout).await {
                    Ok(_) => {
                        let message = format!("Downloaded past paper: {}", query);
                        return FetchOutcome::success(message, path)
                            .with_source(self.catalog.name());
                    }
                    Err(e) => {
                        tracing::warn!(url = %pdf.url, error = %e, "past paper download failed");
                    }
                }
            }
            StageOutcome::Empty => {
                tracing::debug!(query, "catalog has no download link");
            }
            StageOutcome::Failed(e) => {
                tracing::warn!(query, error = %e, "catalog search failed");
            }
        }

        self.past_paper_resources(query)
    }

    fn past_paper_resources(&self, query: &str) -> FetchOutcome {
        let search_url = CatalogSource::search_url(&self.config.endpoints.opac, query);

        let mut resources = vec![search_url.clone()];
        resources.extend(ACADEMIC_PORTALS.iter().map(|s| s.to_string()));

        FetchOutcome::Info {
            message: PAST_PAPER_INFO_MESSAGE.to_string(),
            url: Some(search_url),
            resources,
            tips: PAST_PAPER_TIPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// `<course>_<year>.pdf`, with `paper`/`unknown` standing in for a missing half
fn past_paper_file_name(course_code: Option<&str>, year: Option<&str>) -> String {
    if course_code.is_none() && year.is_none() {
        return "past_paper.pdf".to_string();
    }
    let stem = format!(
        "{}_{}",
        course_code.unwrap_or("paper"),
        year.unwrap_or("unknown")
    );
    format!("{}.pdf", sanitize_title(&stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::models::Status;
    use crate::sources::{CallLog, MockBehavior, MockSource};
    use crate::utils::sample_png;
    use mockito::Matcher;
    use tempfile::{tempdir, TempDir};

    fn test_config(dir: &TempDir, base_url: &str) -> Config {
        let mut config = Config::default();
        config.downloads.directory = dir.path().join("downloads");
        config.downloads.fetch_covers = false;
        config.endpoints = EndpointConfig::all_at(base_url);
        config
    }

    fn resolver_with(
        config: Config,
        behaviors: Vec<(&str, MockBehavior)>,
        log: &CallLog,
    ) -> Resolver {
        let client = Arc::new(HttpClient::new(&config.http).unwrap());
        let mut chain = FallbackChain::empty();
        for (id, behavior) in behaviors {
            chain.register(Arc::new(MockSource::new(id, behavior, log)));
        }
        Resolver::with_chain(config, client, chain)
    }

    #[test]
    fn test_past_paper_file_name() {
        assert_eq!(past_paper_file_name(Some("BICT230"), Some("2023")), "BICT230_2023.pdf");
        assert_eq!(past_paper_file_name(Some("CS 101"), None), "CS 101_unknown.pdf");
        assert_eq!(past_paper_file_name(None, Some("2024")), "paper_2024.pdf");
        assert_eq!(past_paper_file_name(None, None), "past_paper.pdf");
    }

    #[tokio::test]
    async fn test_non_pdf_url_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let resolver = Resolver::new(test_config(&dir, &server.url())).unwrap();
        let outcome = resolver
            .fetch(&format!("{}/book.html", server.url()))
            .await;

        mock.assert_async().await;
        assert_eq!(outcome, FetchOutcome::error(NOT_A_PDF_MESSAGE));
    }

    #[tokio::test]
    async fn test_direct_pdf_download() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/library/book.pdf")
            .with_body("%PDF-1.7")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let resolver = Resolver::new(test_config(&dir, &server.url())).unwrap();
        let outcome = resolver
            .fetch(&format!("  {}/library/book.pdf ", server.url()))
            .await;

        assert_eq!(outcome.status(), Status::Success);
        assert_eq!(outcome.message(), "Downloaded PDF from URL");
        let path = outcome.file_path().unwrap();
        assert!(path.ends_with("book.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_direct_download_failure_is_error() {
        let dir = tempdir().unwrap();
        let resolver = Resolver::new(test_config(&dir, "http://127.0.0.1:9")).unwrap();

        let outcome = resolver.fetch("http://127.0.0.1:9/book.pdf").await;
        assert!(outcome.is_error());
        assert!(!outcome.message().is_empty());
    }

    #[tokio::test]
    async fn test_book_found_downloads_artifact() {
        let mut server = mockito::Server::new_async().await;
        let _pdf = server
            .mock("GET", "/files/dune.pdf")
            .with_body("%PDF dune")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let log = CallLog::default();
        let resolver = resolver_with(
            test_config(&dir, &server.url()),
            vec![
                ("pdfdrive", MockBehavior::Empty),
                ("archive", MockBehavior::Found(format!("{}/files/dune.pdf", server.url()))),
                ("web", MockBehavior::Fail),
            ],
            &log,
        );

        let outcome = resolver.fetch("Dune.pdf").await;

        assert_eq!(log.calls(), vec!["pdfdrive", "archive"]);
        match outcome {
            FetchOutcome::Success {
                message,
                file_path,
                cover,
                source,
            } => {
                assert_eq!(message, "Downloaded 'Dune'");
                assert_eq!(file_path, dir.path().join("downloads").join("Dune.pdf"));
                assert_eq!(cover, None);
                assert_eq!(source.as_deref(), Some("Mock Source"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_book_download_failure_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _pdf = server
            .mock("GET", "/gone.pdf")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let log = CallLog::default();
        let resolver = resolver_with(
            test_config(&dir, &server.url()),
            vec![
                ("pdfdrive", MockBehavior::Found(format!("{}/gone.pdf", server.url()))),
                ("archive", MockBehavior::Found("https://unused.example/x.pdf".to_string())),
            ],
            &log,
        );

        let outcome = resolver.fetch("Gone Girl").await;
        assert!(outcome.is_error());
        assert!(outcome.message().contains("404"));
        assert_eq!(log.calls(), vec!["pdfdrive"]);
    }

    #[tokio::test]
    async fn test_book_not_found_lists_alternatives() {
        let dir = tempdir().unwrap();
        let log = CallLog::default();
        let mut config = test_config(&dir, "http://127.0.0.1:9");
        config.endpoints = EndpointConfig::default();
        let resolver = resolver_with(
            config,
            vec![
                ("pdfdrive", MockBehavior::Fail),
                ("archive", MockBehavior::Empty),
                ("web", MockBehavior::Fail),
            ],
            &log,
        );

        let outcome = resolver.fetch("Python Crash Course").await;

        assert_eq!(log.calls(), vec!["pdfdrive", "archive", "web"]);
        assert_eq!(
            outcome,
            FetchOutcome::Error {
                message: "Could not find PDF for 'Python Crash Course'".to_string(),
                alternatives: vec![
                    "https://www.pdfdrive.com/search?q=Python+Crash+Course".to_string(),
                    "https://archive.org/search.php?query=Python+Crash+Course".to_string(),
                ],
                identifier: None,
            }
        );
    }

    #[tokio::test]
    async fn test_cover_saved_as_jpeg() {
        let mut server = mockito::Server::new_async().await;
        let _pdf = server
            .mock("GET", "/files/habits.pdf")
            .with_body("%PDF habits")
            .create_async()
            .await;
        let _volumes = server
            .mock("GET", "/books/v1/volumes")
            .match_query(Matcher::Any)
            .with_body(format!(
                r#"{{"items":[{{"volumeInfo":{{"imageLinks":{{"thumbnail":"{}/thumb.png"}}}}}}]}}"#,
                server.url()
            ))
            .create_async()
            .await;
        let _thumb = server
            .mock("GET", "/thumb.png")
            .with_header("content-type", "image/png")
            .with_body(sample_png())
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let mut config = test_config(&dir, &server.url());
        config.downloads.fetch_covers = true;
        let log = CallLog::default();
        let resolver = resolver_with(
            config,
            vec![("pdfdrive", MockBehavior::Found(format!("{}/files/habits.pdf", server.url())))],
            &log,
        );

        let outcome = resolver.fetch("Atomic Habits").await;
        match outcome {
            FetchOutcome::Success { cover: Some(cover), .. } => {
                assert!(cover.ends_with("Atomic Habits_cover.jpg"));
                let bytes = std::fs::read(&cover).unwrap();
                assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
            }
            other => panic!("expected success with cover, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cover_failure_keeps_success() {
        let mut server = mockito::Server::new_async().await;
        let _pdf = server
            .mock("GET", "/files/habits.pdf")
            .with_body("%PDF habits")
            .create_async()
            .await;
        let _volumes = server
            .mock("GET", "/books/v1/volumes")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let mut config = test_config(&dir, &server.url());
        config.downloads.fetch_covers = true;
        let log = CallLog::default();
        let resolver = resolver_with(
            config,
            vec![("pdfdrive", MockBehavior::Found(format!("{}/files/habits.pdf", server.url())))],
            &log,
        );

        let outcome = resolver.fetch("Atomic Habits").await;
        assert!(outcome.is_success());
        assert!(matches!(outcome, FetchOutcome::Success { cover: None, .. }));
    }

    #[tokio::test]
    async fn test_past_paper_without_link_is_info() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/cgi-bin/koha/opac-search.pl")
            .match_query(Matcher::Any)
            .with_body("<html><a href='/cgi-bin/koha/opac-detail.pl?id=1'>x</a></html>")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let resolver = Resolver::new(test_config(&dir, &server.url())).unwrap();
        let outcome = resolver.fetch("past paper networking").await;

        let expected_url = format!(
            "{}/cgi-bin/koha/opac-search.pl?q=past+paper+networking",
            server.url()
        );
        match outcome {
            FetchOutcome::Info {
                message,
                url,
                resources,
                tips,
            } => {
                assert_eq!(message, "No direct download found. Try these resources:");
                assert_eq!(url.as_deref(), Some(expected_url.as_str()));
                assert_eq!(resources.len(), 3);
                assert_eq!(resources[0], expected_url);
                assert_eq!(tips.len(), 2);
            }
            other => panic!("expected info, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_past_paper_catalog_unreachable_is_info() {
        let dir = tempdir().unwrap();
        let resolver = Resolver::new(test_config(&dir, "http://127.0.0.1:9")).unwrap();

        let outcome = resolver.fetch("exam paper COMM1101 2024").await;
        assert_eq!(outcome.status(), Status::Info);
    }

    #[tokio::test]
    async fn test_past_paper_download() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/cgi-bin/koha/opac-search.pl")
            .match_query(Matcher::Any)
            .with_body(r#"<a href="/uploads/bict2303-2023.pdf">Paper</a>"#)
            .create_async()
            .await;
        let _pdf = server
            .mock("GET", "/uploads/bict2303-2023.pdf")
            .with_body("%PDF paper")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let resolver = Resolver::new(test_config(&dir, &server.url())).unwrap();
        let outcome = resolver.fetch("past paper BICT2303 2023").await;

        match outcome {
            FetchOutcome::Success {
                file_path, source, ..
            } => {
                assert!(file_path.ends_with("BICT230_2023.pdf"));
                assert_eq!(source.as_deref(), Some("MZUNI Library"));
                assert_eq!(std::fs::read(file_path).unwrap(), b"%PDF paper");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_identifier_is_error() {
        let dir = tempdir().unwrap();
        let resolver = Resolver::new(test_config(&dir, "http://127.0.0.1:9")).unwrap();
        assert!(resolver.fetch("   ").await.is_error());
    }
}
