//! Configuration management.
//!
//! Configuration is read from a TOML file and `PDF_FETCH_*` environment
//! variables, then passed explicitly into the resolver and batch dispatcher.
//!
//! # Configuration File Format
//!
//! ```toml
//! [downloads]
//! directory = "./downloads"
//! fetch_covers = true
//!
//! [concurrency]
//! max_concurrent_downloads = 10
//!
//! [http]
//! user_agent = "Mozilla/5.0"
//! search_timeout_secs = 10
//! download_timeout_secs = 15
//! catalog_search_timeout_secs = 15
//! catalog_download_timeout_secs = 20
//!
//! [endpoints]
//! pdfdrive = "https://www.pdfdrive.com"
//! archive = "https://archive.org"
//! web_search = "https://html.duckduckgo.com/html/"
//! google_books = "https://www.googleapis.com"
//! opac = "https://opac.mzuni.ac.mw"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Environment overrides use a double underscore between section and key,
//! e.g. `PDF_FETCH_CONCURRENCY__MAX_CONCURRENT_DOWNLOADS=4`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the config file looked up in the working and config directories
pub const CONFIG_FILE_NAME: &str = "pdf-fetch.toml";

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_VAR: &str = "PDF_FETCH_CONFIG";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Download settings
    #[serde(default)]
    pub downloads: DownloadConfig,

    /// Batch concurrency settings
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Upstream base URLs
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Download configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory PDFs and covers are written to
    #[serde(default = "default_download_dir")]
    pub directory: PathBuf,

    /// Whether to look up and save a cover image for book downloads
    #[serde(default = "default_true")]
    pub fetch_covers: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: default_download_dir(),
            fetch_covers: true,
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_true() -> bool {
    true
}

/// Batch concurrency configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Maximum identifiers resolved at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent(),
        }
    }
}

impl ConcurrencyConfig {
    /// Effective worker cap, never below one
    pub fn limit(&self) -> usize {
        self.max_concurrent_downloads.max(1)
    }
}

fn default_max_concurrent() -> usize {
    10
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,

    /// Longest stall between body chunks of an artifact download
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    #[serde(default = "default_catalog_search_timeout")]
    pub catalog_search_timeout_secs: u64,

    /// Same as `download_timeout_secs`, for catalog downloads
    #[serde(default = "default_catalog_download_timeout")]
    pub catalog_download_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            search_timeout_secs: default_search_timeout(),
            download_timeout_secs: default_download_timeout(),
            catalog_search_timeout_secs: default_catalog_search_timeout(),
            catalog_download_timeout_secs: default_catalog_download_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn catalog_search_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_search_timeout_secs)
    }

    pub fn catalog_download_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_download_timeout_secs)
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_search_timeout() -> u64 {
    10
}

fn default_download_timeout() -> u64 {
    15
}

fn default_catalog_search_timeout() -> u64 {
    15
}

fn default_catalog_download_timeout() -> u64 {
    20
}

/// Base URLs for every upstream the resolver talks to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_pdfdrive")]
    pub pdfdrive: String,

    #[serde(default = "default_archive")]
    pub archive: String,

    /// HTML results page of the web search engine
    #[serde(default = "default_web_search")]
    pub web_search: String,

    #[serde(default = "default_google_books")]
    pub google_books: String,

    /// Koha OPAC of the institutional library
    #[serde(default = "default_opac")]
    pub opac: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            pdfdrive: default_pdfdrive(),
            archive: default_archive(),
            web_search: default_web_search(),
            google_books: default_google_books(),
            opac: default_opac(),
        }
    }
}

impl EndpointConfig {
    /// Point every upstream at the same base URL (used against a local mock server)
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            pdfdrive: base.clone(),
            archive: base.clone(),
            web_search: format!("{}/html/", base),
            google_books: base.clone(),
            opac: base,
        }
    }
}

fn default_pdfdrive() -> String {
    "https://www.pdfdrive.com".to_string()
}

fn default_archive() -> String {
    "https://archive.org".to_string()
}

fn default_web_search() -> String {
    "https://html.duckduckgo.com/html/".to_string()
}

fn default_google_books() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_opac() -> String {
    "https://opac.mzuni.ac.mw".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Load configuration from a file, layering `PDF_FETCH_*` environment variables on top
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("PDF_FETCH")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Load configuration from the environment only
pub fn load_env_config() -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(
            config::Environment::with_prefix("PDF_FETCH")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Find a configuration file in the default locations
///
/// Checked in order: `$PDF_FETCH_CONFIG`, `./pdf-fetch.toml`,
/// `<config dir>/pdf-fetch/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("pdf-fetch").join("config.toml"))
        .filter(|path| path.is_file())
}
