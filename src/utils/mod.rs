//! Utility modules supporting fetch operations.
//!
//! - [`HttpClient`]: shared reqwest client with the configured user agent and timeouts
//! - [`stream_to_file`]: stream a response body to disk
//! - [`save_cover`]: download an image and re-encode it as JPEG
//! - [`sanitize_title`], [`pdf_file_name`], [`cover_file_name`], [`url_file_name`]: output naming
//! - [`plus_encode`]: form-encode search terms

mod cover;
mod download;
mod filename;
mod http;

#[cfg(test)]
pub(crate) use cover::sample_png;
pub use cover::{encode_jpeg, save_cover};
pub use download::stream_to_file;
pub use filename::{cover_file_name, pdf_file_name, plus_encode, sanitize_title, url_file_name};
pub use http::HttpClient;
