//! # pdf-fetch
//!
//! Find and download PDFs for book titles, course past papers and direct links.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Identifier classification and fetch outcomes
//! - [`sources`]: PDF sources, the fallback chain and the library catalog
//! - [`resolver`]: Turns one identifier into one outcome
//! - [`batch`]: Bounded-concurrency dispatch over many identifiers
//! - [`utils`]: HTTP client, file naming, downloads and cover re-encoding
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal rendering of outcomes

pub mod batch;
pub mod config;
pub mod models;
pub mod resolver;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use batch::{BatchDispatcher, Resolve};
pub use config::Config;
pub use models::{BatchEntry, BatchSummary, FetchOutcome, Status, Strategy};
pub use resolver::Resolver;
pub use sources::{FallbackChain, Source, SourceError};
