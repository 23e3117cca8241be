//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::sources::{ResolvedPdf, Source, SourceError};

/// What a [`MockSource`] does when asked for a PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Return this URL
    Found(String),
    /// Return no result
    Empty,
    /// Return a network error
    Fail,
}

/// Shared record of which mock sources were called, in call order
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    fn push(&self, id: &str) {
        if let Ok(mut guard) = self.calls.lock() {
            guard.push(id.to_string());
        }
    }

    /// Source IDs in the order they were called
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

/// A mock source for testing that returns a predefined behavior.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    behavior: MockBehavior,
    log: CallLog,
}

impl MockSource {
    /// Create a new mock source that records its calls in `log`.
    pub fn new(id: impl Into<String>, behavior: MockBehavior, log: &CallLog) -> Self {
        Self {
            id: id.into(),
            behavior,
            log: log.clone(),
        }
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn find_pdf(&self, title: &str) -> Result<Option<ResolvedPdf>, SourceError> {
        self.log.push(&self.id);
        match &self.behavior {
            MockBehavior::Found(url) => Ok(Some(ResolvedPdf::new(url.clone(), title))),
            MockBehavior::Empty => Ok(None),
            MockBehavior::Fail => Err(SourceError::Network(format!(
                "{} is unreachable",
                self.id
            ))),
        }
    }
}
