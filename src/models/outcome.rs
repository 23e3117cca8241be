//! Fetch outcomes and batch results.

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Outcome status, mirrored in the serialized `status` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    Info,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Error => write!(f, "error"),
            Status::Info => write!(f, "info"),
        }
    }
}

/// The result of resolving one identifier.
///
/// Serializes to a flat JSON object with a `status` tag:
///
/// ```json
/// {"status": "success", "message": "Downloaded 'Dune'", "file_path": "downloads/Dune.pdf"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FetchOutcome {
    /// A PDF was written to disk
    Success {
        message: String,
        file_path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cover: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },

    /// Nothing could be fetched for this identifier
    Error {
        message: String,
        /// Search pages the user can try by hand
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        alternatives: Vec<String>,
        /// Set when the failure was caught at the batch boundary
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identifier: Option<String>,
    },

    /// No automatic resolution, but manual next steps are available
    Info {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default)]
        resources: Vec<String>,
        #[serde(default)]
        tips: Vec<String>,
    },
}

impl FetchOutcome {
    /// Create a success outcome with no cover and no source
    pub fn success(message: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        FetchOutcome::Success {
            message: message.into(),
            file_path: file_path.into(),
            cover: None,
            source: None,
        }
    }

    /// Create an error outcome
    pub fn error(message: impl Into<String>) -> Self {
        FetchOutcome::Error {
            message: message.into(),
            alternatives: Vec::new(),
            identifier: None,
        }
    }

    /// Attach a cover path to a success outcome (no-op otherwise)
    pub fn with_cover(mut self, path: Option<PathBuf>) -> Self {
        if let FetchOutcome::Success { cover, .. } = &mut self {
            *cover = path;
        }
        self
    }

    /// Attach a source name to a success outcome (no-op otherwise)
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        if let FetchOutcome::Success { source, .. } = &mut self {
            *source = Some(name.into());
        }
        self
    }

    /// Attach manual search alternatives to an error outcome (no-op otherwise)
    pub fn with_alternatives(mut self, urls: Vec<String>) -> Self {
        if let FetchOutcome::Error { alternatives, .. } = &mut self {
            *alternatives = urls;
        }
        self
    }

    /// Tag an error outcome with the identifier it belongs to (no-op otherwise)
    pub fn with_identifier(mut self, id: impl Into<String>) -> Self {
        if let FetchOutcome::Error { identifier, .. } = &mut self {
            *identifier = Some(id.into());
        }
        self
    }

    pub fn status(&self) -> Status {
        match self {
            FetchOutcome::Success { .. } => Status::Success,
            FetchOutcome::Error { .. } => Status::Error,
            FetchOutcome::Info { .. } => Status::Info,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FetchOutcome::Success { message, .. }
            | FetchOutcome::Error { message, .. }
            | FetchOutcome::Info { message, .. } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == Status::Success
    }

    pub fn is_error(&self) -> bool {
        self.status() == Status::Error
    }

    /// Path of the downloaded PDF, if any
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            FetchOutcome::Success { file_path, .. } => Some(file_path),
            _ => None,
        }
    }
}

/// One identifier and its outcome.
///
/// Serializes as the outcome's flat object with `identifier` alongside `status`:
///
/// ```json
/// {"identifier": "Dune", "status": "error", "message": "Could not find PDF for 'Dune'"}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub identifier: String,
    pub outcome: FetchOutcome,
}

impl BatchEntry {
    pub fn new(identifier: impl Into<String>, outcome: FetchOutcome) -> Self {
        Self {
            identifier: identifier.into(),
            outcome,
        }
    }
}

impl Serialize for BatchEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.outcome).map_err(S::Error::custom)?;
        // A batch-boundary error already carries the same identifier
        if let serde_json::Value::Object(fields) = &mut value {
            fields.insert(
                "identifier".to_string(),
                serde_json::Value::String(self.identifier.clone()),
            );
        }
        value.serialize(serializer)
    }
}

/// Per-status counts over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub info: usize,
    pub error: usize,
}

impl BatchSummary {
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        entries
            .iter()
            .fold(Self::default(), |mut summary, entry| {
                summary.total += 1;
                match entry.outcome.status() {
                    Status::Success => summary.success += 1,
                    Status::Info => summary.info += 1,
                    Status::Error => summary.error += 1,
                }
                summary
            })
    }

    /// True when there was at least one entry and every entry failed
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.error == self.total
    }
}
