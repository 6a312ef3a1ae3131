use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod manifest;

pub use manifest::{Manifest, ManifestCatalog, ManifestExtra};

/// One known stream source for a movie.
///
/// Several records may share an `external_id` when a movie has more than one
/// candidate source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Stable external identifier (e.g., "tt0111161")
    pub external_id: String,
    pub title: String,
    /// Free-text description, possibly empty
    pub overview: String,
    pub stream_url: String,
}

impl MovieRecord {
    pub fn new(
        external_id: impl Into<String>,
        title: impl Into<String>,
        overview: impl Into<String>,
        stream_url: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            overview: overview.into(),
            stream_url: stream_url.into(),
        }
    }
}

/// Catalog projection of a movie: metadata only, never the stream URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub external_id: String,
    pub title: String,
    pub overview: String,
}

impl From<&MovieRecord> for CatalogEntry {
    fn from(record: &MovieRecord) -> Self {
        Self {
            external_id: record.external_id.clone(),
            title: record.title.clone(),
            overview: record.overview.clone(),
        }
    }
}

/// A stream source confirmed live, as handed back to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLink {
    pub title: String,
    pub url: String,
}

/// Why a probe did not confirm a source as live
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NotLiveReason {
    /// No answer before the probe timeout elapsed
    Timeout,
    /// Could not establish a connection
    Connect,
    /// Answered with anything other than 200, redirects included
    Status(u16),
    /// Any other transport failure (DNS, malformed URL, TLS, ...)
    Request(String),
    /// The probe task itself failed before producing an answer
    Aborted(String),
}

impl Display for NotLiveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotLiveReason::Timeout => write!(f, "timed out"),
            NotLiveReason::Connect => write!(f, "connection failed"),
            NotLiveReason::Status(code) => write!(f, "status {}", code),
            NotLiveReason::Request(msg) => write!(f, "request failed: {}", msg),
            NotLiveReason::Aborted(msg) => write!(f, "probe aborted: {}", msg),
        }
    }
}

/// Result of a single reachability probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Live,
    NotLive { reason: NotLiveReason },
}

impl ProbeOutcome {
    pub fn not_live(reason: NotLiveReason) -> Self {
        ProbeOutcome::NotLive { reason }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, ProbeOutcome::Live)
    }
}

/// Outcome for one candidate source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateReport {
    pub record: MovieRecord,
    pub outcome: ProbeOutcome,
}

/// Per-request liveness report, candidates kept in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LivenessReport {
    pub external_id: String,
    pub candidates: Vec<CandidateReport>,
}

impl LivenessReport {
    /// Live sources only, in catalog order
    pub fn live_streams(&self) -> Vec<StreamLink> {
        self.candidates
            .iter()
            .filter(|candidate| candidate.outcome.is_live())
            .map(|candidate| StreamLink {
                title: candidate.record.title.clone(),
                url: candidate.record.stream_url.clone(),
            })
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|candidate| candidate.outcome.is_live())
            .count()
    }
}
