//! Structured run records. Every absorbed failure leaves a [`RunEvent`] in the
//! summary in addition to the log line, so callers can inspect partial success.

use crate::catalog::Work;
use crate::source::Source;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Listing,
    Detail,
    Pages,
    Persist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// The item was dropped.
    Skipped,
    /// The item was kept with some data missing.
    Degraded,
    /// The run stopped early.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunEvent {
    pub stage: Stage,
    pub kind: EventKind,
    /// URL or identifier of the affected item.
    pub target: String,
    pub message: String,
}

impl RunEvent {
    pub fn new(stage: Stage, kind: EventKind, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            target: target.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxPages,
    MaxItems,
    Deadline,
    PaginationLoop,
}

/// Normalized view of an ingested work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkSummary {
    pub id: String,
    pub title: String,
    pub source: Source,
    pub source_url: String,
    pub cover_image_url: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub genres: Vec<String>,
    pub chapters: usize,
    pub pages: usize,
}

impl From<&Work> for WorkSummary {
    fn from(work: &Work) -> Self {
        Self {
            id: work.id.clone(),
            title: work.title.clone(),
            source: work.source,
            source_url: work.url.to_string(),
            cover_image_url: work.cover.clone(),
            author: work.author.clone(),
            description: work.description.clone(),
            kind: work.kind.clone(),
            genres: work.genres.clone(),
            chapters: work.chapters.len(),
            pages: work.page_count(),
        }
    }
}

/// Result of one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    pub source: Source,
    pub seed_url: String,
    /// Stubs found by the list walker.
    pub discovered: usize,
    /// Stubs whose detail page resolved.
    pub resolved: usize,
    /// Works committed to storage.
    pub ingested: usize,
    pub works: Vec<WorkSummary>,
    pub events: Vec<RunEvent>,
    pub stopped: Option<StopReason>,
}

impl IngestSummary {
    pub fn events_for(&self, stage: Stage) -> impl Iterator<Item = &RunEvent> {
        self.events.iter().filter(move |e| e.stage == stage)
    }
}
