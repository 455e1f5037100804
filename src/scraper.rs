//! Ingestion orchestrator.
//! Walks one source, resolves every stub in sequence and reconciles each work on its own.

use crate::catalog::Work;
use crate::detail;
use crate::error::Result;
use crate::pages::{self, ScrollOptions};
use crate::report::{EventKind, IngestSummary, RunEvent, Stage, StopReason, WorkSummary};
use crate::session::{HttpSession, Session};
use crate::source::{Source, SourceConfig};
use crate::storage::Storage;
use crate::walker::{self, WalkLimits};
use derive_builder::Builder;
use std::time::{Duration, Instant};
use url::Url;

/// Limits and pacing of one run.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct RunOptions {
    /// Listing pages walked at most.
    pub max_pages: usize,
    /// Stubs processed at most.
    #[builder(setter(strip_option))]
    pub max_items: Option<usize>,
    /// Wall-clock budget of the whole run.
    #[builder(setter(strip_option))]
    pub deadline: Option<Duration>,
    /// Inclusive range of the pause before each navigation.
    pub delay: (Duration, Duration),
    pub scroll: ScrollOptions,
    /// Visit chapter pages. When off, stored pages are left as they are.
    pub resolve_pages: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_pages: 20,
            max_items: None,
            deadline: None,
            delay: (Duration::from_millis(300), Duration::from_millis(800)),
            scroll: ScrollOptions::default(),
            resolve_pages: true,
        }
    }
}

impl RunOptions {
    pub fn builder() -> RunOptionsBuilder {
        RunOptionsBuilder::default()
    }
}

/// Runs the pipeline over one session. The session is used by this ingestor only.
pub struct Ingestor<'a, S: Session> {
    session: S,
    storage: &'a Storage,
    options: RunOptions,
}

impl<'a, S: Session> Ingestor<'a, S> {
    pub fn new(session: S, storage: &'a Storage, options: RunOptions) -> Self {
        Self {
            session,
            storage,
            options,
        }
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Ingests one source.
    ///
    /// Only a failure to load the seed listing is returned as an error. Failures of
    /// single stubs, chapters or works are logged, recorded as events and skipped.
    pub fn run(&mut self, config: &SourceConfig) -> Result<IngestSummary> {
        let deadline = self.options.deadline.map(|d| Instant::now() + d);
        let limits = WalkLimits {
            max_pages: self.options.max_pages,
            max_items: self.options.max_items,
            deadline,
        };

        log::info!("Ingesting {} from {}", config.source, config.seed_url);
        let walk = walker::walk(&mut self.session, config, &limits)?;

        let mut summary = IngestSummary {
            source: config.source,
            seed_url: config.seed_url.to_string(),
            discovered: walk.stubs.len(),
            resolved: 0,
            ingested: 0,
            works: Vec::new(),
            events: walk.events,
            stopped: walk.stopped,
        };

        for stub in &walk.stubs {
            if deadline.map_or(false, |d| Instant::now() >= d) {
                log::warn!("Deadline reached, {} stubs left unprocessed", summary.discovered - summary.resolved);
                summary.stopped = Some(StopReason::Deadline);
                summary.events.push(RunEvent::new(
                    Stage::Detail,
                    EventKind::Stopped,
                    stub.url.as_str(),
                    "deadline reached",
                ));
                break;
            }

            log::info!("Resolving {} ({})", stub.title, stub.url);
            let mut work = match detail::resolve(&mut self.session, config, stub) {
                Ok(work) => work,
                Err(e) => {
                    log::warn!("Skipping {}: {}", stub.url, e);
                    summary.events.push(RunEvent::new(
                        Stage::Detail,
                        EventKind::Skipped,
                        stub.url.as_str(),
                        e.to_string(),
                    ));
                    continue;
                }
            };
            summary.resolved += 1;

            let persisted = if self.options.resolve_pages {
                self.resolve_pages(config, &mut work, &mut summary.events);
                self.storage.reconcile(&work)
            } else {
                self.storage.reconcile_metadata(&work)
            };
            match persisted {
                Ok(()) => {
                    summary.ingested += 1;
                    summary.works.push(WorkSummary::from(&work));
                }
                Err(e) => {
                    log::error!("Cannot store {}: {}", work.id, e);
                    summary.events.push(RunEvent::new(
                        Stage::Persist,
                        EventKind::Skipped,
                        work.id.as_str(),
                        e.to_string(),
                    ));
                }
            }
        }

        log::info!(
            "{}: ingested {} of {} discovered works ({} resolved)",
            config.source,
            summary.ingested,
            summary.discovered,
            summary.resolved
        );
        Ok(summary)
    }

    fn resolve_pages(&mut self, config: &SourceConfig, work: &mut Work, events: &mut Vec<RunEvent>) {
        if config.reader.is_empty() {
            return;
        }
        for chapter in work.chapters.iter_mut() {
            let url = match &chapter.url {
                Some(url) => url,
                None => continue,
            };
            match pages::resolve(&mut self.session, config, url, &self.options.scroll) {
                Ok(pages) => chapter.pages = pages,
                Err(e) => {
                    log::warn!("No pages for {}: {}", url, e);
                    events.push(RunEvent::new(
                        Stage::Pages,
                        EventKind::Degraded,
                        url.as_str(),
                        e.to_string(),
                    ));
                }
            }
        }
    }
}

/// Ingests `source` over a fresh HTTP session, optionally from a different seed listing.
pub fn ingest(storage: &Storage, source: Source, seed: Option<Url>, options: RunOptions) -> Result<IngestSummary> {
    let session = HttpSession::open(None, options.delay)?;
    ingest_with(session, storage, source, seed, options)
}

/// Same as [`ingest`] over a caller-provided session.
pub fn ingest_with<S: Session>(
    session: S,
    storage: &Storage,
    source: Source,
    seed: Option<Url>,
    options: RunOptions,
) -> Result<IngestSummary> {
    let mut config = source.config()?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    Ingestor::new(session, storage, options).run(&config)
}
