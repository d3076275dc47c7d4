use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::Fetcher;
use crate::detector::detect;
use crate::dispatcher::{dispatch, DispatchReport, Notifier};
use crate::error::{ErrorKind, RunError};
use crate::storage::StateStore;
use crate::types::{sorted_ids, ContentKind};

/// Structured summary of one kind's run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    FirstRun { baselined: usize },
    Success { sent: usize, failed_channels: usize },
    Failure { error: ErrorKind, message: String },
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool { matches!(self, RunOutcome::Failure { .. }) }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::FirstRun { baselined } => write!(f, "first run: {} identifiers baselined, nothing sent", baselined),
            RunOutcome::Success { sent, failed_channels } => write!(f, "sent {} new, {} channel deliveries failed", sent, failed_channels),
            RunOutcome::Failure { error, message } => write!(f, "{} failure: {}", error, message),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KindReport {
    pub kind: ContentKind,
    pub outcome: RunOutcome,
    pub dispatches: Vec<DispatchReport>,
}

/// Steps of a single kind's run, logged as the run advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage { Loading, Fetching, Detecting, FirstRunPersist, Dispatching, Persisting, Done, Failed }

/// Owns the collaborators and drives load, fetch, detect, dispatch, persist per kind.
pub struct RunCoordinator {
    store: Arc<dyn StateStore>,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    channels: Vec<String>,
    kinds: Vec<ContentKind>,
}

impl RunCoordinator {
    pub fn new(store: Arc<dyn StateStore>, fetcher: Arc<dyn Fetcher>, notifier: Arc<dyn Notifier>, channels: Vec<String>) -> Self {
        Self { store, fetcher, notifier, channels, kinds: ContentKind::ALL.to_vec() }
    }

    pub fn with_kinds(mut self, kinds: Vec<ContentKind>) -> Self { self.kinds = kinds; self }

    pub fn kinds(&self) -> &[ContentKind] { &self.kinds }
    pub fn channels(&self) -> &[String] { &self.channels }

    /// Runs every configured kind concurrently. A failing kind never affects the others.
    pub async fn run_all(&self) -> Vec<KindReport> {
        join_all(self.kinds.iter().map(|k| self.run_kind(*k))).await
    }

    pub async fn run_kind(&self, kind: ContentKind) -> KindReport {
        let mut dispatches = Vec::new();
        let outcome = match self.traverse(kind, &mut dispatches).await {
            Ok(outcome) => outcome,
            Err(e) => {
                stage(kind, Stage::Failed);
                RunOutcome::Failure { error: e.kind(), message: e.to_string() }
            }
        };
        match &outcome {
            RunOutcome::Failure { .. } => warn!(kind = %kind, "{}", outcome),
            _ => info!(kind = %kind, "{}", outcome),
        }
        KindReport { kind, outcome, dispatches }
    }

    async fn traverse(&self, kind: ContentKind, dispatches: &mut Vec<DispatchReport>) -> Result<RunOutcome, RunError> {
        stage(kind, Stage::Loading);
        let seen = self.store.load(kind).await?;

        stage(kind, Stage::Fetching);
        let fetched = self.fetcher.fetch(kind).await?;

        stage(kind, Stage::Detecting);
        let detection = detect(&seen, &fetched);

        if detection.is_first_run {
            stage(kind, Stage::FirstRunPersist);
            self.store.save(kind, &detection.updated_seen).await?;
            stage(kind, Stage::Done);
            return Ok(RunOutcome::FirstRun { baselined: detection.updated_seen.len() });
        }

        stage(kind, Stage::Dispatching);
        // Sorted so logs and reports read the same across runs
        for id in sorted_ids(&detection.new_items) {
            info!(kind = %kind, id = %id, "announcing new {}", kind.label());
            let report = dispatch(self.notifier.as_ref(), kind, &id, &self.channels).await;
            if report.all_failed() {
                warn!(kind = %kind, id = %id, "no channel accepted the announcement; marking seen anyway");
            }
            dispatches.push(report);
        }

        // Notify failures never block this write: identifiers are marked seen even if every channel failed
        stage(kind, Stage::Persisting);
        self.store.save(kind, &detection.updated_seen).await?;

        stage(kind, Stage::Done);
        let failed_channels = dispatches.iter().map(|r| r.failed.len()).sum();
        Ok(RunOutcome::Success { sent: detection.new_items.len(), failed_channels })
    }
}

fn stage(kind: ContentKind, s: Stage) { debug!(kind = %kind, stage = ?s, "run stage"); }
