//! One reconciliation pass: fetch → diff → format → dispatch.
//!
//! The store is borrowed `&mut` for the whole pass, so two passes can never
//! overlap on it. Failure policy:
//! - fetch/parse failure aborts the pass before the store is touched;
//! - dispatch failure is logged and swallowed; the store keeps its advance.

use std::fmt;
use std::sync::Arc;

use ptx_notify::{format_events, DispatchError, MessagePolicy, NotificationSink, Receipt};
use ptx_reconcile::{reconcile, KnownSubmissions, ReportMode, SubmissionEvent};
use ptx_source::{SourceError, SubmissionSource};
use tracing::{debug, error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Fetching,
    Diffing,
    Formatting,
    Dispatching,
}

impl CyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Fetching => "fetching",
            CyclePhase::Diffing => "diffing",
            CyclePhase::Formatting => "formatting",
            CyclePhase::Dispatching => "dispatching",
        }
    }
}

/// What happened to the notification of one pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No events, nothing sent.
    Skipped,
    Sent(Receipt),
    Failed(DispatchError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub new: usize,
    pub changed: usize,
    pub dispatch: DispatchOutcome,
}

impl CycleReport {
    pub fn events(&self) -> usize {
        self.new + self.changed
    }
}

/// A pass that ended in `Fetching`. The store was not touched.
#[derive(Debug, Clone)]
pub enum CycleError {
    Fetch(SourceError),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Fetch(err) => write!(f, "fetching submissions failed: {err}"),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CycleError::Fetch(err) => Some(err),
        }
    }
}

pub struct ReconcileCycle {
    source: Arc<dyn SubmissionSource>,
    sink: Arc<dyn NotificationSink>,
    mode: ReportMode,
    policy: MessagePolicy,
}

impl ReconcileCycle {
    pub fn new(
        source: Arc<dyn SubmissionSource>,
        sink: Arc<dyn NotificationSink>,
        mode: ReportMode,
        policy: MessagePolicy,
    ) -> Self {
        Self {
            source,
            sink,
            mode,
            policy,
        }
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Startup load: fetch once and seed the store without producing events.
    ///
    /// Callers treat an error here as fatal.
    pub async fn baseline(&self, store: &mut KnownSubmissions) -> Result<usize, SourceError> {
        info!(source = self.source.source_name(), "initially downloading submissions");
        let submissions = self.source.fetch_all().await?;
        let fetched = submissions.len();
        let known = store.seed(submissions);
        info!(fetched, known, "baseline loaded without notifications");
        Ok(known)
    }

    /// Run one pass against `store`.
    pub async fn run(&self, store: &mut KnownSubmissions) -> Result<CycleReport, CycleError> {
        info!(mode = self.mode.as_str(), "checking for new submissions");

        debug!(phase = CyclePhase::Fetching.as_str());
        let fresh = match self.source.fetch_all().await {
            Ok(fresh) => fresh,
            Err(err) => {
                error!(error = %err, known = store.len(), "submission fetch failed; cycle aborted");
                debug!(phase = CyclePhase::Idle.as_str());
                return Err(CycleError::Fetch(err));
            }
        };
        let fetched = fresh.len();

        debug!(phase = CyclePhase::Diffing.as_str(), fetched);
        let events = reconcile(store, fresh, self.mode);
        log_events(&events);
        let new = events.iter().filter(|e| e.is_new()).count();
        let changed = events.len() - new;

        debug!(phase = CyclePhase::Formatting.as_str(), events = events.len());
        let payload = format_events(&events, &self.policy);

        let dispatch = match payload {
            None => DispatchOutcome::Skipped,
            Some(payload) => {
                debug!(phase = CyclePhase::Dispatching.as_str(), sink = self.sink.sink_name());
                match self.sink.send(&payload).await {
                    Ok(receipt) => {
                        info!(request = %receipt.request_id, "notifications have been sent successfully");
                        DispatchOutcome::Sent(receipt)
                    }
                    Err(err) => {
                        error!(error = %err, events = events.len(), "sending notifications failed; known state is kept");
                        DispatchOutcome::Failed(err)
                    }
                }
            }
        };

        debug!(phase = CyclePhase::Idle.as_str());
        info!(fetched, new, changed, known = store.len(), "submission check completed");

        Ok(CycleReport {
            fetched,
            new,
            changed,
            dispatch,
        })
    }
}

fn log_events(events: &[SubmissionEvent]) {
    for event in events {
        match event {
            SubmissionEvent::New { submission } => {
                info!(code = %submission.code, "found a new submission");
            }
            SubmissionEvent::Changed { current, diff, .. } => {
                info!(code = %current.code, fields = diff.len(), "found a changed submission");
            }
        }
    }
}
