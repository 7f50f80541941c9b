//! Change-reconciliation driver.
//!
//! [`RiskPipeline`] owns the current collection of normalized risks as an
//! immutable, versioned [`RiskSnapshot`]. Every refresh re-runs
//! fetch → normalize → score from scratch and swaps the whole snapshot; there
//! is no incremental diffing.
//!
//! Concurrency rules:
//! - each refresh takes a generation number before it suspends on the store;
//!   when it resumes, its result is applied only if no newer refresh started
//!   in the meantime
//! - a cancelled pipeline discards whatever arrives afterwards
//! - a failed fetch leaves the previous snapshot in place and records the
//!   error for display

use crate::errors::Result;
use crate::io::csv::write_csv;
use crate::risk::{normalize_risk, Risk};
use crate::store::RiskStore;
use crate::view::{
    filter_and_sort, global_statistics, prepare_view, summarize_categories, CategorySummary,
    GlobalStatistics, PreparedRiskView, RiskMatrix, ViewCriteria,
};
use chrono::{DateTime, Utc};
use im::Vector;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default coalescing window for bursts of change notifications.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// One fully normalized view of the store at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskSnapshot {
    /// Incremented on every applied refresh; 0 before the first one
    pub version: u64,
    pub risks: Vector<Risk>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Raw records dropped because they failed validation
    pub skipped: usize,
}

impl RiskSnapshot {
    pub fn len(&self) -> usize {
        self.risks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.risks.is_empty()
    }
}

/// What a call to [`RiskPipeline::refresh`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { version: u64, count: usize },
    /// A newer refresh started while this one was in flight
    Stale,
    Cancelled,
}

#[derive(Debug, Default)]
struct PipelineState {
    snapshot: Arc<RiskSnapshot>,
    last_error: Option<String>,
}

pub struct RiskPipeline<S: RiskStore> {
    store: Arc<S>,
    organization_id: String,
    project_id: Option<String>,
    state: RwLock<PipelineState>,
    generation: AtomicU64,
    cancelled: AtomicBool,
    criteria: RwLock<ViewCriteria>,
    debounce: Duration,
}

impl<S: RiskStore> RiskPipeline<S> {
    pub fn new(store: Arc<S>, organization_id: impl Into<String>) -> Self {
        Self {
            store,
            organization_id: organization_id.into(),
            project_id: None,
            state: RwLock::new(PipelineState::default()),
            generation: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            criteria: RwLock::new(ViewCriteria::default()),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Restrict fetches to a single project.
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Zero disables coalescing.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_criteria(self, criteria: ViewCriteria) -> Self {
        *self.criteria.write() = criteria;
        self
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetch, normalize and score the whole collection, then swap it in.
    ///
    /// Records that fail validation are skipped with a warning. A fetch error
    /// is returned to the caller and recorded, unless a newer refresh has
    /// superseded this one.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        if self.is_cancelled() {
            return Ok(RefreshOutcome::Cancelled);
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!(
            "Refresh #{} for organization '{}'",
            generation,
            self.organization_id
        );

        let fetched = self
            .store
            .list_risks(&self.organization_id, self.project_id.as_deref())
            .await;

        if self.is_cancelled() {
            log::debug!("Discarding refresh #{}: pipeline cancelled", generation);
            return Ok(RefreshOutcome::Cancelled);
        }
        if !self.is_latest(generation) {
            log::warn!("Discarding stale refresh #{}", generation);
            return Ok(RefreshOutcome::Stale);
        }

        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Fetch failed, keeping previous risks: {}", e);
                self.state.write().last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let now = Utc::now();
        let mut risks = Vector::new();
        let mut skipped = 0;
        for record in &raw {
            match normalize_risk(record, None, now) {
                Ok(risk) => risks.push_back(risk),
                Err(e) => {
                    skipped += 1;
                    log::warn!(
                        "Skipping record {}: {}",
                        record.id.as_deref().unwrap_or("<no id>"),
                        e
                    );
                }
            }
        }

        let mut state = self.state.write();
        if !self.is_latest(generation) {
            log::warn!("Discarding stale refresh #{}", generation);
            return Ok(RefreshOutcome::Stale);
        }
        let version = state.snapshot.version + 1;
        let count = risks.len();
        state.snapshot = Arc::new(RiskSnapshot {
            version,
            risks,
            fetched_at: Some(now),
            skipped,
        });
        state.last_error = None;
        log::debug!("Applied snapshot v{} with {} risks", version, count);
        Ok(RefreshOutcome::Applied { version, count })
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    pub fn snapshot(&self) -> Arc<RiskSnapshot> {
        Arc::clone(&self.state.read().snapshot)
    }

    /// Error of the most recent refresh, cleared by the next successful one.
    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Stop applying results. In-flight refreshes finish but are discarded.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn criteria(&self) -> ViewCriteria {
        self.criteria.read().clone()
    }

    /// Criteria used by the aggregate accessors below.
    pub fn set_criteria(&self, criteria: ViewCriteria) {
        *self.criteria.write() = criteria;
    }

    pub fn filtered_sorted_risks(&self, criteria: &ViewCriteria) -> Vec<Risk> {
        filter_and_sort(self.snapshot().risks.iter(), criteria)
    }

    fn selected(&self) -> Vec<Risk> {
        self.filtered_sorted_risks(&self.criteria())
    }

    pub fn matrix(&self) -> RiskMatrix {
        RiskMatrix::build(&self.selected())
    }

    /// Summaries in category order.
    pub fn category_summaries(&self) -> Vec<CategorySummary> {
        let top_risks = self.criteria.read().top_risks;
        summarize_categories(&self.selected(), top_risks)
            .into_values()
            .collect()
    }

    pub fn global_statistics(&self) -> GlobalStatistics {
        global_statistics(&self.selected(), Utc::now())
    }

    pub fn current_view(&self) -> PreparedRiskView {
        self.view_at(Utc::now())
    }

    pub fn view_at(&self, now: DateTime<Utc>) -> PreparedRiskView {
        prepare_view(self.snapshot().risks.iter(), &self.criteria(), now)
    }

    /// Write the filtered, sorted list as CSV; returns the number of rows.
    pub async fn export_csv(&self, criteria: &ViewCriteria, path: &Path) -> Result<usize> {
        let risks = self.filtered_sorted_risks(criteria);
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &risks)?;
        tokio::fs::write(path, buffer).await?;
        log::debug!("Exported {} risks to {}", risks.len(), path.display());
        Ok(risks.len())
    }

    /// Refresh whenever the store reports a change for this organization.
    ///
    /// Notifications arriving within the debounce window are coalesced into
    /// one refresh. Dropping the returned handle stops the watcher.
    pub fn watch(self: &Arc<Self>) -> WatchHandle {
        let mut subscription = self.store.subscribe(&self.organization_id);
        let pipeline = Arc::clone(self);
        let task = tokio::spawn(async move {
            while subscription.changed().await {
                if pipeline.is_cancelled() {
                    break;
                }
                if !pipeline.debounce.is_zero() {
                    tokio::time::sleep(pipeline.debounce).await;
                }
                let coalesced = subscription.drain();
                if coalesced > 0 {
                    log::debug!("Coalesced {} further change notifications", coalesced);
                }
                if let Err(e) = pipeline.refresh().await {
                    log::warn!("Refresh after change notification failed: {}", e);
                }
            }
            log::debug!("Change watcher for '{}' stopped", pipeline.organization_id);
        });
        WatchHandle { task }
    }
}

/// Keeps a change watcher alive; dropping it aborts the watcher task.
#[derive(Debug)]
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn stop(self) {}

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
