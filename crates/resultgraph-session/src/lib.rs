//! Result Session
//!
//! Holds the snapshot a user is looking at, plus the UI state the view is
//! computed for, and decides when a newly arrived snapshot replaces it:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        RESULT SESSION                            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   poll / push ──► offer() ──┬── no current ──► install           │
//! │                             └── otherwise  ──► pending (latest)  │
//! │                                                                  │
//! │   "fresh results" ──► resync() ──► pending becomes current       │
//! │                                                                  │
//! │   set_filters / set_sort / set_weights / set_user_saves /        │
//! │   set_selection ──► ViewPipeline::run(current, request)          │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A snapshot is never patched. Every state change recomputes the whole
//! view from the current snapshot and the stored [`ViewRequest`].


use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use resultgraph_core::{
    EngineConfig, EngineError, EngineResult, EvidenceBundle, Filter, PathId, RenderGraph,
    ResultSet, ResultView, ScoreWeights, SortKey, UserSaves, ViewPipeline, ViewRequest,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Core Types
// ============================================================================

/// Unique identifier for a received snapshot
pub type SnapshotId = Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no result snapshot has been received yet")]
    NoSnapshot,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// One received result set.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub received_at: DateTime<Utc>,
    pub set: Arc<ResultSet>,
}

impl Snapshot {
    pub fn new(set: ResultSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            set: Arc::new(set),
        }
    }

    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        ResultSet::from_json_str(json).map(Self::new)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        ResultSet::from_json_file(path).map(Self::new)
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            id: self.id,
            received_at: self.received_at,
            status: self.set.status().as_str().to_string(),
            results: self.set.results().len(),
        }
    }
}

/// Serializable summary of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    pub id: SnapshotId,
    pub received_at: DateTime<Utc>,
    pub status: String,
    pub results: usize,
}

/// What [`ResultSession::offer`] did with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Offer {
    /// Nothing was displayed yet; the snapshot is now current.
    Installed(SnapshotId),
    /// Held until the next resync. `replaced` names an older pending
    /// snapshot that was dropped.
    Pending {
        id: SnapshotId,
        replaced: Option<SnapshotId>,
    },
}

impl Offer {
    pub fn id(&self) -> SnapshotId {
        match self {
            Offer::Installed(id) => *id,
            Offer::Pending { id, .. } => *id,
        }
    }

    /// True when the user should be told fresh results are waiting.
    pub fn fresh_results(&self) -> bool {
        matches!(self, Offer::Pending { .. })
    }
}

#[derive(Debug, Default)]
struct SessionState {
    current: Option<Snapshot>,
    pending: Option<Snapshot>,
    request: ViewRequest,
}

impl SessionState {
    fn current_set(&self) -> SessionResult<Arc<ResultSet>> {
        self.current
            .as_ref()
            .map(|s| Arc::clone(&s.set))
            .ok_or(SessionError::NoSnapshot)
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct ResultSession {
    pipeline: ViewPipeline,
    state: RwLock<SessionState>,
}

impl ResultSession {
    pub fn new(config: EngineConfig) -> Self {
        let request = ViewRequest::default().with_weights(config.weights);
        Self {
            pipeline: ViewPipeline::new(config),
            state: RwLock::new(SessionState {
                request,
                ..SessionState::default()
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.pipeline.config()
    }

    pub fn current(&self) -> Option<Arc<ResultSet>> {
        self.state.read().current.as_ref().map(|s| Arc::clone(&s.set))
    }

    pub fn current_info(&self) -> Option<SnapshotInfo> {
        self.state.read().current.as_ref().map(Snapshot::info)
    }

    pub fn pending_info(&self) -> Option<SnapshotInfo> {
        self.state.read().pending.as_ref().map(Snapshot::info)
    }

    pub fn request(&self) -> ViewRequest {
        self.state.read().request.clone()
    }

    /// Accept a newly received snapshot.
    pub fn offer(&self, snapshot: Snapshot) -> Offer {
        let mut state = self.state.write();
        let id = snapshot.id;
        if state.current.is_none() {
            tracing::debug!(snapshot = %id, results = snapshot.set.results().len(), "installed first snapshot");
            state.current = Some(snapshot);
            return Offer::Installed(id);
        }

        let replaced = state.pending.replace(snapshot).map(|old| old.id);
        if let Some(old) = replaced {
            tracing::debug!(snapshot = %id, replaced = %old, "dropped older pending snapshot");
        }
        Offer::Pending { id, replaced }
    }

    pub fn has_fresh_results(&self) -> bool {
        self.state.read().pending.is_some()
    }

    /// Swap the pending snapshot in and recompute the view.
    ///
    /// Returns `Ok(None)` when nothing is pending. The path selection is
    /// cleared because its ids belong to the old snapshot.
    pub fn resync(&self) -> SessionResult<Option<ResultView>> {
        let (set, request) = {
            let mut state = self.state.write();
            let Some(pending) = state.pending.take() else {
                return Ok(None);
            };
            tracing::debug!(
                snapshot = %pending.id,
                received_at = %pending.received_at,
                "resyncing to pending snapshot"
            );
            state.current = Some(pending);
            state.request.selection = None;
            (state.current_set()?, state.request.clone())
        };
        self.pipeline.run(&set, &request).map(Some).map_err(SessionError::from)
    }

    /// The view for the current snapshot and UI state.
    pub fn view(&self) -> SessionResult<ResultView> {
        let (set, request) = {
            let state = self.state.read();
            (state.current_set()?, state.request.clone())
        };
        Ok(self.pipeline.run(&set, &request)?)
    }

    /// Replace the whole UI state at once.
    pub fn set_request(&self, request: ViewRequest) -> SessionResult<ResultView> {
        self.update(|current| *current = request)
    }

    pub fn set_filters(&self, filters: Vec<Filter>) -> SessionResult<ResultView> {
        self.update(|request| request.filters = filters)
    }

    pub fn set_sort(&self, sort: SortKey) -> SessionResult<ResultView> {
        self.update(|request| request.sort = sort)
    }

    pub fn set_weights(&self, weights: ScoreWeights) -> SessionResult<ResultView> {
        self.update(|request| request.weights = weights)
    }

    /// Flip between the novelty preset and the configured weights.
    pub fn toggle_novelty_boost(&self) -> SessionResult<ResultView> {
        let configured = self.pipeline.config().weights;
        self.update(|request| {
            request.weights = if request.weights == ScoreWeights::novelty_boost() {
                configured
            } else {
                ScoreWeights::novelty_boost()
            };
        })
    }

    pub fn set_user_saves(&self, saves: UserSaves) -> SessionResult<ResultView> {
        self.update(|request| request.user_saves = saves)
    }

    pub fn set_selection(&self, selection: Option<Vec<PathId>>) -> SessionResult<ResultView> {
        self.update(|request| request.selection = selection.map(|ids| ids.into_iter().collect()))
    }

    pub fn evidence(&self, result_id: &str) -> SessionResult<Option<EvidenceBundle>> {
        let set = self.state.read().current_set()?;
        Ok(self.pipeline.evidence_for(&set, result_id))
    }

    pub fn render(&self, result_id: &str) -> SessionResult<Option<RenderGraph>> {
        let set = self.state.read().current_set()?;
        Ok(self.pipeline.render_for(&set, result_id))
    }

    /// Apply a request change, then recompute outside the lock. The change
    /// sticks even when there is no snapshot to show yet.
    fn update(&self, change: impl FnOnce(&mut ViewRequest)) -> SessionResult<ResultView> {
        let (set, request) = {
            let mut state = self.state.write();
            change(&mut state.request);
            (state.current_set()?, state.request.clone())
        };
        Ok(self.pipeline.run(&set, &request)?)
    }
}

impl Default for ResultSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
