//! Pure per-project recompute state machine.
//!
//! No Tokio types and no IO: the async shell in [`super::runtime`] feeds it
//! events and acts on the returned decisions, so every transition can be
//! tested synchronously.

use std::sync::Arc;

use serde::Serialize;

use crate::error::EngineError;
use crate::models::ScheduleResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecomputeState {
    Idle,
    Queued,
    Computing,
    Failed(String),
}

impl RecomputeState {
    /// Idle or failed: nothing is running and nothing is waiting.
    pub fn is_settled(&self) -> bool {
        matches!(self, RecomputeState::Idle | RecomputeState::Failed(_))
    }
}

/// What caused a recompute request. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    TaskEdited,
    DependencyChanged,
    BaselineActivated,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A worker must be started for this project.
    Started,
    /// A run is already queued and will see this edit.
    AlreadyQueued,
    /// A run is in flight; one more run follows it.
    Coalesced,
}

/// Decision after a computation or persist finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Rerun,
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlotStats {
    pub computations: u64,
    pub persisted: u64,
    pub discarded: u64,
    pub failures: u64,
}

#[derive(Debug)]
pub struct ProjectSlot {
    state: RecomputeState,
    pending: bool,
    stats: SlotStats,
    last_result: Option<Arc<ScheduleResult>>,
    last_error: Option<EngineError>,
}

impl Default for ProjectSlot {
    fn default() -> Self {
        Self {
            state: RecomputeState::Idle,
            pending: false,
            stats: SlotStats::default(),
            last_result: None,
            last_error: None,
        }
    }
}

impl ProjectSlot {
    pub fn state(&self) -> &RecomputeState {
        &self.state
    }

    pub fn stats(&self) -> SlotStats {
        self.stats
    }

    pub fn last_result(&self) -> Option<Arc<ScheduleResult>> {
        self.last_result.clone()
    }

    /// Error behind the current `Failed` state.
    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    pub fn on_trigger(&mut self) -> TriggerOutcome {
        match self.state {
            RecomputeState::Idle | RecomputeState::Failed(_) => {
                self.state = RecomputeState::Queued;
                self.last_error = None;
                TriggerOutcome::Started
            }
            RecomputeState::Queued => TriggerOutcome::AlreadyQueued,
            RecomputeState::Computing => {
                self.pending = true;
                TriggerOutcome::Coalesced
            }
        }
    }

    /// The worker picked the job up. Edits from here on need another run.
    pub fn on_start(&mut self) {
        self.state = RecomputeState::Computing;
        self.pending = false;
    }

    /// A computation returned. A result superseded by a newer edit is
    /// dropped without being persisted.
    pub fn on_computed(&mut self) -> NextStep {
        self.stats.computations += 1;
        if self.pending {
            self.stats.discarded += 1;
            self.requeue()
        } else {
            NextStep::Done
        }
    }

    pub fn on_persisted(&mut self, result: Arc<ScheduleResult>) -> NextStep {
        self.stats.persisted += 1;
        self.last_result = Some(result);
        if self.pending {
            self.requeue()
        } else {
            self.state = RecomputeState::Idle;
            NextStep::Done
        }
    }

    /// A failure is terminal unless an edit arrived meanwhile; that edit is
    /// a new request and gets its own run.
    pub fn on_failed(&mut self, err: EngineError) -> NextStep {
        self.stats.failures += 1;
        if self.pending {
            self.requeue()
        } else {
            self.state = RecomputeState::Failed(format!("{}: {err}", err.code().as_str()));
            self.last_error = Some(err);
            NextStep::Done
        }
    }

    fn requeue(&mut self) -> NextStep {
        self.pending = false;
        self.state = RecomputeState::Queued;
        NextStep::Rerun
    }
}
