//! Async shell around [`ProjectSlot`].
//!
//! One worker task per busy project. The CPU-bound passes and the database
//! writes run on the blocking pool; different projects proceed in parallel
//! while a single project never has two computations in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::core::{NextStep, ProjectSlot, RecomputeState, SlotStats, TriggerOutcome, TriggerReason};
use crate::engine::ScheduleEngine;
use crate::error::{EngineError, Result};
use crate::models::{ProjectKey, ScheduleResult};

/// The work a recompute performs. Split in two so a superseded result can
/// be dropped before it is written.
pub trait RecomputeJob: Send + Sync + 'static {
    fn compute(&self, key: &ProjectKey) -> Result<ScheduleResult>;
    fn persist(&self, result: &ScheduleResult) -> Result<()>;
}

impl RecomputeJob for ScheduleEngine {
    fn compute(&self, key: &ProjectKey) -> Result<ScheduleResult> {
        ScheduleEngine::compute(self, key)
    }

    fn persist(&self, result: &ScheduleResult) -> Result<()> {
        ScheduleEngine::persist(self, result)
    }
}

struct Entry {
    slot: ProjectSlot,
    state_tx: watch::Sender<RecomputeState>,
}

impl Entry {
    fn new() -> Self {
        let (state_tx, _) = watch::channel(RecomputeState::Idle);
        Self {
            slot: ProjectSlot::default(),
            state_tx,
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.slot.state().clone());
    }
}

type Slots = Arc<Mutex<HashMap<ProjectKey, Entry>>>;

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<ProjectKey, Entry>> {
    // Slot updates are single assignments; a panic cannot leave one half done.
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_entry<T>(slots: &Slots, key: &ProjectKey, f: impl FnOnce(&mut Entry) -> T) -> T {
    let mut guard = lock(slots);
    let entry = guard.entry(key.clone()).or_insert_with(Entry::new);
    let out = f(entry);
    entry.publish();
    out
}

pub struct RecomputeCoordinator<J> {
    job: Arc<J>,
    slots: Slots,
    handle: Handle,
}

impl<J> Clone for RecomputeCoordinator<J> {
    fn clone(&self) -> Self {
        Self {
            job: Arc::clone(&self.job),
            slots: Arc::clone(&self.slots),
            handle: self.handle.clone(),
        }
    }
}

impl<J: RecomputeJob> RecomputeCoordinator<J> {
    pub fn new(job: Arc<J>, handle: Handle) -> Self {
        Self {
            job,
            slots: Arc::new(Mutex::new(HashMap::new())),
            handle,
        }
    }

    /// Request a recompute. Never blocks on the computation itself.
    pub fn trigger(&self, key: &ProjectKey, reason: TriggerReason) -> TriggerOutcome {
        let outcome = with_entry(&self.slots, key, |entry| entry.slot.on_trigger());
        debug!(project = %key, ?reason, ?outcome, "recompute requested");
        if outcome == TriggerOutcome::Started {
            self.handle.spawn(run_worker(
                Arc::clone(&self.job),
                Arc::clone(&self.slots),
                key.clone(),
            ));
        }
        outcome
    }

    pub fn state(&self, key: &ProjectKey) -> RecomputeState {
        lock(&self.slots)
            .get(key)
            .map(|e| e.slot.state().clone())
            .unwrap_or(RecomputeState::Idle)
    }

    pub fn stats(&self, key: &ProjectKey) -> SlotStats {
        lock(&self.slots).get(key).map(|e| e.slot.stats()).unwrap_or_default()
    }

    /// The last schedule this coordinator persisted for `key`.
    pub fn last_result(&self, key: &ProjectKey) -> Option<Arc<ScheduleResult>> {
        lock(&self.slots).get(key).and_then(|e| e.slot.last_result())
    }

    pub fn last_error(&self, key: &ProjectKey) -> Option<EngineError> {
        lock(&self.slots).get(key).and_then(|e| e.slot.last_error().cloned())
    }

    pub fn subscribe(&self, key: &ProjectKey) -> watch::Receiver<RecomputeState> {
        let mut guard = lock(&self.slots);
        guard
            .entry(key.clone())
            .or_insert_with(Entry::new)
            .state_tx
            .subscribe()
    }

    /// Wait until the project is idle or failed.
    pub async fn settled(&self, key: &ProjectKey) -> RecomputeState {
        let mut rx = self.subscribe(key);
        let state = match rx.wait_for(RecomputeState::is_settled).await {
            Ok(state) => (*state).clone(),
            Err(_) => self.state(key),
        };
        state
    }

    /// Drop bookkeeping for settled projects nobody is watching. Slots are
    /// otherwise kept so stats and the last result stay queryable; a host
    /// serving many projects calls this periodically. Returns how many
    /// slots were dropped.
    pub fn prune_settled(&self) -> usize {
        let mut guard = lock(&self.slots);
        let before = guard.len();
        guard.retain(|_, entry| !entry.slot.state().is_settled() || entry.state_tx.receiver_count() > 0);
        let dropped = before - guard.len();
        if dropped > 0 {
            debug!(dropped, remaining = guard.len(), "pruned settled recompute slots");
        }
        dropped
    }
}

async fn run_worker<J: RecomputeJob>(job: Arc<J>, slots: Slots, key: ProjectKey) {
    loop {
        with_entry(&slots, &key, |entry| entry.slot.on_start());

        let compute_key = key.clone();
        let step = match run_blocking(&job, move |job| job.compute(&compute_key)).await {
            Ok(result) => {
                if with_entry(&slots, &key, |entry| entry.slot.on_computed()) == NextStep::Rerun {
                    warn!(project = %key, "schedule superseded by a newer edit; discarding");
                    continue;
                }
                let result = Arc::new(result);
                let to_persist = Arc::clone(&result);
                match run_blocking(&job, move |job| job.persist(&to_persist)).await {
                    Ok(()) => {
                        info!(project = %key, tasks = result.tasks.len(), "schedule persisted");
                        with_entry(&slots, &key, |entry| entry.slot.on_persisted(result))
                    }
                    Err(e) => fail(&slots, &key, e),
                }
            }
            Err(e) => fail(&slots, &key, e),
        };

        if step == NextStep::Done {
            break;
        }
    }
}

fn fail(slots: &Slots, key: &ProjectKey, err: EngineError) -> NextStep {
    if err.is_structural() {
        warn!(project = %key, code = err.code().as_str(), "recompute rejected: {err}");
    } else {
        error!(project = %key, code = err.code().as_str(), "recompute failed: {err}");
    }
    with_entry(slots, key, |entry| entry.slot.on_failed(err))
}

async fn run_blocking<J, T, F>(job: &Arc<J>, f: F) -> Result<T>
where
    J: RecomputeJob,
    T: Send + 'static,
    F: FnOnce(&J) -> Result<T> + Send + 'static,
{
    let job = Arc::clone(job);
    tokio::task::spawn_blocking(move || f(&*job))
        .await
        .unwrap_or_else(|e| Err(EngineError::validation(format!("recompute worker stopped: {e}"))))
}
