//! Operations exposed to the CRUD layer.
//!
//! Every call takes a full [`ProjectKey`]; ids from another organization,
//! workspace or project are reported as not found or as a scope mismatch.
//! Schedule and earned value passes for one project hold that project's
//! lock, so they never overlap, whether called directly or through the
//! recompute coordinator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, NegativeFloatPolicy};
use crate::coordinator::ProjectLocks;
use crate::db::{
    baseline_repo, dependency_repo, earned_value_repo, project_repo, schedule_repo, task_repo,
    SnapshotSource, Store,
};
use crate::error::{EngineError, Result};
use crate::evm;
use crate::graph::cycle;
use crate::models::{
    BaselineItem, Dependency, EarnedValueSnapshot, ProjectKey, ProjectSnapshot, ScheduleBaseline,
    ScheduleResult, TaskVariance,
};
use crate::schedule::compute_schedule;

pub struct ScheduleEngine {
    store: Store,
    source: Arc<dyn SnapshotSource>,
    config: EngineConfig,
    locks: ProjectLocks,
}

impl ScheduleEngine {
    pub fn new(store: Store, config: EngineConfig) -> Self {
        let source: Arc<dyn SnapshotSource> = Arc::new(store.clone());
        Self {
            store,
            source,
            config,
            locks: ProjectLocks::new(),
        }
    }

    /// Read task/edge snapshots from somewhere other than the engine store.
    pub fn with_source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.source = source;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a snapshot, retrying transient failures `read_retries` times.
    pub fn load_snapshot(&self, key: &ProjectKey) -> Result<ProjectSnapshot> {
        let mut attempt = 0;
        loop {
            match self.source.load_snapshot(key) {
                Err(e) if e.is_transient() && attempt < self.config.read_retries => {
                    attempt += 1;
                    debug!(project = %key, attempt, error = %e, "retrying snapshot read");
                }
                other => return other,
            }
        }
    }

    /// Run the passes without writing anything.
    pub fn compute(&self, key: &ProjectKey) -> Result<ScheduleResult> {
        self.locks.run(key, || self.compute_held(key))
    }

    /// Caller holds `key`'s lock.
    fn compute_held(&self, key: &ProjectKey) -> Result<ScheduleResult> {
        let snapshot = self.load_snapshot(key)?;
        compute_schedule(&snapshot, self.config.max_lag_minutes)
    }

    pub fn persist(&self, result: &ScheduleResult) -> Result<()> {
        self.store.transaction(|conn| schedule_repo::save_schedule(conn, result))
    }

    /// Compute and store the schedule. Structural errors leave the previously
    /// stored schedule untouched.
    pub fn recompute(&self, key: &ProjectKey) -> Result<ScheduleResult> {
        let result = self.compute(key)?;
        self.persist(&result)?;
        info!(
            project = %key,
            tasks = result.tasks.len(),
            critical = result.critical_path.len(),
            warnings = result.warnings.len(),
            "recompute finished"
        );
        Ok(result)
    }

    pub fn latest_schedule(&self, key: &ProjectKey) -> Result<Option<ScheduleResult>> {
        self.store.with_conn(|conn| {
            project_repo::get_project(conn, key)?;
            schedule_repo::load_schedule(conn, key)
        })
    }

    /// Add an edge after checking both ends live in the project and that it
    /// keeps the graph acyclic.
    pub fn add_dependency(&self, key: &ProjectKey, dep: &Dependency) -> Result<()> {
        if dep.lag_minutes.abs() > self.config.max_lag_minutes {
            return Err(EngineError::LagOutOfRange {
                predecessor: dep.predecessor_id.clone(),
                successor: dep.successor_id.clone(),
                lag_minutes: dep.lag_minutes,
                limit: self.config.max_lag_minutes,
            });
        }
        if dep.predecessor_id == dep.successor_id {
            return Err(EngineError::SelfLoop(dep.predecessor_id.clone()));
        }
        self.store.transaction(|conn| {
            project_repo::get_project(conn, key)?;
            task_repo::get_task(conn, &key.project_id, &dep.predecessor_id)?;
            task_repo::get_task(conn, &key.project_id, &dep.successor_id)?;

            let nodes: Vec<String> = task_repo::list_tasks(conn, &key.project_id)?
                .into_iter()
                .map(|t| t.id)
                .collect();
            let edges: Vec<(String, String)> = dependency_repo::list_dependencies(conn, &key.project_id)?
                .into_iter()
                .map(|d| (d.predecessor_id, d.successor_id))
                .collect();
            cycle::would_create_cycle(&nodes, &edges, &dep.predecessor_id, &dep.successor_id)?;

            dependency_repo::add_dependency(conn, &key.project_id, dep)
        })
    }

    /// Snapshot the current schedule into a new locked baseline.
    pub fn create_baseline(&self, key: &ProjectKey, name: &str, created_by: Option<&str>) -> Result<ScheduleBaseline> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::validation("Baseline name is required"));
        }
        self.locks.run(key, || self.create_baseline_held(key, name, created_by))
    }

    fn create_baseline_held(&self, key: &ProjectKey, name: &str, created_by: Option<&str>) -> Result<ScheduleBaseline> {
        let schedule = self.compute_held(key)?;
        if !schedule.is_feasible() {
            let infeasible = infeasible_error(&schedule);
            match self.config.negative_float_policy {
                NegativeFloatPolicy::Reject => return Err(infeasible),
                NegativeFloatPolicy::Warn => warn!(project = %key, "{infeasible}; baselining anyway"),
            }
        }

        let now = Utc::now();
        let baseline = ScheduleBaseline {
            id: ulid::Ulid::new().to_string(),
            project_id: key.project_id.clone(),
            name: name.to_string(),
            created_by: created_by.map(str::to_string),
            created_at: now,
            locked: false,
            is_active: false,
        };
        let items: Vec<BaselineItem> = schedule
            .tasks
            .iter()
            .map(|t| BaselineItem {
                baseline_id: baseline.id.clone(),
                task_id: t.task_id.clone(),
                planned_start: t.early_start,
                planned_end: t.early_finish,
                duration_minutes: t.duration_minutes,
                critical_path: t.critical,
                total_float_minutes: t.total_float_minutes,
                captured_at: now,
            })
            .collect();

        let saved = self.store.transaction(|conn| {
            project_repo::get_project(conn, key)?;
            baseline_repo::insert_locked_baseline(conn, &baseline, &items)
        })?;
        info!(project = %key, baseline = %saved.id, items = items.len(), "baseline created");
        Ok(saved)
    }

    /// Make `baseline_id` the single active baseline of its project.
    pub fn activate_baseline(&self, key: &ProjectKey, baseline_id: &str) -> Result<ScheduleBaseline> {
        let activated = self.store.transaction(|conn| {
            project_repo::get_project(conn, key)?;
            let baseline = scoped_baseline(conn, key, baseline_id)?;
            baseline_repo::activate(conn, &baseline)?;
            baseline_repo::get_baseline(conn, baseline_id)
        })?;
        info!(project = %key, baseline = %baseline_id, "baseline activated");
        Ok(activated)
    }

    pub fn list_baselines(&self, key: &ProjectKey) -> Result<Vec<ScheduleBaseline>> {
        self.store.with_conn(|conn| {
            project_repo::get_project(conn, key)?;
            baseline_repo::list_baselines(conn, &key.project_id)
        })
    }

    pub fn baseline_items(&self, key: &ProjectKey, baseline_id: &str) -> Result<Vec<BaselineItem>> {
        self.store.with_conn(|conn| {
            project_repo::get_project(conn, key)?;
            scoped_baseline(conn, key, baseline_id)?;
            baseline_repo::list_items(conn, baseline_id)
        })
    }

    /// Administrative delete of a baseline and its items.
    pub fn purge_baseline(&self, key: &ProjectKey, baseline_id: &str) -> Result<()> {
        self.store.transaction(|conn| {
            project_repo::get_project(conn, key)?;
            scoped_baseline(conn, key, baseline_id)?;
            baseline_repo::purge(conn, baseline_id)
        })?;
        warn!(project = %key, baseline = %baseline_id, "baseline purged");
        Ok(())
    }

    /// Start/finish slippage of the current schedule against the active
    /// baseline. `None` when no baseline is active.
    pub fn baseline_variance(&self, key: &ProjectKey) -> Result<Option<Vec<TaskVariance>>> {
        self.locks.run(key, || self.baseline_variance_held(key))
    }

    fn baseline_variance_held(&self, key: &ProjectKey) -> Result<Option<Vec<TaskVariance>>> {
        let Some((_, items)) = self.active_baseline_with_items(key)? else {
            return Ok(None);
        };
        let schedule = self.compute_held(key)?;
        let current: HashMap<&str, _> = schedule.tasks.iter().map(|t| (t.task_id.as_str(), t)).collect();

        let variance = items
            .iter()
            .filter_map(|item| {
                current.get(item.task_id.as_str()).map(|now| TaskVariance {
                    task_id: item.task_id.clone(),
                    baseline_start: item.planned_start,
                    baseline_finish: item.planned_end,
                    current_start: now.early_start,
                    current_finish: now.early_finish,
                    start_variance_minutes: (now.early_start - item.planned_start).num_minutes(),
                    finish_variance_minutes: (now.early_finish - item.planned_end).num_minutes(),
                })
            })
            .collect();
        Ok(Some(variance))
    }

    /// Compute and store EVM figures for `as_of` against the active
    /// baseline. `None` when the project has no active baseline.
    /// Baseline, items and task progress come from one read transaction.
    pub fn compute_earned_value(&self, key: &ProjectKey, as_of: NaiveDate) -> Result<Option<EarnedValueSnapshot>> {
        self.locks.run(key, || self.compute_earned_value_held(key, as_of))
    }

    fn compute_earned_value_held(&self, key: &ProjectKey, as_of: NaiveDate) -> Result<Option<EarnedValueSnapshot>> {
        let inputs = self.store.transaction(|conn| {
            project_repo::get_project(conn, key)?;
            let Some(baseline) = baseline_repo::active_baseline(conn, &key.project_id)? else {
                return Ok(None);
            };
            let items = baseline_repo::list_items(conn, &baseline.id)?;
            let tasks = task_repo::list_tasks(conn, &key.project_id)?;
            Ok(Some((baseline, items, tasks)))
        })?;
        let Some((baseline, items, tasks)) = inputs else {
            debug!(project = %key, "no active baseline; earned value undefined");
            return Ok(None);
        };
        let metrics = evm::calculate(&tasks, &items, as_of);

        let ev_snapshot = EarnedValueSnapshot {
            project_id: key.project_id.clone(),
            as_of_date: as_of,
            baseline_id: Some(baseline.id),
            bac: metrics.bac,
            pv: metrics.pv,
            ev: metrics.ev,
            ac: metrics.ac,
            cpi: metrics.cpi,
            spi: metrics.spi,
            eac: metrics.eac,
            etc: metrics.etc,
            vac: metrics.vac,
            computed_at: Utc::now(),
        };
        self.store
            .transaction(|conn| earned_value_repo::upsert_snapshot(conn, &ev_snapshot))?;
        info!(project = %key, %as_of, pv = metrics.pv, ev = metrics.ev, ac = metrics.ac, "earned value stored");
        Ok(Some(ev_snapshot))
    }

    /// Stored snapshot for one day, if it was computed.
    pub fn earned_value_on(&self, key: &ProjectKey, as_of: NaiveDate) -> Result<Option<EarnedValueSnapshot>> {
        self.store.with_conn(|conn| {
            project_repo::get_project(conn, key)?;
            earned_value_repo::get_snapshot(conn, &key.project_id, as_of)
        })
    }

    pub fn earned_value_history(&self, key: &ProjectKey) -> Result<Vec<EarnedValueSnapshot>> {
        self.store.with_conn(|conn| {
            project_repo::get_project(conn, key)?;
            earned_value_repo::history(conn, &key.project_id)
        })
    }

    fn active_baseline_with_items(&self, key: &ProjectKey) -> Result<Option<(ScheduleBaseline, Vec<BaselineItem>)>> {
        self.store.with_conn(|conn| {
            project_repo::get_project(conn, key)?;
            match baseline_repo::active_baseline(conn, &key.project_id)? {
                Some(baseline) => {
                    let items = baseline_repo::list_items(conn, &baseline.id)?;
                    Ok(Some((baseline, items)))
                }
                None => Ok(None),
            }
        })
    }
}

fn scoped_baseline(conn: &rusqlite::Connection, key: &ProjectKey, baseline_id: &str) -> Result<ScheduleBaseline> {
    let baseline = baseline_repo::get_baseline(conn, baseline_id)?;
    if baseline.project_id != key.project_id {
        return Err(EngineError::ScopeMismatch {
            entity: "baseline",
            id: baseline_id.to_string(),
            project_id: key.project_id.clone(),
        });
    }
    Ok(baseline)
}

fn infeasible_error(schedule: &ScheduleResult) -> EngineError {
    let negative: Vec<_> = schedule.negative_float_tasks().collect();
    let worst = negative
        .iter()
        .min_by(|a, b| {
            a.total_float_minutes
                .cmp(&b.total_float_minutes)
                .then_with(|| a.task_id.cmp(&b.task_id))
        })
        .map(|t| (t.task_id.clone(), t.total_float_minutes))
        .unwrap_or_default();
    EngineError::NoFeasibleSchedule {
        task_ids: negative.iter().map(|t| t.task_id.clone()).collect(),
        worst_task: worst.0,
        worst_float_minutes: worst.1,
    }
}
