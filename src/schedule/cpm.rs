//! Critical path method: forward and backward passes over a validated graph.
//!
//! All arithmetic is integer minutes relative to the project's
//! `schedule_from` anchor; dates are materialised only when building the
//! result.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::graph::{topological_order, ProjectGraph};
use crate::models::{ProjectSnapshot, ScheduleResult, ScheduleWarning, Task, TaskSchedule};
use crate::schedule::constraint::{ConstraintBounds, ConstraintResolver};

struct PassState {
    duration: Vec<i64>,
    bounds: Vec<ConstraintBounds>,
    early_start: Vec<i64>,
    early_finish: Vec<i64>,
    late_start: Vec<i64>,
    late_finish: Vec<i64>,
    violated: Vec<bool>,
}

/// Validate the snapshot and run both passes.
pub fn compute_schedule(snapshot: &ProjectSnapshot, max_lag_minutes: i64) -> Result<ScheduleResult> {
    let project = &snapshot.project;
    let graph = ProjectGraph::build(
        &project.key.project_id,
        &snapshot.tasks,
        &snapshot.dependencies,
        max_lag_minutes,
    )?;

    // Graph indices are sorted by id; line tasks up with them.
    let mut tasks: Vec<&Task> = snapshot.tasks.iter().collect();
    tasks.sort_by(|a, b| a.id.cmp(&b.id));
    for task in &tasks {
        task.validate()?;
    }

    let resolver = ConstraintResolver::new(project.schedule_from);
    let order = topological_order(&graph);
    if order.len() != graph.len() {
        return Err(EngineError::validation("topological order is incomplete"));
    }

    let mut state = init_state(&tasks, &resolver)?;
    forward_pass(&graph, &order, &mut state);

    let project_finish = match project.deadline {
        Some(deadline) => resolver.offset_of(deadline),
        None => state.early_finish.iter().copied().max().unwrap_or(0),
    };
    backward_pass(&graph, &order, &mut state, project_finish);

    let result = assemble(snapshot, &graph, &order, &tasks, &state, project_finish)?;
    debug!(
        project = %project.key,
        tasks = result.tasks.len(),
        edges = graph.edge_count(),
        critical = result.critical_path.len(),
        warnings = result.warnings.len(),
        "schedule computed"
    );
    Ok(result)
}

fn init_state(tasks: &[&Task], resolver: &ConstraintResolver) -> Result<PassState> {
    let n = tasks.len();
    let mut duration = Vec::with_capacity(n);
    let mut bounds = Vec::with_capacity(n);
    for task in tasks {
        let minutes = task.effective_duration()?;
        bounds.push(resolver.resolve(task, minutes));
        duration.push(minutes);
    }
    Ok(PassState {
        duration,
        bounds,
        early_start: vec![0; n],
        early_finish: vec![0; n],
        late_start: vec![0; n],
        late_finish: vec![0; n],
        violated: vec![false; n],
    })
}

fn forward_pass(graph: &ProjectGraph, order: &[usize], state: &mut PassState) {
    for &i in order {
        // Nothing starts before the anchor, whatever the lead time.
        let driven = graph
            .predecessors(i)
            .iter()
            .map(|&(p, lag)| state.early_finish[p] + lag)
            .max()
            .unwrap_or(0)
            .max(0);
        let start = state.bounds[i].clamp_start(driven);
        let finish = start + state.duration[i];
        state.early_start[i] = start;
        state.early_finish[i] = finish;
        state.violated[i] = state.bounds[i].is_violated(finish);
    }
}

fn backward_pass(graph: &ProjectGraph, order: &[usize], state: &mut PassState, project_finish: i64) {
    for &i in order.iter().rev() {
        let driven = graph
            .successors(i)
            .iter()
            .map(|&(s, lag)| state.late_start[s] - lag)
            .min()
            .unwrap_or(project_finish);
        let finish = state.bounds[i].clamp_finish(driven);
        state.late_finish[i] = finish;
        state.late_start[i] = finish - state.duration[i];
    }
}

fn assemble(
    snapshot: &ProjectSnapshot,
    graph: &ProjectGraph,
    order: &[usize],
    tasks: &[&Task],
    state: &PassState,
    project_finish: i64,
) -> Result<ScheduleResult> {
    let anchor = snapshot.project.schedule_from;
    let at = |offset: i64| -> Result<DateTime<Utc>> {
        Duration::try_minutes(offset)
            .and_then(|d| anchor.checked_add_signed(d))
            .ok_or_else(|| {
                EngineError::validation(format!(
                    "schedule offset of {offset} minutes from {anchor} is outside the supported date range"
                ))
            })
    };

    let mut scheduled = Vec::with_capacity(order.len());
    let mut critical_path = Vec::new();
    let mut warnings = Vec::new();

    for &i in order {
        let task = tasks[i];
        let total_float = state.late_start[i] - state.early_start[i];
        let free_float = graph
            .successors(i)
            .iter()
            .map(|&(s, lag)| state.early_start[s] - lag - state.early_finish[i])
            .min()
            .unwrap_or(project_finish - state.early_finish[i]);
        let critical = total_float == 0;

        if state.violated[i] {
            if let Some(date) = task.constraint_date {
                warn!(task = %task.id, constraint = task.constraint_type.as_str(), "constraint violated");
                warnings.push(ScheduleWarning::ConstraintViolated {
                    task_id: task.id.clone(),
                    constraint: task.constraint_type,
                    constraint_date: date,
                });
            }
        }
        if total_float < 0 {
            warn!(task = %task.id, float_minutes = total_float, "negative float");
            warnings.push(ScheduleWarning::NegativeFloat {
                task_id: task.id.clone(),
                float_minutes: total_float,
            });
        }
        if critical {
            critical_path.push(task.id.clone());
        }

        scheduled.push(TaskSchedule {
            task_id: graph.id(i).to_string(),
            duration_minutes: state.duration[i],
            early_start: at(state.early_start[i])?,
            early_finish: at(state.early_finish[i])?,
            late_start: at(state.late_start[i])?,
            late_finish: at(state.late_finish[i])?,
            total_float_minutes: total_float,
            free_float_minutes: free_float,
            critical,
            constraint_violated: state.violated[i],
        });
    }

    Ok(ScheduleResult {
        project: snapshot.project.key.clone(),
        schedule_from: anchor,
        project_finish: at(project_finish)?,
        tasks: scheduled,
        critical_path,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConstraintType, Dependency, Project, ProjectKey, MAX_DURATION_MINUTES, MAX_LAG_MINUTES};
    use chrono::TimeZone;

    const HOUR: i64 = 60;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap()
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        anchor() + Duration::minutes(minutes)
    }

    fn snapshot(tasks: Vec<Task>, dependencies: Vec<Dependency>) -> ProjectSnapshot {
        ProjectSnapshot {
            project: Project {
                key: ProjectKey::new("org", "ws", "p"),
                name: "Test".into(),
                schedule_from: anchor(),
                deadline: None,
            },
            tasks,
            dependencies,
        }
    }

    fn task(id: &str, minutes: i64) -> Task {
        Task::new(id, "p").with_duration(minutes)
    }

    fn run(snap: &ProjectSnapshot) -> ScheduleResult {
        compute_schedule(snap, MAX_LAG_MINUTES).unwrap()
    }

    /// a(2h) -> b(4h) -> d(1h), a -> c(1h) -> d
    fn diamond() -> ProjectSnapshot {
        snapshot(
            vec![task("a", 2 * HOUR), task("b", 4 * HOUR), task("c", HOUR), task("d", HOUR)],
            vec![
                Dependency::new("a", "b"),
                Dependency::new("a", "c"),
                Dependency::new("b", "d"),
                Dependency::new("c", "d"),
            ],
        )
    }

    #[test]
    fn test_diamond_forward_and_backward() {
        let r = run(&diamond());
        let a = r.task("a").unwrap();
        let c = r.task("c").unwrap();
        let d = r.task("d").unwrap();

        assert_eq!(a.early_start, anchor());
        assert_eq!(d.early_start, at(6 * HOUR));
        assert_eq!(d.early_finish, at(7 * HOUR));
        assert_eq!(r.project_finish, at(7 * HOUR));

        assert_eq!(c.early_start, at(2 * HOUR));
        assert_eq!(c.late_start, at(5 * HOUR));
        assert_eq!(c.total_float_minutes, 3 * HOUR);
        assert_eq!(c.free_float_minutes, 3 * HOUR);
        assert!(!c.critical);

        assert_eq!(r.critical_path, vec!["a", "b", "d"]);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_duration_identity_holds() {
        let r = run(&diamond());
        for t in &r.tasks {
            assert_eq!((t.early_finish - t.early_start).num_minutes(), t.duration_minutes);
            assert_eq!((t.late_finish - t.late_start).num_minutes(), t.duration_minutes);
        }
    }

    #[test]
    fn test_lag_and_lead() {
        let snap = snapshot(
            vec![task("a", HOUR), task("b", HOUR), task("c", HOUR)],
            vec![Dependency::new("a", "b").with_lag(30), Dependency::new("b", "c").with_lag(-20)],
        );
        let r = run(&snap);
        assert_eq!(r.task("b").unwrap().early_start, at(90));
        assert_eq!(r.task("c").unwrap().early_start, at(130));
        assert_eq!(r.critical_path, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_lead_never_precedes_anchor() {
        let snap = snapshot(
            vec![task("a", 10), task("b", HOUR)],
            vec![Dependency::new("a", "b").with_lag(-HOUR)],
        );
        let r = run(&snap);
        assert_eq!(r.task("b").unwrap().early_start, anchor());
    }

    #[test]
    fn test_milestone_has_zero_duration() {
        let snap = snapshot(
            vec![task("a", HOUR), Task::new("m", "p").with_duration(500).milestone()],
            vec![Dependency::new("a", "m")],
        );
        let m = run(&snap).task("m").unwrap().clone();
        assert_eq!(m.duration_minutes, 0);
        assert_eq!(m.early_start, m.early_finish);
        assert_eq!(m.early_start, at(HOUR));
    }

    #[test]
    fn test_start_no_earlier_than_anchors_root() {
        let snap = snapshot(
            vec![task("a", HOUR).with_constraint(ConstraintType::StartNoEarlierThan, at(5 * HOUR))],
            vec![],
        );
        let r = run(&snap);
        assert_eq!(r.task("a").unwrap().early_start, at(5 * HOUR));
        assert_eq!(r.critical_path, vec!["a"]);
    }

    #[test]
    fn test_must_finish_on_violation_is_warning_with_negative_float() {
        let snap = snapshot(
            vec![
                task("a", 4 * HOUR),
                task("b", HOUR).with_constraint(ConstraintType::MustFinishOn, at(3 * HOUR)),
            ],
            vec![Dependency::new("a", "b")],
        );
        let r = run(&snap);
        let b = r.task("b").unwrap();
        assert!(b.constraint_violated);
        assert_eq!(b.early_start, at(4 * HOUR));
        assert_eq!(b.late_finish, at(3 * HOUR));
        assert_eq!(b.total_float_minutes, -2 * HOUR);
        assert!(!r.is_feasible());
        assert!(r.warnings.iter().any(|w| matches!(w, ScheduleWarning::ConstraintViolated { task_id, .. } if task_id == "b")));
        assert!(r.warnings.iter().any(|w| matches!(w, ScheduleWarning::NegativeFloat { task_id, float_minutes } if task_id == "a" && *float_minutes == -2 * HOUR)));
    }

    #[test]
    fn test_deadline_drives_sinks() {
        let mut snap = diamond();
        snap.project.deadline = Some(at(10 * HOUR));
        let r = run(&snap);
        assert_eq!(r.project_finish, at(10 * HOUR));
        assert_eq!(r.task("d").unwrap().total_float_minutes, 3 * HOUR);
        assert!(r.critical_path.is_empty());

        snap.project.deadline = Some(at(5 * HOUR));
        let r = run(&snap);
        assert_eq!(r.task("a").unwrap().total_float_minutes, -2 * HOUR);
        assert_eq!(r.negative_float_tasks().count(), 3);
    }

    #[test]
    fn test_cycle_yields_no_schedule() {
        let snap = snapshot(
            vec![task("a", 1), task("b", 1), task("c", 1)],
            vec![Dependency::new("a", "b"), Dependency::new("b", "c"), Dependency::new("c", "a")],
        );
        let err = compute_schedule(&snap, MAX_LAG_MINUTES).unwrap_err();
        assert_eq!(
            err,
            EngineError::CycleDetected {
                cycle: vec!["a".into(), "b".into(), "c".into()]
            }
        );
    }

    #[test]
    fn test_recompute_is_bit_identical() {
        let mut snap = diamond();
        let first = run(&snap);
        snap.tasks.reverse();
        snap.dependencies.reverse();
        let second = run(&snap);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_project() {
        let r = run(&snapshot(vec![], vec![]));
        assert!(r.tasks.is_empty());
        assert_eq!(r.project_finish, anchor());
    }

    #[test]
    fn test_invalid_task_aborts() {
        let snap = snapshot(vec![Task::new("a", "p")], vec![]);
        assert_eq!(
            compute_schedule(&snap, MAX_LAG_MINUTES).unwrap_err().code().as_str(),
            "INVALID_TASK"
        );
    }

    #[test]
    fn test_oversized_duration_is_rejected() {
        let snap = snapshot(vec![task("a", 200_000_000_000)], vec![]);
        assert_eq!(
            compute_schedule(&snap, MAX_LAG_MINUTES).unwrap_err().code().as_str(),
            "INVALID_TASK"
        );
    }

    #[test]
    fn test_schedule_past_last_representable_date_is_an_error() {
        let mut snap = snapshot(vec![task("a", MAX_DURATION_MINUTES)], vec![]);
        snap.project.schedule_from = Utc.with_ymd_and_hms(262_100, 1, 1, 0, 0, 0).unwrap();
        let err = compute_schedule(&snap, MAX_LAG_MINUTES).unwrap_err();
        assert_eq!(err.code().as_str(), "VALIDATION_ERROR");
    }
}
