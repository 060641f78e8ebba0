//! Earned value management figures.
//!
//! Money is summed in integer minor units; each task's prorated share is
//! rounded half-up once, before accumulation. Only the performance indices
//! are floating point.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::models::{BaselineItem, Task};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarnedValueMetrics {
    pub bac: i64,
    pub pv: i64,
    pub ev: i64,
    pub ac: i64,
    pub cpi: Option<f64>,
    pub spi: Option<f64>,
    pub eac: i64,
    pub etc: i64,
    pub vac: i64,
}

/// A status date covers the whole day: the cut-off is the following midnight UTC.
pub fn as_of_instant(as_of: NaiveDate) -> DateTime<Utc> {
    as_of.and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
}

/// `value * numerator / denominator`, rounded half-up, without overflow.
fn prorate(value: i64, numerator: i64, denominator: i64) -> i64 {
    if denominator == 0 {
        return 0;
    }
    let scaled = value as i128 * numerator as i128 * 2 + denominator as i128;
    (scaled / (denominator as i128 * 2)) as i64
}

/// Share of the baseline window elapsed at `cutoff`, as `(elapsed, total)`
/// minutes. Zero-length windows count as fully elapsed once reached.
pub fn baseline_elapsed(item: &BaselineItem, cutoff: DateTime<Utc>) -> (i64, i64) {
    let total = (item.planned_end - item.planned_start).num_minutes();
    if total <= 0 {
        return if cutoff >= item.planned_end { (1, 1) } else { (0, 1) };
    }
    let elapsed = (cutoff - item.planned_start).num_minutes().clamp(0, total);
    (elapsed, total)
}

/// Whether a task had any recorded activity on or before the cut-off.
/// Costs or progress booked without a start date count as already incurred.
fn has_activity(task: &Task, cutoff: DateTime<Utc>) -> bool {
    match task.actual_start {
        Some(start) => start < cutoff,
        None => task.actual_cost > 0 || task.percent_complete > 0,
    }
}

pub fn planned_value(tasks: &[Task], items: &[BaselineItem], as_of: NaiveDate) -> i64 {
    let cutoff = as_of_instant(as_of);
    let by_task: HashMap<&str, &BaselineItem> = items.iter().map(|i| (i.task_id.as_str(), i)).collect();
    tasks
        .iter()
        .filter_map(|task| {
            by_task.get(task.id.as_str()).map(|item| {
                let (elapsed, total) = baseline_elapsed(item, cutoff);
                prorate(task.budgeted_cost, elapsed, total)
            })
        })
        .sum()
}

pub fn earned_value(tasks: &[Task]) -> i64 {
    tasks
        .iter()
        .map(|t| prorate(t.budgeted_cost, i64::from(t.percent_complete.min(100)), 100))
        .sum()
}

pub fn actual_cost(tasks: &[Task], as_of: NaiveDate) -> i64 {
    let cutoff = as_of_instant(as_of);
    tasks
        .iter()
        .filter(|t| has_activity(t, cutoff))
        .map(|t| t.actual_cost)
        .sum()
}

/// Compute every figure for one status date against one baseline.
pub fn calculate(tasks: &[Task], items: &[BaselineItem], as_of: NaiveDate) -> EarnedValueMetrics {
    let bac: i64 = tasks.iter().map(|t| t.budgeted_cost).sum();
    let pv = planned_value(tasks, items, as_of);
    let ev = earned_value(tasks);
    let ac = actual_cost(tasks, as_of);

    let cpi = (ac != 0).then(|| ev as f64 / ac as f64);
    let spi = (pv != 0).then(|| ev as f64 / pv as f64);

    let remaining = bac - ev;
    let eac = match cpi {
        Some(index) if index != 0.0 => ac + (remaining as f64 / index).round() as i64,
        _ => ac + remaining,
    };

    EarnedValueMetrics {
        bac,
        pv,
        ev,
        ac,
        cpi,
        spi,
        eac,
        etc: eac - ac,
        vac: bac - eac,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn midnight(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap()
    }

    fn item(task_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> BaselineItem {
        BaselineItem {
            baseline_id: "bl".into(),
            task_id: task_id.into(),
            planned_start: start,
            planned_end: end,
            duration_minutes: (end - start).num_minutes(),
            critical_path: true,
            total_float_minutes: 0,
            captured_at: start,
        }
    }

    #[test]
    fn test_single_task_reference_figures() {
        let tasks = vec![Task::new("a", "p").with_duration(1).with_costs(1000, 400).with_progress(50)];
        let items = vec![item("a", midnight(1), midnight(5))];
        let m = calculate(&tasks, &items, day(10));
        assert_eq!(m.bac, 1000);
        assert_eq!(m.pv, 1000);
        assert_eq!(m.ev, 500);
        assert_eq!(m.ac, 400);
        assert_eq!(m.cpi, Some(1.25));
        assert_eq!(m.spi, Some(0.5));
        assert_eq!(m.eac, 800);
        assert_eq!(m.etc, 400);
        assert_eq!(m.vac, 200);
    }

    #[test]
    fn test_pv_is_prorated_on_baseline_window() {
        let tasks = vec![Task::new("a", "p").with_duration(1).with_costs(1000, 0)];
        // Four-day window; the 2nd ends after two full days.
        let items = vec![item("a", midnight(1), midnight(5))];
        assert_eq!(planned_value(&tasks, &items, day(2)), 500);
        assert_eq!(planned_value(&tasks, &items, NaiveDate::from_ymd_opt(2025, 2, 27).unwrap()), 0);
    }

    #[test]
    fn test_not_started_project_has_null_indices() {
        let tasks = vec![Task::new("a", "p").with_duration(1).with_costs(800, 0)];
        let items = vec![item("a", midnight(20), midnight(25))];
        let m = calculate(&tasks, &items, day(1));
        assert_eq!(m.pv, 0);
        assert_eq!(m.ac, 0);
        assert_eq!(m.cpi, None);
        assert_eq!(m.spi, None);
        assert_eq!(m.eac, 800);
        assert_eq!(m.vac, 0);
    }

    #[test]
    fn test_zero_cpi_falls_back_to_planned_rate() {
        let tasks = vec![Task::new("a", "p").with_duration(1).with_costs(1000, 300)];
        let items = vec![item("a", midnight(1), midnight(2))];
        let m = calculate(&tasks, &items, day(3));
        assert_eq!(m.ev, 0);
        assert_eq!(m.cpi, Some(0.0));
        assert_eq!(m.eac, 1300);
        assert_eq!(m.etc, 1000);
        assert_eq!(m.vac, -300);
    }

    #[test]
    fn test_zero_cost_tasks_contribute_nothing() {
        let tasks = vec![
            Task::new("a", "p").with_duration(1).with_progress(100),
            Task::new("b", "p").with_duration(1).with_costs(200, 0).with_progress(25),
        ];
        let items = vec![item("a", midnight(1), midnight(2)), item("b", midnight(1), midnight(2))];
        let m = calculate(&tasks, &items, day(5));
        assert_eq!(m.bac, 200);
        assert_eq!(m.ev, 50);
        assert_eq!(m.pv, 200);
    }

    #[test]
    fn test_milestone_window_counts_once_reached() {
        let tasks = vec![Task::new("m", "p").milestone().with_costs(100, 0)];
        let noon = midnight(4) + Duration::hours(12);
        let items = vec![item("m", noon, noon)];
        assert_eq!(planned_value(&tasks, &items, day(3)), 0);
        assert_eq!(planned_value(&tasks, &items, day(4)), 100);
    }

    #[test]
    fn test_ac_respects_actual_start() {
        let late = Task::new("a", "p")
            .with_duration(1)
            .with_costs(100, 70)
            .with_actual(Some(midnight(9)), None);
        let early = Task::new("b", "p")
            .with_duration(1)
            .with_costs(100, 30)
            .with_actual(Some(midnight(2)), None);
        let tasks = vec![late, early];
        assert_eq!(actual_cost(&tasks, day(5)), 30);
        assert_eq!(actual_cost(&tasks, day(9)), 100);
    }

    #[test]
    fn test_tasks_missing_from_baseline_add_no_pv() {
        let tasks = vec![
            Task::new("a", "p").with_duration(1).with_costs(100, 0),
            Task::new("new", "p").with_duration(1).with_costs(900, 0),
        ];
        let items = vec![item("a", midnight(1), midnight(2))];
        let m = calculate(&tasks, &items, day(9));
        assert_eq!(m.pv, 100);
        assert_eq!(m.bac, 1000);
    }

    #[test]
    fn test_rounding_is_half_up_per_task() {
        assert_eq!(prorate(1, 1, 2), 1);
        assert_eq!(prorate(333, 1, 3), 111);
        assert_eq!(prorate(i64::MAX / 2, 100, 100), i64::MAX / 2);
    }
}
