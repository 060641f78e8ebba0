use chrono::{DateTime, Utc};

use crate::models::{ConstraintType, Task};

/// External bounds a constraint places on one task, as minute offsets from
/// the schedule anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConstraintBounds {
    pub earliest_start: Option<i64>,
    pub latest_finish: Option<i64>,
}

impl ConstraintBounds {
    /// Forward pass: never earlier than the predecessor-driven start.
    pub fn clamp_start(&self, predecessor_driven: i64) -> i64 {
        match self.earliest_start {
            Some(bound) => predecessor_driven.max(bound),
            None => predecessor_driven,
        }
    }

    /// Backward pass: never later than the successor-driven finish.
    pub fn clamp_finish(&self, successor_driven: i64) -> i64 {
        match self.latest_finish {
            Some(bound) => successor_driven.min(bound),
            None => successor_driven,
        }
    }

    pub fn is_violated(&self, early_finish: i64) -> bool {
        self.latest_finish.is_some_and(|bound| early_finish > bound)
    }
}

/// Translates constraint types into pass bounds relative to one anchor.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintResolver {
    anchor: DateTime<Utc>,
}

impl ConstraintResolver {
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self { anchor }
    }

    pub fn offset_of(&self, at: DateTime<Utc>) -> i64 {
        (at - self.anchor).num_minutes()
    }

    pub fn resolve(&self, task: &Task, duration: i64) -> ConstraintBounds {
        let Some(date) = task.constraint_date.map(|d| self.offset_of(d)) else {
            return ConstraintBounds::default();
        };
        let (earliest_start, latest_finish) = match task.constraint_type {
            ConstraintType::Asap => (None, None),
            ConstraintType::StartNoEarlierThan => (Some(date), None),
            ConstraintType::FinishNoEarlierThan => (Some(date - duration), None),
            ConstraintType::StartNoLaterThan => (None, Some(date + duration)),
            ConstraintType::FinishNoLaterThan => (None, Some(date)),
            ConstraintType::MustStartOn => (Some(date), Some(date + duration)),
            ConstraintType::MustFinishOn => (Some(date - duration), Some(date)),
        };
        ConstraintBounds {
            earliest_start,
            latest_finish,
        }
    }
}
