use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Longest task the passes accept: one hundred years.
pub const MAX_DURATION_MINUTES: i64 = 100 * 366 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintType {
    #[default]
    Asap,
    StartNoEarlierThan,
    StartNoLaterThan,
    FinishNoEarlierThan,
    FinishNoLaterThan,
    MustStartOn,
    MustFinishOn,
}

impl ConstraintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asap => "ASAP",
            Self::StartNoEarlierThan => "START_NO_EARLIER_THAN",
            Self::StartNoLaterThan => "START_NO_LATER_THAN",
            Self::FinishNoEarlierThan => "FINISH_NO_EARLIER_THAN",
            Self::FinishNoLaterThan => "FINISH_NO_LATER_THAN",
            Self::MustStartOn => "MUST_START_ON",
            Self::MustFinishOn => "MUST_FINISH_ON",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ASAP" => Some(Self::Asap),
            "START_NO_EARLIER_THAN" => Some(Self::StartNoEarlierThan),
            "START_NO_LATER_THAN" => Some(Self::StartNoLaterThan),
            "FINISH_NO_EARLIER_THAN" => Some(Self::FinishNoEarlierThan),
            "FINISH_NO_LATER_THAN" => Some(Self::FinishNoLaterThan),
            "MUST_START_ON" => Some(Self::MustStartOn),
            "MUST_FINISH_ON" => Some(Self::MustFinishOn),
            _ => None,
        }
    }

    pub fn needs_date(&self) -> bool {
        !matches!(self, Self::Asap)
    }
}

/// Read-side view of a task as the CRUD layer hands it over.
///
/// Costs are integer minor currency units (cents) so that sums over
/// thousands of tasks stay exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    /// Used only when planned dates are absent.
    pub duration_minutes: Option<i64>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub percent_complete: u8,
    #[serde(default)]
    pub is_milestone: bool,
    #[serde(default)]
    pub constraint_type: ConstraintType,
    pub constraint_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub budgeted_cost: i64,
    #[serde(default)]
    pub actual_cost: i64,
}

impl Task {
    pub fn new(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            name: String::new(),
            planned_start: None,
            planned_end: None,
            duration_minutes: None,
            actual_start: None,
            actual_end: None,
            percent_complete: 0,
            is_milestone: false,
            constraint_type: ConstraintType::Asap,
            constraint_date: None,
            budgeted_cost: 0,
            actual_cost: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_planned(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.planned_start = Some(start);
        self.planned_end = Some(end);
        self
    }

    pub fn with_actual(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.actual_start = start;
        self.actual_end = end;
        self
    }

    pub fn with_constraint(mut self, constraint: ConstraintType, date: DateTime<Utc>) -> Self {
        self.constraint_type = constraint;
        self.constraint_date = Some(date);
        self
    }

    pub fn with_costs(mut self, budgeted: i64, actual: i64) -> Self {
        self.budgeted_cost = budgeted;
        self.actual_cost = actual;
        self
    }

    pub fn with_progress(mut self, percent_complete: u8) -> Self {
        self.percent_complete = percent_complete;
        self
    }

    pub fn milestone(mut self) -> Self {
        self.is_milestone = true;
        self
    }

    /// Scheduling duration in minutes. Milestones are always zero.
    pub fn effective_duration(&self) -> Result<i64> {
        if self.is_milestone {
            return Ok(0);
        }
        match (self.planned_start, self.planned_end, self.duration_minutes) {
            (Some(start), Some(end), _) => Ok((end - start).num_minutes()),
            (_, _, Some(minutes)) => Ok(minutes),
            _ => Err(self.invalid("no planned dates and no explicit duration")),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.percent_complete > 100 {
            return Err(self.invalid(format!(
                "percent_complete {} is outside 0..=100",
                self.percent_complete
            )));
        }
        if let (Some(start), Some(end)) = (self.planned_start, self.planned_end) {
            if end < start {
                return Err(self.invalid("planned_end is before planned_start"));
            }
        }
        if let (Some(start), Some(end)) = (self.actual_start, self.actual_end) {
            if end < start {
                return Err(self.invalid("actual_end is before actual_start"));
            }
        }
        if let Some(minutes) = self.duration_minutes {
            if minutes < 0 {
                return Err(self.invalid("duration_minutes is negative"));
            }
        }
        if self.constraint_type.needs_date() && self.constraint_date.is_none() {
            return Err(self.invalid(format!(
                "{} constraint requires constraint_date",
                self.constraint_type.as_str()
            )));
        }
        if self.budgeted_cost < 0 || self.actual_cost < 0 {
            return Err(self.invalid("costs must not be negative"));
        }
        let minutes = self.effective_duration()?;
        if minutes > MAX_DURATION_MINUTES {
            return Err(self.invalid(format!(
                "duration of {minutes} minutes exceeds the {MAX_DURATION_MINUTES} minute limit"
            )));
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> EngineError {
        EngineError::InvalidTask {
            task_id: self.id.clone(),
            reason: reason.into(),
        }
    }
}
