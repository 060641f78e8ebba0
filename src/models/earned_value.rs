use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time EVM figures. Money fields are minor currency units; the
/// indices are `None` when their denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnedValueSnapshot {
    pub project_id: String,
    pub as_of_date: NaiveDate,
    pub baseline_id: Option<String>,
    pub bac: i64,
    pub pv: i64,
    pub ev: i64,
    pub ac: i64,
    pub cpi: Option<f64>,
    pub spi: Option<f64>,
    pub eac: i64,
    pub etc: i64,
    pub vac: i64,
    pub computed_at: DateTime<Utc>,
}
