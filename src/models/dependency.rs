use serde::{Deserialize, Serialize};

/// Lag bound: ±30 days in minutes.
pub const MAX_LAG_MINUTES: i64 = 43_200;

/// Finish-to-start edge. The successor may start `lag_minutes` after the
/// predecessor finishes (negative lag is lead time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub predecessor_id: String,
    pub successor_id: String,
    #[serde(default)]
    pub lag_minutes: i64,
}

impl Dependency {
    pub fn new(predecessor_id: impl Into<String>, successor_id: impl Into<String>) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            lag_minutes: 0,
        }
    }

    pub fn with_lag(mut self, lag_minutes: i64) -> Self {
        self.lag_minutes = lag_minutes;
        self
    }
}
