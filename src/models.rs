use crate::calendar::MonthGrid;
use crate::poller::PollOutcome;
use serde::{Deserialize, Serialize};

/// Query of `/api/path`. Numeric fields stay strings so that junk falls back
/// to the configured defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    pub mode: Option<String>,
    pub last_days: Option<String>,
    pub accuracy: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl PathQuery {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.last_days.is_none()
            && self.accuracy.is_none()
            && self.from.is_none()
            && self.to.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub add_years: Option<i64>,
    pub add_months: Option<i64>,
    pub add_hours: Option<i64>,
    pub add_minutes: Option<i64>,
    pub select_row: Option<u32>,
    pub select_col: Option<u32>,
    #[serde(default)]
    pub date_only: bool,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub display: String,
    pub date: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub grid: MonthGrid,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub outcome: PollOutcome,
    pub generation: u64,
}
