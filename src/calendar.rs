//! Calendar arithmetic behind the date picker.
//!
//! The grid is a fixed 6 x 7 matrix of day cells with Monday in column 0.
//! All mutation goes through [`CalendarEngine`]. Setters clamp user input,
//! overflowing fields roll over the way a native date object does, and
//! subscribers hear about every change.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::fmt;
use tracing::debug;

pub const GRID_ROWS: u32 = 6;
pub const GRID_COLS: u32 = 7;
pub const GRID_CELLS: usize = (GRID_ROWS * GRID_COLS) as usize;

const YEAR_MIN: i64 = 1970;
const YEAR_MAX: i64 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    value: NaiveDateTime,
    date_only: bool,
}

impl CalendarDate {
    pub fn new(date: NaiveDate, date_only: bool) -> Self {
        Self {
            value: date.and_time(NaiveTime::MIN),
            date_only,
        }
    }

    pub fn from_datetime(value: NaiveDateTime, date_only: bool) -> Self {
        let value = if date_only {
            value.date().and_time(NaiveTime::MIN)
        } else {
            value
        };
        Self { value, date_only }
    }

    pub fn from_ymd(year: i32, month: u32, day: u32, date_only: bool) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(|date| Self::new(date, date_only))
    }

    pub fn year(&self) -> i32 {
        self.value.year()
    }

    /// Month of the year, 1-based.
    pub fn month(&self) -> u32 {
        self.value.month()
    }

    pub fn day(&self) -> u32 {
        self.value.day()
    }

    pub fn hour(&self) -> u32 {
        self.value.hour()
    }

    pub fn minute(&self) -> u32 {
        self.value.minute()
    }

    pub fn second(&self) -> u32 {
        self.value.second()
    }

    pub fn date_only(&self) -> bool {
        self.date_only
    }

    pub fn date(&self) -> NaiveDate {
        self.value.date()
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.value
    }

    /// `dd/mm/yyyy`, followed by ` hh:mm` unless the date is date-only.
    pub fn display(&self) -> String {
        if self.date_only {
            self.value.format("%d/%m/%Y").to_string()
        } else {
            self.value.format("%d/%m/%Y %H:%M").to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPosition {
    pub row: u32,
    pub col: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
    pub day: Option<u32>,
    pub is_today: bool,
    pub is_selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub first_weekday: u32,
    pub selected: Option<GridPosition>,
    pub cells: Vec<GridCell>,
}

/// Number of days in `month` of `year`. Months outside 1..=12 are clamped;
/// years chrono cannot represent yield 0.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month.clamp(1, 12), 1);
    let next = first.and_then(|date| date.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// Weekday of the 1st of the month, 0 = Monday .. 6 = Sunday.
pub fn first_weekday_of_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month.clamp(1, 12), 1)
        .map_or(0, |date| date.weekday().num_days_from_monday())
}

/// Grid cell holding `day` of the date's month, or `None` when the day is not
/// part of that month.
pub fn grid_position_for_day(date: &CalendarDate, day: u32) -> Option<GridPosition> {
    if day == 0 || day > days_in_month(date.year(), date.month()) {
        return None;
    }
    let offset = day + first_weekday_of_month(date.year(), date.month()) - 1;
    Some(GridPosition {
        row: offset / GRID_COLS,
        col: offset % GRID_COLS,
    })
}

/// Day number under a grid cell. Cells before the 1st give values below 1 and
/// cells after the last day give values above the month length.
/// Any `row` and `col` are accepted, not just cells on the 6×7 grid.
pub fn day_for_grid_position(date: &CalendarDate, row: u32, col: u32) -> i64 {
    let offset = i64::from(row) * i64::from(GRID_COLS) + i64::from(col);
    offset - i64::from(first_weekday_of_month(date.year(), date.month())) + 1
}

/// Builds a datetime from possibly overflowing fields: months past December
/// carry into the year and days past the month end carry into the next month.
fn normalize(year: i64, month0: i64, day: i64, time: NaiveTime) -> Option<NaiveDateTime> {
    let year = year.checked_add(month0.div_euclid(12))?;
    let month = month0.rem_euclid(12) as u32 + 1;
    let first = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, 1)?;
    let date = first.checked_add_signed(Duration::try_days(day - 1)?)?;
    Some(date.and_time(time))
}

pub type DateListener = Box<dyn FnMut(&CalendarDate) + Send>;

pub struct CalendarEngine {
    date: CalendarDate,
    listeners: Vec<DateListener>,
}

impl fmt::Debug for CalendarEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarEngine")
            .field("date", &self.date)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CalendarEngine {
    pub fn new(date: CalendarDate) -> Self {
        Self {
            date,
            listeners: Vec::new(),
        }
    }

    pub fn date(&self) -> &CalendarDate {
        &self.date
    }

    /// Registers a callback fired after every mutating call.
    pub fn subscribe(&mut self, listener: impl FnMut(&CalendarDate) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replaces the value, keeping this engine's date-only mode.
    pub fn set_date(&mut self, date: CalendarDate) {
        self.date = CalendarDate::from_datetime(date.datetime(), self.date.date_only);
        self.fire_date_changed();
    }

    pub fn set_year(&mut self, value: i64) {
        let year = value.clamp(YEAR_MIN, YEAR_MAX);
        let next = normalize(year, self.month0(), self.date.day().into(), self.date.value.time());
        self.apply(next);
    }

    pub fn set_month(&mut self, value: i64) {
        let month0 = value.clamp(1, 12) - 1;
        let next = normalize(
            self.date.year().into(),
            month0,
            self.date.day().into(),
            self.date.value.time(),
        );
        self.apply(next);
    }

    /// Days past the end of the month roll over into the next month.
    pub fn set_day(&mut self, value: i64) {
        let day = value.clamp(1, 31);
        let next = normalize(self.date.year().into(), self.month0(), day, self.date.value.time());
        self.apply(next);
    }

    pub fn set_hour(&mut self, value: i64) {
        let hour = self.time_field(value, 23);
        let next = self.date.value.with_hour(hour);
        self.apply(next);
    }

    pub fn set_minute(&mut self, value: i64) {
        let minute = self.time_field(value, 59);
        let next = self.date.value.with_minute(minute);
        self.apply(next);
    }

    pub fn set_second(&mut self, value: i64) {
        let second = self.time_field(value, 59);
        let next = self.date.value.with_second(second);
        self.apply(next);
    }

    pub fn add_years(&mut self, delta: i64) {
        let next = i64::from(self.date.year()).checked_add(delta).and_then(|year| {
            normalize(year, self.month0(), self.date.day().into(), self.date.value.time())
        });
        self.apply(next);
    }

    pub fn add_months(&mut self, delta: i64) {
        let next = self.month0().checked_add(delta).and_then(|month0| {
            normalize(
                self.date.year().into(),
                month0,
                self.date.day().into(),
                self.date.value.time(),
            )
        });
        self.apply(next);
    }

    /// No-op on the value in date-only mode.
    pub fn add_hours(&mut self, delta: i64) {
        let next = if self.date.date_only {
            Some(self.date.value)
        } else {
            Duration::try_hours(delta).and_then(|step| self.date.value.checked_add_signed(step))
        };
        self.apply(next);
    }

    /// No-op on the value in date-only mode.
    pub fn add_minutes(&mut self, delta: i64) {
        let next = if self.date.date_only {
            Some(self.date.value)
        } else {
            Duration::try_minutes(delta).and_then(|step| self.date.value.checked_add_signed(step))
        };
        self.apply(next);
    }

    /// Picks the day under a grid cell. Cells outside the current month move
    /// the date into the adjacent month. Returns false for cells off the grid.
    pub fn select_cell(&mut self, row: u32, col: u32) -> bool {
        if row >= GRID_ROWS || col >= GRID_COLS {
            return false;
        }
        let day = day_for_grid_position(&self.date, row, col);
        let next = normalize(
            self.date.year().into(),
            self.month0(),
            day,
            self.date.value.time(),
        );
        self.apply(next);
        true
    }

    pub fn grid(&self, today: NaiveDate) -> MonthGrid {
        let year = self.date.year();
        let month = self.date.month();
        let max_day = days_in_month(year, month);
        let first_weekday = first_weekday_of_month(year, month);
        let selected = grid_position_for_day(&self.date, self.date.day());

        let mut cells = Vec::with_capacity(GRID_CELLS);
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let day = day_for_grid_position(&self.date, row, col);
                let day = u32::try_from(day).ok().filter(|day| (1..=max_day).contains(day));
                let is_today = day.is_some_and(|day| {
                    today.year() == year && today.month() == month && today.day() == day
                });
                cells.push(GridCell {
                    row,
                    col,
                    day,
                    is_today,
                    is_selected: selected == Some(GridPosition { row, col }),
                });
            }
        }

        MonthGrid {
            year,
            month,
            days_in_month: max_day,
            first_weekday,
            selected,
            cells,
        }
    }

    fn month0(&self) -> i64 {
        i64::from(self.date.month()) - 1
    }

    fn time_field(&self, value: i64, max: i64) -> u32 {
        if self.date.date_only {
            0
        } else {
            value.clamp(0, max) as u32
        }
    }

    fn apply(&mut self, next: Option<NaiveDateTime>) {
        match next {
            Some(value) => {
                self.date = CalendarDate::from_datetime(value, self.date.date_only);
            }
            None => debug!("calendar change out of range, keeping {}", self.date.display()),
        }
        self.fire_date_changed();
    }

    fn fire_date_changed(&mut self) {
        let date = self.date;
        for listener in &mut self.listeners {
            listener(&date);
        }
    }
}
