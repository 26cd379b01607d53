//! Point log parsing, filtering and per-segment metrics.

use crate::calendar::CalendarDate;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use geo::{Distance, Haversine, Point};
use serde::Serialize;

pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationRecord {
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Error radius in meters.
    pub accuracy: f64,
}

impl LocationRecord {
    fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeWindow {
    Absolute { from: CalendarDate, to: CalendarDate },
    Relative { last_days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterCriteria {
    pub accuracy_ceiling: f64,
    pub min_time: i64,
    pub max_time: i64,
}

impl FilterCriteria {
    pub fn resolve(window: &TimeWindow, accuracy_ceiling: f64, now: DateTime<Utc>) -> Self {
        let (min_time, max_time) = resolve_time_window(window, now);
        Self {
            accuracy_ceiling,
            min_time,
            max_time,
        }
    }

    pub fn admits(&self, record: &LocationRecord) -> bool {
        record.accuracy <= self.accuracy_ceiling
            && (self.min_time..=self.max_time).contains(&record.timestamp)
            && record.latitude.is_finite()
            && record.longitude.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySegment {
    pub from: LocationRecord,
    pub to: LocationRecord,
    pub distance_m: f64,
    pub elapsed_secs: i64,
    /// `None` when no time passed between the two records.
    pub speed_kmh: Option<f64>,
    pub cumulative_distance_m: f64,
    /// Average over the whole path so far, `None` while no time has passed.
    pub average_speed_kmh: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrajectoryPath {
    pub records: Vec<LocationRecord>,
    pub segments: Vec<TrajectorySegment>,
}

impl TrajectoryPath {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_distance_m(&self) -> f64 {
        self.segments
            .last()
            .map_or(0.0, |segment| segment.cumulative_distance_m)
    }
}

/// Parses the newline separated `<ts> <lat> <lng> <acc>` log. Lines without
/// an integer timestamp or with fewer than four fields are skipped; other
/// unparseable fields become NaN and fall out in [`filter_records`].
pub fn parse_records(text: &str) -> Vec<LocationRecord> {
    text.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<LocationRecord> {
    let mut tokens = line.split_whitespace();
    let timestamp = tokens.next()?.parse::<i64>().ok()?;
    let mut field = || {
        tokens
            .next()
            .map(|token| token.parse::<f64>().unwrap_or(f64::NAN))
    };
    let latitude = field()?;
    let longitude = field()?;
    let accuracy = field()?;
    Some(LocationRecord {
        timestamp,
        latitude,
        longitude,
        accuracy,
    })
}

pub fn filter_records(records: &[LocationRecord], criteria: &FilterCriteria) -> Vec<LocationRecord> {
    records
        .iter()
        .filter(|record| criteria.admits(record))
        .copied()
        .collect()
}

/// Resolves a window into inclusive `(min_time, max_time)` epoch seconds.
pub fn resolve_time_window(window: &TimeWindow, now: DateTime<Utc>) -> (i64, i64) {
    match window {
        TimeWindow::Absolute { from, to } => (
            midnight_utc(from.date()),
            midnight_utc(to.date()) + SECONDS_PER_DAY,
        ),
        TimeWindow::Relative { last_days } => {
            let days_back = i64::from((*last_days).max(1)) - 1;
            (
                midnight_utc(now.date_naive()) - days_back * SECONDS_PER_DAY,
                now.timestamp(),
            )
        }
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

pub fn distance_m(from: &LocationRecord, to: &LocationRecord) -> f64 {
    Haversine::distance(from.point(), to.point())
}

fn speed_kmh(distance_m: f64, elapsed_secs: i64) -> Option<f64> {
    if elapsed_secs <= 0 {
        return None;
    }
    Some((distance_m / 1000.0) / (elapsed_secs as f64 / 3600.0))
}

pub fn compute_segments(records: &[LocationRecord]) -> Vec<TrajectorySegment> {
    let Some(start) = records.first() else {
        return Vec::new();
    };

    let mut cumulative_distance_m = 0.0;
    records
        .windows(2)
        .map(|pair| {
            let (from, to) = (pair[0], pair[1]);
            let distance_m = distance_m(&from, &to);
            let elapsed_secs = to.timestamp - from.timestamp;
            cumulative_distance_m += distance_m;
            TrajectorySegment {
                from,
                to,
                distance_m,
                elapsed_secs,
                speed_kmh: speed_kmh(distance_m, elapsed_secs),
                cumulative_distance_m,
                average_speed_kmh: speed_kmh(cumulative_distance_m, to.timestamp - start.timestamp),
            }
        })
        .collect()
}

/// Parse, filter and annotate in one pass.
pub fn build_path(text: &str, criteria: &FilterCriteria) -> TrajectoryPath {
    path_from_records(&parse_records(text), criteria)
}

pub fn path_from_records(records: &[LocationRecord], criteria: &FilterCriteria) -> TrajectoryPath {
    let records = filter_records(records, criteria);
    let segments = compute_segments(&records);
    TrajectoryPath { records, segments }
}

/// Half-up rounding to `places` decimals. Non-finite values pass through.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places);
    (value * factor + 0.5).floor() / factor
}
