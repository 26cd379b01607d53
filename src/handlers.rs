use crate::calendar::{CalendarDate, CalendarEngine};
use crate::config::positive_or;
use crate::errors::AppError;
use crate::models::{CalendarQuery, CalendarResponse, PathQuery, RefreshResponse};
use crate::poller::Poller;
use crate::render::{RenderState, render};
use crate::state::AppState;
use crate::trajectory::{FilterCriteria, TimeWindow, path_from_records};
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Query, State},
    response::Html,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::debug;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(
        state.poller.default_accuracy(),
        state.poller.default_last_days(),
        state.poll_interval_secs,
    ))
}

/// Without a query this is the last published poll; with one, the latest
/// polled records are re-filtered for the requested window.
pub async fn get_path(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<RenderState>, AppError> {
    if query.is_empty() {
        return Ok(Json(state.poller.render_state().await));
    }

    let now = Utc::now();
    let criteria = resolve_criteria(&query, &state.poller, now)?;
    let snapshot = state.poller.snapshot().await;
    let path = path_from_records(&snapshot.records, &criteria);
    let mut view = render(&path, &snapshot.render, now);
    view.generation = snapshot.render.generation;
    Ok(Json(view))
}

pub async fn get_calendar(Query(query): Query<CalendarQuery>) -> Json<CalendarResponse> {
    let today = Utc::now().date_naive();
    let mut engine = CalendarEngine::new(CalendarDate::new(today, query.date_only));
    engine.subscribe(|date| debug!("calendar date changed to {}", date.display()));

    if query.year.is_some() || query.month.is_some() {
        engine.set_day(1);
    }
    if let Some(year) = query.year {
        engine.set_year(year);
    }
    if let Some(month) = query.month {
        engine.set_month(month);
    }
    if query.year.is_some() || query.month.is_some() || query.day.is_some() {
        engine.set_day(query.day.unwrap_or_else(|| today.day().into()));
    }
    if let Some(hour) = query.hour {
        engine.set_hour(hour);
    }
    if let Some(minute) = query.minute {
        engine.set_minute(minute);
    }
    if let Some(years) = query.add_years {
        engine.add_years(years);
    }
    if let Some(months) = query.add_months {
        engine.add_months(months);
    }
    if let Some(hours) = query.add_hours {
        engine.add_hours(hours);
    }
    if let Some(minutes) = query.add_minutes {
        engine.add_minutes(minutes);
    }
    if let (Some(row), Some(col)) = (query.select_row, query.select_col) {
        engine.select_cell(row, col);
    }

    let date = *engine.date();
    Json(CalendarResponse {
        display: date.display(),
        date: date.date().to_string(),
        year: date.year(),
        month: date.month(),
        day: date.day(),
        hour: date.hour(),
        minute: date.minute(),
        grid: engine.grid(today),
    })
}

pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let outcome = state.poller.poll_once().await;
    let generation = state.poller.render_state().await.generation;
    Json(RefreshResponse {
        outcome,
        generation,
    })
}

fn resolve_criteria(
    query: &PathQuery,
    poller: &Poller,
    now: DateTime<Utc>,
) -> Result<FilterCriteria, AppError> {
    let accuracy = positive_or(query.accuracy.as_deref(), poller.default_accuracy());
    let window = match query.mode.as_deref().map(str::trim) {
        None | Some("") | Some("relative") => TimeWindow::Relative {
            last_days: positive_or(query.last_days.as_deref(), poller.default_last_days()),
        },
        Some("absolute") => TimeWindow::Absolute {
            from: parse_date("from", query.from.as_deref())?,
            to: parse_date("to", query.to.as_deref())?,
        },
        Some(other) => {
            return Err(AppError::bad_request(format!(
                "mode must be 'absolute' or 'relative', got '{other}'"
            )));
        }
    };
    Ok(FilterCriteria::resolve(&window, f64::from(accuracy), now))
}

/// Accepts `YYYY-MM-DD` or the picker's `dd/mm/yyyy`.
fn parse_date(field: &str, value: Option<&str>) -> Result<CalendarDate, AppError> {
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("missing '{field}' date")))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .map(|date| CalendarDate::new(date, true))
        .map_err(|_| AppError::bad_request(format!("invalid '{field}' date: {value}")))
}
