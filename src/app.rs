use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::{get, post}};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/path", get(handlers::get_path))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/refresh", post(handlers::refresh))
        .with_state(state)
}
