pub mod app;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod poller;
pub mod render;
pub mod source;
pub mod state;
pub mod trajectory;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use poller::Poller;
pub use source::PointSource;
pub use state::AppState;
