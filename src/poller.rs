use crate::config::Config;
use crate::render::{RenderState, render};
use crate::source::PointSource;
use crate::trajectory::{
    FilterCriteria, LocationRecord, TimeWindow, parse_records, path_from_records,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, RwLock},
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollOutcome {
    Polled,
    Skipped,
    Failed,
}

/// Output of the last successful poll.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub records: Vec<LocationRecord>,
    pub render: RenderState,
}

#[derive(Clone)]
pub struct Poller {
    source: Arc<PointSource>,
    period: Duration,
    default_accuracy: u32,
    default_last_days: u32,
    snapshot: Arc<RwLock<Snapshot>>,
    in_flight: Arc<Mutex<()>>,
}

impl Poller {
    pub fn new(source: PointSource, config: &Config) -> Self {
        Self {
            source: Arc::new(source),
            period: config.poll_interval,
            default_accuracy: config.default_accuracy,
            default_last_days: config.default_last_days,
            snapshot: Arc::new(RwLock::new(Snapshot::default())),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub fn default_accuracy(&self) -> u32 {
        self.default_accuracy
    }

    pub fn default_last_days(&self) -> u32 {
        self.default_last_days
    }

    pub fn default_criteria(&self, now: DateTime<Utc>) -> FilterCriteria {
        let window = TimeWindow::Relative {
            last_days: self.default_last_days,
        };
        FilterCriteria::resolve(&window, f64::from(self.default_accuracy), now)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn render_state(&self) -> RenderState {
        self.snapshot.read().await.render.clone()
    }

    /// One fetch-parse-filter-render cycle. A cycle that starts while another
    /// is in flight is skipped; a failed fetch keeps the published state.
    pub async fn poll_once(&self) -> PollOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("poll already in flight, skipping");
            return PollOutcome::Skipped;
        };

        let text = match self.source.fetch().await {
            Ok(text) => text,
            Err(err) => {
                warn!("failed to fetch point log from {}: {err}", self.source.describe());
                return PollOutcome::Failed;
            }
        };

        let now = Utc::now();
        let records = parse_records(&text);
        let path = path_from_records(&records, &self.default_criteria(now));

        let mut snapshot = self.snapshot.write().await;
        let rendered = render(&path, &snapshot.render, now);
        info!(
            generation = rendered.generation,
            records = records.len(),
            points = path.records.len(),
            "point log polled"
        );
        *snapshot = Snapshot {
            records,
            render: rendered,
        };
        PollOutcome::Polled
    }

    /// Polls immediately, then once per period until the task is dropped.
    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "polling {} every {}s",
            self.source.describe(),
            self.period.as_secs()
        );
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }
}
