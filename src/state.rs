use crate::poller::Poller;

#[derive(Clone)]
pub struct AppState {
    pub poller: Poller,
    pub poll_interval_secs: u64,
}

impl AppState {
    pub fn new(poller: Poller, poll_interval_secs: u64) -> Self {
        Self {
            poller,
            poll_interval_secs,
        }
    }
}
