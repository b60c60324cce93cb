//! Politeness pacing for a single run
//!
//! A run issues one request at a time; the pacer only makes sure consecutive
//! requests are at least `min_interval` apart.

use std::time::{Duration, Instant};

/// Enforces a minimum delay between consecutive requests of one run
#[derive(Debug, Clone)]
pub struct Pacer {
    min_interval: Duration,
    last_request_time: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request_time: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Raises the interval, e.g. to honor a robots.txt crawl-delay
    ///
    /// A shorter interval than the current one is ignored.
    pub fn raise_min_interval(&mut self, interval: Duration) {
        if interval > self.min_interval {
            tracing::debug!(
                "Raising request interval from {:?} to {:?}",
                self.min_interval,
                interval
            );
            self.min_interval = interval;
        }
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.duration_since(last);
        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }

    /// Sleeps until a request is allowed, then records it
    pub async fn wait_turn(&mut self) {
        if let Some(delay) = self.time_until_next_request(Instant::now()) {
            tracing::trace!("Pacing: sleeping {:?}", delay);
            tokio::time::sleep(delay).await;
        }
        self.last_request_time = Some(Instant::now());
    }
}
