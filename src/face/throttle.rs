use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Caps how often a face sample may be emitted, independent of the camera frame rate.
#[derive(Debug, Clone)]
pub struct SampleThrottle {
    interval: Duration,
    last_emitted: Option<Instant>,
}

impl SampleThrottle {
    pub fn new(interval: Duration) -> Self {
        SampleThrottle { interval, last_emitted: None }
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_emitted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn mark_emitted(&mut self, now: Instant) {
        self.last_emitted = Some(now);
    }
}
