use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

use super::tracker::{PracticeStatus, PracticeTracker};

/// Refresh period for elapsed-time displays.
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Periodic tick for recomputing displayed elapsed times.
///
/// Late ticks are skipped rather than bunched up. Dropping the ticker stops it.
pub struct ElapsedTicker {
    interval: Interval,
}

impl ElapsedTicker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Whether `tracker` still needs refreshing; false once the run is over.
    #[must_use]
    pub fn should_refresh(tracker: &PracticeTracker) -> bool {
        matches!(tracker.status(), PracticeStatus::InProgress)
    }
}

impl Default for ElapsedTicker {
    fn default() -> Self {
        Self::new()
    }
}
