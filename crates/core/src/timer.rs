//! Pause-aware stopwatch used for session and per-question timing.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Running,
    Paused { since: DateTime<Utc> },
}

/// Measures active time from `started_at`, excluding paused intervals.
///
/// Active time is `now - started_at - paused_total - current_pause`,
/// clamped to zero so a clock that steps backwards never yields a
/// negative duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseTimer {
    started_at: DateTime<Utc>,
    paused_total: Duration,
    state: TimerState,
}

impl PauseTimer {
    #[must_use]
    pub fn start(at: DateTime<Utc>) -> Self {
        Self {
            started_at: at,
            paused_total: Duration::zero(),
            state: TimerState::Running,
        }
    }

    /// Pause at `now`. Returns false if already paused.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused { since: now };
                true
            }
            TimerState::Paused { .. } => false,
        }
    }

    /// Resume at `now`, returning the length of the pause that just ended.
    ///
    /// Returns `None` if the timer was running.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Duration> {
        match self.state {
            TimerState::Running => None,
            TimerState::Paused { since } => {
                let paused_for = non_negative(now - since);
                self.paused_total += paused_for;
                self.state = TimerState::Running;
                Some(paused_for)
            }
        }
    }

    /// Active time as of `now`.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let ongoing_pause = match self.state {
            TimerState::Running => Duration::zero(),
            TimerState::Paused { since } => non_negative(now - since),
        };
        non_negative(now - self.started_at - self.paused_total - ongoing_pause)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self.state, TimerState::Paused { .. })
    }
}

fn non_negative(d: Duration) -> Duration {
    d.max(Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn running_timer_counts_wall_clock() {
        let t0 = fixed_now();
        let timer = PauseTimer::start(t0);
        assert_eq!(timer.elapsed(t0 + Duration::seconds(5)), Duration::seconds(5));
    }

    #[test]
    fn pause_interval_is_excluded() {
        let t0 = fixed_now();
        let mut timer = PauseTimer::start(t0);
        let before_pause = timer.elapsed(t0 + Duration::seconds(4));

        assert!(timer.pause(t0 + Duration::seconds(4)));
        // The displayed value freezes while paused.
        assert_eq!(timer.elapsed(t0 + Duration::seconds(30)), before_pause);

        let paused_for = timer.resume(t0 + Duration::seconds(34)).unwrap();
        assert_eq!(paused_for, Duration::seconds(30));
        assert_eq!(timer.elapsed(t0 + Duration::seconds(34)), before_pause);
        assert_eq!(
            timer.elapsed(t0 + Duration::seconds(36)),
            before_pause + Duration::seconds(2)
        );
    }

    #[test]
    fn double_pause_and_idle_resume_are_noops() {
        let t0 = fixed_now();
        let mut timer = PauseTimer::start(t0);
        assert!(timer.resume(t0).is_none());
        assert!(timer.pause(t0 + Duration::seconds(1)));
        assert!(!timer.pause(t0 + Duration::seconds(2)));
        assert!(timer.is_paused());
        // The pause still dates from the first call.
        assert_eq!(
            timer.resume(t0 + Duration::seconds(5)),
            Some(Duration::seconds(4))
        );
    }

    #[test]
    fn elapsed_is_clamped_to_zero() {
        let t0 = fixed_now();
        let timer = PauseTimer::start(t0);
        assert_eq!(timer.elapsed(t0 - Duration::seconds(10)), Duration::zero());

        let mut paused = PauseTimer::start(t0);
        paused.pause(t0 + Duration::seconds(5));
        assert_eq!(paused.resume(t0), Some(Duration::zero()));
    }
}
