use chrono::Duration;

/// Aggregated view of practice progress, useful for front-ends.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl PracticeProgress {
    /// Share of problems answered, in `0.0..=1.0`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.answered as f64 / self.total as f64;
        fraction.clamp(0.0, 1.0)
    }
}

/// Active time for the whole session and for the question on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedSnapshot {
    pub session: Duration,
    pub question: Duration,
}

impl ElapsedSnapshot {
    #[must_use]
    pub fn zero() -> Self {
        Self {
            session: Duration::zero(),
            question: Duration::zero(),
        }
    }
}

/// Render a duration as `m:ss.t`, e.g. `1:05.3`.
#[must_use]
pub fn format_elapsed(d: Duration) -> String {
    let tenths = d.num_milliseconds().max(0) / 100;
    let minutes = tenths / 600;
    let seconds = (tenths / 10) % 60;
    format!("{minutes}:{seconds:02}.{}", tenths % 10)
}
