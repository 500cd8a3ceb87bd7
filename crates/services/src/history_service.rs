use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};
use quickcal_core::model::{Category, PracticeSession};
use storage::repository::{PracticeSessionRepository, SessionQuery};
use thiserror::Error;

use crate::Clock;
use crate::error::HistoryServiceError;

/// Time window for the history view, evaluated in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryRange {
    Today,
    PastWeek,
    PastMonth,
    #[default]
    All,
}

impl HistoryRange {
    /// Earliest start time included in the range.
    #[must_use]
    pub fn starts_at(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            HistoryRange::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            HistoryRange::PastWeek => Some(now - Duration::days(7)),
            HistoryRange::PastMonth => Some(
                now.checked_sub_months(Months::new(1))
                    .unwrap_or(now - Duration::days(30)),
            ),
            HistoryRange::All => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryRange::Today => "today",
            HistoryRange::PastWeek => "week",
            HistoryRange::PastMonth => "month",
            HistoryRange::All => "all",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown history range {raw:?} (expected today, week, month or all)")]
pub struct ParseHistoryRangeError {
    raw: String,
}

impl FromStr for HistoryRange {
    type Err = ParseHistoryRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "day" => Ok(HistoryRange::Today),
            "week" => Ok(HistoryRange::PastWeek),
            "month" => Ok(HistoryRange::PastMonth),
            "all" => Ok(HistoryRange::All),
            _ => Err(ParseHistoryRangeError { raw: s.to_owned() }),
        }
    }
}

/// Aggregates over a set of completed sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub session_count: usize,
    /// Mean of per-session correct rates; 0 when there are no sessions.
    pub average_correct_rate: f64,
    pub total_questions: u64,
    pub total_time: Duration,
    /// Sessions per category, most practiced first.
    pub category_counts: Vec<(Category, usize)>,
}

impl HistoryStats {
    #[must_use]
    pub fn from_sessions(sessions: &[PracticeSession]) -> Self {
        let session_count = sessions.len();
        #[allow(clippy::cast_precision_loss)]
        let average_correct_rate = if session_count == 0 {
            0.0
        } else {
            sessions.iter().map(PracticeSession::correct_rate).sum::<f64>() / session_count as f64
        };

        let mut per_category: HashMap<Category, usize> = HashMap::new();
        for session in sessions {
            *per_category.entry(session.category()).or_default() += 1;
        }
        let mut category_counts: Vec<_> = per_category.into_iter().collect();
        category_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            session_count,
            average_correct_rate,
            total_questions: sessions
                .iter()
                .map(|s| u64::from(s.total_questions()))
                .sum(),
            total_time: sessions
                .iter()
                .fold(Duration::zero(), |acc, s| acc + s.total_time()),
            category_counts,
        }
    }
}

/// Read-only view over completed sessions.
#[derive(Clone)]
pub struct HistoryService {
    clock: Clock,
    repo: Arc<dyn PracticeSessionRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn PracticeSessionRepository>) -> Self {
        Self { clock, repo }
    }

    /// Every completed session in `range`, optionally of one category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError` on storage failures.
    pub async fn list(
        &self,
        range: HistoryRange,
        category: Option<Category>,
    ) -> Result<Vec<PracticeSession>, HistoryServiceError> {
        let query = SessionQuery {
            started_from: range.starts_at(self.clock.now()),
            category,
            ..SessionQuery::completed()
        };
        Ok(self.repo.list_sessions(&query).await?)
    }

    /// # Errors
    ///
    /// Returns `HistoryServiceError` on storage failures.
    pub async fn stats(
        &self,
        range: HistoryRange,
        category: Option<Category>,
    ) -> Result<HistoryStats, HistoryServiceError> {
        let sessions = self.list(range, category).await?;
        Ok(HistoryStats::from_sessions(&sessions))
    }
}
