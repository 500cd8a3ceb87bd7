use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{Category, SessionId, SubmittedAnswer};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PracticeSessionError {
    #[error("ended_at is before started_at")]
    InvalidTimeRange,

    #[error("session already completed")]
    AlreadyCompleted,

    #[error("session already holds {total} answers")]
    TooManyAnswers { total: u32 },

    #[error("correct answers ({stored}) does not match graded answers ({counted})")]
    CountMismatch { stored: u32, counted: u32 },

    #[error("too many answers for a single session: {len}")]
    Overflow { len: usize },
}

/// Coarse rating of a session's correct rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    /// 90% or better.
    Excellent,
    /// 80% up to 90%.
    Great,
    /// 70% up to 80%.
    Good,
    KeepPracticing,
}

impl PerformanceTier {
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 0.9 {
            Self::Excellent
        } else if rate >= 0.8 {
            Self::Great
        } else if rate >= 0.7 {
            Self::Good
        } else {
            Self::KeepPracticing
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => "Outstanding! Mental math master!",
            Self::Great => "Very good! Keep it up!",
            Self::Good => "Not bad! Push a little further!",
            Self::KeepPracticing => "Keep practicing! Practice makes perfect!",
        }
    }
}

/// One run of N problems of a chosen category.
///
/// `correct_answers` always equals the number of graded answers with
/// `is_correct` set; answers can only be added through `record_answer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeSession {
    id: Option<SessionId>,
    category: Category,
    total_questions: u32,
    answers: Vec<SubmittedAnswer>,
    correct_answers: u32,
    total_time: Duration,
    average_time: Duration,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    is_completed: bool,
}

impl PracticeSession {
    /// Create an empty session shell.
    #[must_use]
    pub fn new(category: Category, total_questions: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            category,
            total_questions,
            answers: Vec::new(),
            correct_answers: 0,
            total_time: Duration::zero(),
            average_time: Duration::zero(),
            started_at,
            ended_at: None,
            is_completed: false,
        }
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `PracticeSessionError::CountMismatch` if the stored correct count
    /// disagrees with the answers, or `InvalidTimeRange` if it ended before it started.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        category: Category,
        total_questions: u32,
        answers: Vec<SubmittedAnswer>,
        correct_answers: u32,
        total_time: Duration,
        average_time: Duration,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        is_completed: bool,
    ) -> Result<Self, PracticeSessionError> {
        if ended_at.is_some_and(|ended| ended < started_at) {
            return Err(PracticeSessionError::InvalidTimeRange);
        }
        let counted = count_correct(&answers)?;
        if counted != correct_answers {
            return Err(PracticeSessionError::CountMismatch {
                stored: correct_answers,
                counted,
            });
        }

        Ok(Self {
            id: Some(id),
            category,
            total_questions,
            answers,
            correct_answers,
            total_time,
            average_time,
            started_at,
            ended_at,
            is_completed,
        })
    }

    /// Append a graded answer and update the running correct count.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCompleted` after finalization, or `TooManyAnswers` once
    /// the target question count is reached.
    pub fn record_answer(&mut self, answer: SubmittedAnswer) -> Result<(), PracticeSessionError> {
        if self.is_completed {
            return Err(PracticeSessionError::AlreadyCompleted);
        }
        if self.answered_count() >= self.total_questions {
            return Err(PracticeSessionError::TooManyAnswers {
                total: self.total_questions,
            });
        }
        if answer.is_correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
        }
        self.answers.push(answer);
        Ok(())
    }

    /// Mark the session completed.
    ///
    /// `total_time` is active time only; the average is taken over answered questions.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCompleted` if called twice, `InvalidTimeRange` if
    /// `ended_at` precedes the start.
    pub fn finalize(
        &mut self,
        ended_at: DateTime<Utc>,
        total_time: Duration,
    ) -> Result<(), PracticeSessionError> {
        if self.is_completed {
            return Err(PracticeSessionError::AlreadyCompleted);
        }
        if ended_at < self.started_at {
            return Err(PracticeSessionError::InvalidTimeRange);
        }

        let answered = i32::try_from(self.answers.len()).map_err(|_| {
            PracticeSessionError::Overflow {
                len: self.answers.len(),
            }
        })?;
        self.total_time = total_time;
        self.average_time = if answered > 0 {
            total_time / answered
        } else {
            Duration::zero()
        };
        self.ended_at = Some(ended_at);
        self.is_completed = true;
        Ok(())
    }

    pub fn set_id(&mut self, id: SessionId) {
        self.id = Some(id);
    }

    #[must_use]
    pub fn id(&self) -> Option<SessionId> {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn answers(&self) -> &[SubmittedAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn answered_count(&self) -> u32 {
        u32::try_from(self.answers.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    /// Answers submitted so far that were wrong.
    #[must_use]
    pub fn wrong_answers(&self) -> u32 {
        self.answered_count().saturating_sub(self.correct_answers)
    }

    /// Correct answers over the target question count.
    #[must_use]
    pub fn correct_rate(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers) / f64::from(self.total_questions)
    }

    #[must_use]
    pub fn performance(&self) -> PerformanceTier {
        PerformanceTier::from_rate(self.correct_rate())
    }

    #[must_use]
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    #[must_use]
    pub fn average_time(&self) -> Duration {
        self.average_time
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Answers the user got wrong, in submission order.
    pub fn missed(&self) -> impl Iterator<Item = &SubmittedAnswer> {
        self.answers.iter().filter(|answer| !answer.is_correct)
    }
}

fn count_correct(answers: &[SubmittedAnswer]) -> Result<u32, PracticeSessionError> {
    let counted = answers.iter().filter(|answer| answer.is_correct).count();
    u32::try_from(counted).map_err(|_| PracticeSessionError::Overflow { len: counted })
}
