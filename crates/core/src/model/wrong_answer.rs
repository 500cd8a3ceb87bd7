use chrono::{DateTime, Utc};

use crate::model::{Category, SubmittedAnswer, WrongAnswerId};

/// Which notebook entries to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MistakeFilter {
    #[default]
    All,
    NotMastered,
    Mastered,
}

impl MistakeFilter {
    #[must_use]
    pub fn matches(self, record: &WrongAnswerRecord) -> bool {
        match self {
            MistakeFilter::All => true,
            MistakeFilter::NotMastered => !record.is_mastered(),
            MistakeFilter::Mastered => record.is_mastered(),
        }
    }
}

/// Aggregate of repeated misses for one expression.
///
/// Records are keyed by the exact expression text; `"27+56"` and
/// `"27 + 56"` are different entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongAnswerRecord {
    id: Option<WrongAnswerId>,
    expression: String,
    correct_answer: String,
    user_answer: String,
    category: Category,
    wrong_count: u32,
    first_wrong_at: DateTime<Utc>,
    last_wrong_at: DateTime<Utc>,
    is_mastered: bool,
}

impl WrongAnswerRecord {
    /// Start a record from the first miss.
    #[must_use]
    pub fn first_miss(answer: &SubmittedAnswer) -> Self {
        Self {
            id: None,
            expression: answer.expression.clone(),
            correct_answer: answer.correct_answer.clone(),
            user_answer: answer.user_answer.clone(),
            category: answer.category,
            wrong_count: 1,
            first_wrong_at: answer.answered_at,
            last_wrong_at: answer.answered_at,
            is_mastered: false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: WrongAnswerId,
        expression: String,
        correct_answer: String,
        user_answer: String,
        category: Category,
        wrong_count: u32,
        first_wrong_at: DateTime<Utc>,
        last_wrong_at: DateTime<Utc>,
        is_mastered: bool,
    ) -> Self {
        Self {
            id: Some(id),
            expression,
            correct_answer,
            user_answer,
            category,
            wrong_count,
            first_wrong_at,
            last_wrong_at,
            is_mastered,
        }
    }

    /// Register another miss of the same expression.
    pub fn add_wrong_attempt(&mut self, user_answer: impl Into<String>, at: DateTime<Utc>) {
        self.wrong_count = self.wrong_count.saturating_add(1);
        self.user_answer = user_answer.into();
        self.last_wrong_at = at;
    }

    pub fn mark_mastered(&mut self) {
        self.is_mastered = true;
    }

    /// Check a retry attempt; surrounding whitespace is ignored.
    #[must_use]
    pub fn check_retry(&self, input: &str) -> bool {
        input.trim() == self.correct_answer
    }

    pub fn set_id(&mut self, id: WrongAnswerId) {
        self.id = Some(id);
    }

    #[must_use]
    pub fn id(&self) -> Option<WrongAnswerId> {
        self.id
    }

    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn user_answer(&self) -> &str {
        &self.user_answer
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    #[must_use]
    pub fn first_wrong_at(&self) -> DateTime<Utc> {
        self.first_wrong_at
    }

    #[must_use]
    pub fn last_wrong_at(&self) -> DateTime<Utc> {
        self.last_wrong_at
    }

    #[must_use]
    pub fn is_mastered(&self) -> bool {
        self.is_mastered
    }
}
