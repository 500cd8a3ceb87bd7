use chrono::{DateTime, Duration, Utc};

use crate::model::{Category, Problem};

/// Record of one submitted answer within a practice session.
///
/// Snapshots the problem's expression and correct answer so the answer
/// stays meaningful after the generated problem list is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub expression: String,
    pub correct_answer: String,
    pub user_answer: String,
    pub category: Category,
    pub is_correct: bool,
    pub time_spent: Duration,
    pub answered_at: DateTime<Utc>,
}

impl SubmittedAnswer {
    /// Grade `user_answer` against `problem`.
    #[must_use]
    pub fn grade(
        problem: &Problem,
        user_answer: impl Into<String>,
        time_spent: Duration,
        answered_at: DateTime<Utc>,
    ) -> Self {
        let user_answer = user_answer.into();
        Self {
            expression: problem.expression().to_owned(),
            correct_answer: problem.correct_answer().to_owned(),
            is_correct: problem.is_correct(&user_answer),
            user_answer,
            category: problem.category(),
            time_spent,
            answered_at,
        }
    }

    /// Rehydrate from storage. Correctness is re-derived, never trusted.
    #[must_use]
    pub fn from_persisted(
        expression: String,
        correct_answer: String,
        user_answer: String,
        category: Category,
        time_spent: Duration,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            is_correct: user_answer == correct_answer,
            expression,
            correct_answer,
            user_answer,
            category,
            time_spent,
            answered_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn grading_snapshots_problem() {
        let problem = Problem::new(Category::TwoDigitMultiplication, "25 × 7", "175", fixed_now());
        let answer = SubmittedAnswer::grade(&problem, "165", Duration::seconds(3), fixed_now());

        assert_eq!(answer.expression, "25 × 7");
        assert_eq!(answer.correct_answer, "175");
        assert!(!answer.is_correct);
        assert_eq!(answer.category, Category::TwoDigitMultiplication);
    }

    #[test]
    fn persisted_correctness_is_recomputed() {
        let answer = SubmittedAnswer::from_persisted(
            "27 + 56".into(),
            "83".into(),
            "83".into(),
            Category::TwoDigitAddition,
            Duration::milliseconds(1500),
            fixed_now(),
        );
        assert!(answer.is_correct);
    }
}
