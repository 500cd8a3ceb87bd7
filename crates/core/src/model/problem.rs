use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Category;

/// A single generated arithmetic problem.
///
/// Problems are immutable once built. Only four-digit division problems
/// carry multiple-choice options, and when present the correct answer is
/// always one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    category: Category,
    expression: String,
    correct_answer: String,
    options: Option<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl Problem {
    /// Build a free-answer problem.
    #[must_use]
    pub fn new(
        category: Category,
        expression: impl Into<String>,
        correct_answer: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            expression: expression.into(),
            correct_answer: correct_answer.into(),
            options: None,
            created_at,
        }
    }

    /// Build a multiple-choice problem.
    #[must_use]
    pub fn with_options(
        category: Category,
        expression: impl Into<String>,
        correct_answer: impl Into<String>,
        options: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            expression: expression.into(),
            correct_answer: correct_answer.into(),
            options: Some(options),
            created_at,
        }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
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
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        self.options.is_some()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Exact string comparison against the correct answer.
    #[must_use]
    pub fn is_correct(&self, input: &str) -> bool {
        input == self.correct_answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn correctness_is_exact_string_equality() {
        let problem = Problem::new(Category::TwoDigitAddition, "27 + 56", "83", fixed_now());
        assert!(problem.is_correct("83"));
        assert!(!problem.is_correct(" 83"));
        assert!(!problem.is_correct("083"));
        assert!(!problem.is_multiple_choice());
    }

    #[test]
    fn options_are_exposed_as_slice() {
        let options = vec!["1.10".into(), "1.11".into(), "1.12".into(), "1.13".into()];
        let problem = Problem::with_options(
            Category::FourDigitDivision,
            "1234 ÷ 1100",
            "1.12",
            options,
            fixed_now(),
        );
        assert!(problem.is_multiple_choice());
        assert_eq!(problem.options().map(<[String]>::len), Some(4));
    }
}
