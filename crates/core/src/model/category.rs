use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown problem category: {raw}")]
pub struct ParseCategoryError {
    raw: String,
}

//
// ─── CATEGORY ─────────────────────────────────────────────────────────────────
//

/// The nine kinds of arithmetic practice.
///
/// `Mixed` is a meta category: each generated problem picks one of the
/// eight concrete kinds and carries that concrete category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Mixed,
    TwoDigitAddition,
    TwoDigitSubtraction,
    ThreeDigitAddition,
    ThreeDigitSubtraction,
    /// Two-digit number times a single digit.
    TwoDigitMultiplication,
    /// Five-digit dividend over a two-digit divisor; only the leading quotient digit is asked.
    DivisionLeadingDigit,
    /// Five-digit dividend over a three-digit divisor; the first two quotient digits are asked.
    DivisionTwoDigits,
    /// Four-digit over four-digit, answered by picking one of four options.
    FourDigitDivision,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Mixed,
        Category::TwoDigitAddition,
        Category::TwoDigitSubtraction,
        Category::ThreeDigitAddition,
        Category::ThreeDigitSubtraction,
        Category::TwoDigitMultiplication,
        Category::DivisionLeadingDigit,
        Category::DivisionTwoDigits,
        Category::FourDigitDivision,
    ];

    /// Every category except `Mixed`.
    pub const CONCRETE: [Category; 8] = [
        Category::TwoDigitAddition,
        Category::TwoDigitSubtraction,
        Category::ThreeDigitAddition,
        Category::ThreeDigitSubtraction,
        Category::TwoDigitMultiplication,
        Category::DivisionLeadingDigit,
        Category::DivisionTwoDigits,
        Category::FourDigitDivision,
    ];

    /// Stable slug used for storage and the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Mixed => "mixed",
            Category::TwoDigitAddition => "two_digit_addition",
            Category::TwoDigitSubtraction => "two_digit_subtraction",
            Category::ThreeDigitAddition => "three_digit_addition",
            Category::ThreeDigitSubtraction => "three_digit_subtraction",
            Category::TwoDigitMultiplication => "two_digit_multiplication",
            Category::DivisionLeadingDigit => "division_leading_digit",
            Category::DivisionTwoDigits => "division_two_digits",
            Category::FourDigitDivision => "four_digit_division",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Mixed => "Mixed practice",
            Category::TwoDigitAddition => "Two-digit addition",
            Category::TwoDigitSubtraction => "Two-digit subtraction",
            Category::ThreeDigitAddition => "Three-digit addition",
            Category::ThreeDigitSubtraction => "Three-digit subtraction",
            Category::TwoDigitMultiplication => "Two-digit multiplication",
            Category::DivisionLeadingDigit => "Division by a two-digit number",
            Category::DivisionTwoDigits => "Division by a three-digit number",
            Category::FourDigitDivision => "Four-digit division",
        }
    }

    #[must_use]
    pub fn example(self) -> &'static str {
        match self {
            Category::Mixed => "all operations",
            Category::TwoDigitAddition => "27 + 56",
            Category::TwoDigitSubtraction => "89 - 34",
            Category::ThreeDigitAddition => "143 + 258",
            Category::ThreeDigitSubtraction => "726 - 319",
            Category::TwoDigitMultiplication => "25 × 7",
            Category::DivisionLeadingDigit => "86313 ÷ 41",
            Category::DivisionTwoDigits => "86313 ÷ 411",
            Category::FourDigitDivision => "8631 ÷ 4112",
        }
    }

    /// How the answer is expected to be worked out.
    #[must_use]
    pub fn practice_hint(self) -> &'static str {
        match self {
            Category::Mixed => "comprehensive practice",
            Category::TwoDigitAddition
            | Category::TwoDigitSubtraction
            | Category::ThreeDigitAddition
            | Category::ThreeDigitSubtraction
            | Category::TwoDigitMultiplication => "mental arithmetic",
            Category::DivisionLeadingDigit => {
                "mental, leading quotient digit only, no rounding (86313 ÷ 41 gives 2)"
            }
            Category::DivisionTwoDigits => {
                "on paper, first two quotient digits, no rounding (86313 ÷ 411 gives 21)"
            }
            Category::FourDigitDivision => {
                "exam style, truncate by the gap between options; 4 min excellent, 6 min pass"
            }
        }
    }

    #[must_use]
    pub fn recommended_question_count(self) -> u32 {
        match self {
            Category::TwoDigitMultiplication => 40,
            _ => 20,
        }
    }

    /// Target time for a full set at the recommended question count.
    #[must_use]
    pub fn recommended_time(self) -> Duration {
        let secs = match self {
            Category::TwoDigitAddition | Category::TwoDigitSubtraction => 120,
            Category::Mixed | Category::ThreeDigitAddition | Category::ThreeDigitSubtraction => 180,
            Category::TwoDigitMultiplication => 90,
            Category::DivisionLeadingDigit => 60,
            Category::DivisionTwoDigits | Category::FourDigitDivision => 240,
        };
        Duration::seconds(secs)
    }

    #[must_use]
    pub fn is_multiple_choice(self) -> bool {
        matches!(self, Category::FourDigitDivision)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    /// Accepts the snake_case slug; dashes are treated as underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ParseCategoryError { raw: s.to_owned() })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip_through_from_str() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn from_str_accepts_dashed_slugs() {
        let parsed: Category = "Two-Digit-Addition".parse().unwrap();
        assert_eq!(parsed, Category::TwoDigitAddition);
        assert!("square_roots".parse::<Category>().is_err());
    }

    #[test]
    fn concrete_excludes_mixed() {
        assert!(!Category::CONCRETE.contains(&Category::Mixed));
        assert_eq!(Category::CONCRETE.len() + 1, Category::ALL.len());
    }

    #[test]
    fn recommendations_follow_category() {
        assert_eq!(Category::TwoDigitMultiplication.recommended_question_count(), 40);
        assert_eq!(Category::Mixed.recommended_question_count(), 20);
        assert_eq!(Category::TwoDigitMultiplication.recommended_time(), Duration::seconds(90));
        assert_eq!(Category::DivisionLeadingDigit.recommended_time(), Duration::minutes(1));
    }
}
