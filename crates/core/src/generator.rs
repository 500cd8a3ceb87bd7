//! Random arithmetic problem generation.
//!
//! Every rule is total over its operand ranges: values that would leave the
//! intended digit window are folded back instead of being redrawn.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

use crate::model::{Category, Problem};

/// Probability that a four-digit division problem uses the easy option set.
pub const EASY_CHOICE_PROBABILITY: f64 = 0.2;

/// Offsets (in hundredths) tried first for hard multiple-choice decoys.
const HARD_PREFERRED_OFFSETS: [i64; 3] = [-3, -1, 2];
/// Remaining offsets within ±0.03, used when a preferred decoy collides.
const HARD_FALLBACK_OFFSETS: [i64; 3] = [-2, 1, 3];

//
// ─── GENERATOR SEAM ────────────────────────────────────────────────────────────
//

/// Source of practice problems.
pub trait QuestionGenerator: Send + Sync {
    /// Produce exactly `count` problems of `category`.
    fn generate(&self, category: Category, count: usize, created_at: DateTime<Utc>)
    -> Vec<Problem>;
}

/// `QuestionGenerator` backed by a seedable `StdRng`.
#[derive(Debug)]
pub struct RandomQuestionGenerator {
    rng: Mutex<StdRng>,
}

impl RandomQuestionGenerator {
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible generator for tests and `--seed` runs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomQuestionGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl QuestionGenerator for RandomQuestionGenerator {
    fn generate(
        &self,
        category: Category,
        count: usize,
        created_at: DateTime<Utc>,
    ) -> Vec<Problem> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        generate_with(&mut *rng, category, count, created_at)
    }
}

//
// ─── RANDOM GENERATION ─────────────────────────────────────────────────────────
//

/// Generate `count` independent problems using `rng`.
pub fn generate_with<R: Rng + ?Sized>(
    rng: &mut R,
    category: Category,
    count: usize,
    created_at: DateTime<Utc>,
) -> Vec<Problem> {
    (0..count)
        .map(|_| generate_one(rng, category, created_at))
        .collect()
}

/// Generate a single problem. `Mixed` picks a concrete category uniformly.
pub fn generate_one<R: Rng + ?Sized>(
    rng: &mut R,
    category: Category,
    created_at: DateTime<Utc>,
) -> Problem {
    match category {
        Category::Mixed => {
            let concrete = Category::CONCRETE
                .choose(rng)
                .copied()
                .unwrap_or(Category::TwoDigitAddition);
            generate_one(rng, concrete, created_at)
        }
        Category::TwoDigitAddition => {
            let a = rng.random_range(10..=99);
            let b = rng.random_range(10..=99);
            addition(category, a, b, created_at)
        }
        Category::TwoDigitSubtraction => {
            let a = rng.random_range(10..=99);
            let b = rng.random_range(10..=a);
            subtraction(category, a, b, created_at)
        }
        Category::ThreeDigitAddition => {
            let a = rng.random_range(100..=999);
            let b = rng.random_range(100..=999);
            addition(category, a, b, created_at)
        }
        Category::ThreeDigitSubtraction => {
            let a = rng.random_range(100..=999);
            let b = rng.random_range(100..=a);
            subtraction(category, a, b, created_at)
        }
        Category::TwoDigitMultiplication => {
            let a = rng.random_range(10..=99);
            let b = rng.random_range(2..=9);
            multiplication(a, b, created_at)
        }
        Category::DivisionLeadingDigit => {
            let divisor = rng.random_range(10..=99);
            let seed = rng.random_range(1..=9);
            let remainder = rng.random_range(0..divisor);
            let dividend = construct_dividend(divisor, seed, remainder);
            division(category, dividend, divisor, created_at)
        }
        Category::DivisionTwoDigits => {
            let divisor = rng.random_range(100..=999);
            let seed = rng.random_range(10..=99);
            let remainder = rng.random_range(0..divisor);
            let dividend = construct_dividend(divisor, seed, remainder);
            division(category, dividend, divisor, created_at)
        }
        Category::FourDigitDivision => {
            let dividend = rng.random_range(1000..=9999);
            let divisor = rng.random_range(1000..=9999);
            let difficulty = if rng.random_bool(EASY_CHOICE_PROBABILITY) {
                ChoiceDifficulty::Easy
            } else {
                ChoiceDifficulty::Hard
            };
            four_digit_division(rng, dividend, divisor, difficulty, created_at)
        }
    }
}

//
// ─── BUILDERS ──────────────────────────────────────────────────────────────────
//

#[must_use]
pub fn addition(category: Category, a: u32, b: u32, created_at: DateTime<Utc>) -> Problem {
    Problem::new(category, format!("{a} + {b}"), (a + b).to_string(), created_at)
}

/// `b` is capped at `a` so the result is never negative.
#[must_use]
pub fn subtraction(category: Category, a: u32, b: u32, created_at: DateTime<Utc>) -> Problem {
    let b = b.min(a);
    Problem::new(category, format!("{a} - {b}"), (a - b).to_string(), created_at)
}

#[must_use]
pub fn multiplication(a: u32, b: u32, created_at: DateTime<Utc>) -> Problem {
    Problem::new(
        Category::TwoDigitMultiplication,
        format!("{a} × {b}"),
        (a * b).to_string(),
        created_at,
    )
}

/// Build `divisor * seed + remainder` and fold it into the five-digit window.
#[must_use]
pub fn construct_dividend(divisor: u32, seed: u32, remainder: u32) -> u32 {
    fold_dividend(divisor * seed + remainder)
}

/// Lift values below 10000 by 10000 and wrap values above 99999.
#[must_use]
pub fn fold_dividend(raw: u32) -> u32 {
    let lifted = if raw < 10_000 { raw + 10_000 } else { raw };
    if lifted > 99_999 {
        lifted % 90_000 + 10_000
    } else {
        lifted
    }
}

/// Quotient-prefix division.
///
/// The answer is the leading digit of the integer quotient for
/// `DivisionLeadingDigit`, and the first two digits (or the whole quotient if
/// shorter) for every other category.
#[must_use]
pub fn division(
    category: Category,
    dividend: u32,
    divisor: u32,
    created_at: DateTime<Utc>,
) -> Problem {
    let digits = match category {
        Category::DivisionLeadingDigit => 1,
        _ => 2,
    };
    let quotient = dividend / divisor.max(1);
    let answer: String = quotient.to_string().chars().take(digits).collect();
    Problem::new(category, format!("{dividend} ÷ {divisor}"), answer, created_at)
}

/// Option-set style for four-digit division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceDifficulty {
    /// One near decoy plus two that are easy to rule out.
    Easy,
    /// Three decoys within ±0.03 of the answer.
    Hard,
}

/// Multiple-choice division rounded half-up to two decimals.
pub fn four_digit_division<R: Rng + ?Sized>(
    rng: &mut R,
    dividend: u32,
    divisor: u32,
    difficulty: ChoiceDifficulty,
    created_at: DateTime<Utc>,
) -> Problem {
    let cents = quotient_cents(dividend, divisor);
    let mut options = vec![cents];

    match difficulty {
        ChoiceDifficulty::Easy => {
            push_distinct(rng, &mut options, |rng| {
                let offset = rng.random_range(1..=5);
                if rng.random_bool(0.5) || cents <= offset {
                    cents + offset
                } else {
                    cents - offset
                }
            });
            push_distinct(rng, &mut options, |rng| cents + rng.random_range(50..=150));
            push_distinct(rng, &mut options, |rng| {
                let offset = rng.random_range(50..=150);
                if cents > offset {
                    cents - offset
                } else {
                    cents + offset + 100
                }
            });
        }
        ChoiceDifficulty::Hard => {
            let mut fallback = HARD_FALLBACK_OFFSETS;
            fallback.shuffle(rng);
            for offset in HARD_PREFERRED_OFFSETS.into_iter().chain(fallback) {
                if options.len() == 4 {
                    break;
                }
                let Ok(decoy) = u32::try_from(i64::from(cents) + offset) else {
                    continue;
                };
                if decoy > 0 && !options.contains(&decoy) {
                    options.push(decoy);
                }
            }
        }
    }

    options.shuffle(rng);
    let options = options.into_iter().map(format_cents).collect();
    Problem::with_options(
        Category::FourDigitDivision,
        format!("{dividend} ÷ {divisor}"),
        format_cents(cents),
        options,
        created_at,
    )
}

/// `dividend / divisor` in hundredths, rounded half-up.
#[must_use]
pub fn quotient_cents(dividend: u32, divisor: u32) -> u32 {
    let divisor = divisor.max(1);
    (200 * dividend + divisor) / (2 * divisor)
}

#[must_use]
pub fn format_cents(cents: u32) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn push_distinct<R: Rng + ?Sized>(
    rng: &mut R,
    options: &mut Vec<u32>,
    mut draw: impl FnMut(&mut R) -> u32,
) {
    loop {
        let candidate = draw(rng);
        if !options.contains(&candidate) {
            options.push(candidate);
            return;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use std::collections::HashSet;

    const ROUNDS: usize = 500;

    fn operands(problem: &Problem, op: &str) -> (u32, u32) {
        let (a, b) = problem
            .expression()
            .split_once(&format!(" {op} "))
            .expect("binary expression");
        (a.parse().unwrap(), b.parse().unwrap())
    }

    fn cents_of(option: &str) -> i64 {
        let (whole, frac) = option.split_once('.').unwrap();
        whole.parse::<i64>().unwrap() * 100 + frac.parse::<i64>().unwrap()
    }

    #[test]
    fn addition_example_matches_expected_text() {
        let problem = addition(Category::TwoDigitAddition, 27, 56, fixed_now());
        assert_eq!(problem.expression(), "27 + 56");
        assert_eq!(problem.correct_answer(), "83");
        assert_eq!(problem.category(), Category::TwoDigitAddition);
    }

    #[test]
    fn generate_returns_exact_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for category in Category::ALL {
            let problems = generate_with(&mut rng, category, 13, fixed_now());
            assert_eq!(problems.len(), 13);
        }
        assert!(generate_with(&mut rng, Category::Mixed, 0, fixed_now()).is_empty());
    }

    #[test]
    fn two_digit_subtraction_is_non_negative_and_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for problem in generate_with(&mut rng, Category::TwoDigitSubtraction, ROUNDS, fixed_now()) {
            let (a, b) = operands(&problem, "-");
            assert!((10..=99).contains(&a), "{a}");
            assert!((10..=99).contains(&b), "{b}");
            assert!(b <= a);
            let result: i64 = problem.correct_answer().parse().unwrap();
            assert!(result >= 0);
            assert_eq!(result, i64::from(a) - i64::from(b));
        }
    }

    #[test]
    fn three_digit_operations_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(12);
        for problem in generate_with(&mut rng, Category::ThreeDigitAddition, ROUNDS, fixed_now()) {
            let (a, b) = operands(&problem, "+");
            assert!((100..=999).contains(&a) && (100..=999).contains(&b));
            assert_eq!(problem.correct_answer(), (a + b).to_string());
        }
        for problem in generate_with(&mut rng, Category::ThreeDigitSubtraction, ROUNDS, fixed_now())
        {
            let (a, b) = operands(&problem, "-");
            assert!((100..=999).contains(&b) && b <= a);
        }
    }

    #[test]
    fn multiplication_uses_single_digit_multiplier() {
        let mut rng = StdRng::seed_from_u64(13);
        for problem in
            generate_with(&mut rng, Category::TwoDigitMultiplication, ROUNDS, fixed_now())
        {
            let (a, b) = operands(&problem, "×");
            assert!((10..=99).contains(&a));
            assert!((2..=9).contains(&b));
            assert_eq!(problem.correct_answer(), (a * b).to_string());
        }
    }

    #[test]
    fn division_prefix_answers() {
        let leading = division(Category::DivisionLeadingDigit, 86_313, 41, fixed_now());
        assert_eq!(leading.expression(), "86313 ÷ 41");
        assert_eq!(leading.correct_answer(), "2");

        let two = division(Category::DivisionTwoDigits, 86_313, 411, fixed_now());
        assert_eq!(two.correct_answer(), "21");

        let short = division(Category::DivisionTwoDigits, 10_000, 9_000, fixed_now());
        assert_eq!(short.correct_answer(), "1");
    }

    #[test]
    fn dividends_fold_into_five_digits() {
        assert_eq!(fold_dividend(981), 10_981);
        assert_eq!(fold_dividend(54_321), 54_321);
        assert_eq!(fold_dividend(120_000), 40_000);
        assert_eq!(construct_dividend(41, 9, 40), 10_409);
    }

    #[test]
    fn generated_divisions_have_five_digit_dividends() {
        let mut rng = StdRng::seed_from_u64(14);
        for category in [Category::DivisionLeadingDigit, Category::DivisionTwoDigits] {
            for problem in generate_with(&mut rng, category, ROUNDS, fixed_now()) {
                let (dividend, divisor) = operands(&problem, "÷");
                assert!((10_000..=99_999).contains(&dividend));
                let quotient = (dividend / divisor).to_string();
                assert!(quotient.starts_with(problem.correct_answer()));
                let expected_len = if category == Category::DivisionLeadingDigit { 1 } else { 2 };
                assert_eq!(problem.correct_answer().len(), expected_len.min(quotient.len()));
            }
        }
    }

    #[test]
    fn four_digit_division_has_four_distinct_options_with_answer() {
        let mut rng = StdRng::seed_from_u64(15);
        for problem in generate_with(&mut rng, Category::FourDigitDivision, ROUNDS, fixed_now()) {
            let options = problem.options().expect("multiple choice");
            assert_eq!(options.len(), 4);
            let distinct: HashSet<_> = options.iter().collect();
            assert_eq!(distinct.len(), 4);
            assert!(options.iter().any(|o| o == problem.correct_answer()));
        }
    }

    #[test]
    fn hard_decoys_stay_within_three_hundredths() {
        let mut rng = StdRng::seed_from_u64(16);
        for _ in 0..ROUNDS {
            let dividend = rng.random_range(1000..=9999);
            let divisor = rng.random_range(1000..=9999);
            let problem = four_digit_division(
                &mut rng,
                dividend,
                divisor,
                ChoiceDifficulty::Hard,
                fixed_now(),
            );
            let correct = cents_of(problem.correct_answer());
            for option in problem.options().unwrap() {
                assert!((cents_of(option) - correct).abs() <= 3, "{option}");
            }
        }
    }

    #[test]
    fn easy_options_include_obvious_decoys() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..ROUNDS {
            let problem =
                four_digit_division(&mut rng, 8631, 4112, ChoiceDifficulty::Easy, fixed_now());
            let correct = cents_of(problem.correct_answer());
            let far = problem
                .options()
                .unwrap()
                .iter()
                .filter(|o| (cents_of(o) - correct).abs() >= 50)
                .count();
            assert_eq!(far, 2);
        }
    }

    #[test]
    fn quotient_rounds_half_up() {
        assert_eq!(format_cents(quotient_cents(8631, 4112)), "2.10");
        // 1001 / 8000 = 0.125125 -> 0.13
        assert_eq!(format_cents(quotient_cents(1001, 8000)), "0.13");
        assert_eq!(format_cents(quotient_cents(1000, 9999)), "0.10");
        assert_eq!(format_cents(quotient_cents(9999, 1000)), "10.00");
    }

    #[test]
    fn mixed_only_produces_concrete_categories() {
        let mut rng = StdRng::seed_from_u64(18);
        let problems = generate_with(&mut rng, Category::Mixed, ROUNDS, fixed_now());
        let seen: HashSet<_> = problems.iter().map(Problem::category).collect();
        assert!(!seen.contains(&Category::Mixed));
        assert!(seen.len() > 4);
        for problem in &problems {
            assert_eq!(
                problem.is_multiple_choice(),
                problem.category() == Category::FourDigitDivision
            );
        }
    }

    #[test]
    fn seeded_generators_are_reproducible() {
        let a = RandomQuestionGenerator::seeded(99).generate(Category::Mixed, 20, fixed_now());
        let b = RandomQuestionGenerator::seeded(99).generate(Category::Mixed, 20, fixed_now());
        assert_eq!(a, b);
    }
}
