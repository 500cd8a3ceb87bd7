use chrono::{DateTime, Utc};
use quickcal_core::generator::QuestionGenerator;
use quickcal_core::model::{Category, PracticeSession, Problem, SessionId, SubmittedAnswer};
use quickcal_core::timer::PauseTimer;

use super::progress::{ElapsedSnapshot, PracticeProgress};
use crate::error::SessionError;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a practice run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeStatus {
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

/// What happened when an answer was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub answer: SubmittedAnswer,
    /// Set for incorrect answers; the caller owns the notebook write.
    pub needs_wrong_answer_upsert: bool,
    pub is_complete: bool,
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

struct ActiveRun {
    problems: Vec<Problem>,
    current: usize,
    session: PracticeSession,
    session_timer: PauseTimer,
    question_timer: PauseTimer,
}

/// In-memory practice run over a fixed list of generated problems.
///
/// Owned by one caller; every transition takes `now` explicitly so the
/// services layer clock keeps timing deterministic.
#[derive(Default)]
pub struct PracticeTracker {
    run: Option<ActiveRun>,
}

impl PracticeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate `count` problems and begin timing the first one.
    ///
    /// Any previous run is discarded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `count` is zero or the generator yields nothing.
    pub fn start(
        &mut self,
        generator: &dyn QuestionGenerator,
        category: Category,
        count: u32,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if count == 0 {
            return Err(SessionError::Empty);
        }
        let requested = usize::try_from(count).map_err(|_| SessionError::Empty)?;
        let problems = generator.generate(category, requested, now);
        self.start_with_problems(category, problems, now)
    }

    /// Begin a run over an explicit problem list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `problems` is empty.
    pub fn start_with_problems(
        &mut self,
        category: Category,
        problems: Vec<Problem>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if problems.is_empty() {
            return Err(SessionError::Empty);
        }
        let total = u32::try_from(problems.len()).map_err(|_| SessionError::Empty)?;

        self.run = Some(ActiveRun {
            problems,
            current: 0,
            session: PracticeSession::new(category, total, now),
            session_timer: PauseTimer::start(now),
            question_timer: PauseTimer::start(now),
        });
        Ok(())
    }

    /// Grade `input` against the current problem and advance.
    ///
    /// Finalizes the session on the last problem.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted`, `Paused` or `Completed` when no answer can be taken.
    pub fn submit_answer(
        &mut self,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, SessionError> {
        let run = self.run.as_mut().ok_or(SessionError::NotStarted)?;
        if run.session.is_completed() {
            return Err(SessionError::Completed);
        }
        if run.session_timer.is_paused() {
            return Err(SessionError::Paused);
        }
        let problem = run.problems.get(run.current).ok_or(SessionError::Completed)?;

        let time_spent = run.question_timer.elapsed(now);
        let answer = SubmittedAnswer::grade(problem, input, time_spent, now);
        run.session.record_answer(answer.clone())?;
        run.current += 1;

        let is_complete = run.current >= run.problems.len();
        if is_complete {
            let total_time = run.session_timer.elapsed(now);
            run.session.finalize(now, total_time)?;
        } else {
            run.question_timer = PauseTimer::start(now);
        }

        Ok(SubmitOutcome {
            needs_wrong_answer_upsert: !answer.is_correct,
            answer,
            is_complete,
        })
    }

    /// Pause a running session or resume a paused one, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` or `Completed` outside an active run.
    pub fn toggle_pause(&mut self, now: DateTime<Utc>) -> Result<PracticeStatus, SessionError> {
        let run = self.run.as_mut().ok_or(SessionError::NotStarted)?;
        if run.session.is_completed() {
            return Err(SessionError::Completed);
        }

        if run.session_timer.is_paused() {
            run.session_timer.resume(now);
            run.question_timer.resume(now);
            Ok(PracticeStatus::InProgress)
        } else {
            run.session_timer.pause(now);
            run.question_timer.pause(now);
            Ok(PracticeStatus::Paused)
        }
    }

    /// Drop the current run.
    pub fn reset(&mut self) {
        self.run = None;
    }

    pub fn set_session_id(&mut self, id: SessionId) {
        if let Some(run) = self.run.as_mut() {
            run.session.set_id(id);
        }
    }

    #[must_use]
    pub fn status(&self) -> PracticeStatus {
        match &self.run {
            None => PracticeStatus::NotStarted,
            Some(run) if run.session.is_completed() => PracticeStatus::Completed,
            Some(run) if run.session_timer.is_paused() => PracticeStatus::Paused,
            Some(_) => PracticeStatus::InProgress,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status() == PracticeStatus::Completed
    }

    /// The problem awaiting an answer, if any.
    #[must_use]
    pub fn current_problem(&self) -> Option<&Problem> {
        let run = self.run.as_ref()?;
        run.problems.get(run.current)
    }

    /// Zero-based index of the current problem.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.run.as_ref().map_or(0, |run| run.current)
    }

    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        self.run.as_ref().map_or(&[][..], |run| run.problems.as_slice())
    }

    #[must_use]
    pub fn session(&self) -> Option<&PracticeSession> {
        self.run.as_ref().map(|run| &run.session)
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session().and_then(PracticeSession::id)
    }

    #[must_use]
    pub fn progress(&self) -> PracticeProgress {
        let total = self.problems().len();
        let answered = self.session().map_or(0, |s| s.answers().len());
        PracticeProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.session().map_or(0, PracticeSession::correct_answers)
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.session().map_or(0, PracticeSession::wrong_answers)
    }

    /// Active session and question time as of `now`.
    ///
    /// Frozen at the final values once the session is completed.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> ElapsedSnapshot {
        let Some(run) = &self.run else {
            return ElapsedSnapshot::zero();
        };
        if run.session.is_completed() {
            return ElapsedSnapshot {
                session: run.session.total_time(),
                question: run
                    .session
                    .answers()
                    .last()
                    .map_or_else(chrono::Duration::zero, |a| a.time_spent),
            };
        }
        ElapsedSnapshot {
            session: run.session_timer.elapsed(now),
            question: run.question_timer.elapsed(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quickcal_core::time::fixed_now;

    struct FixedProblems(Vec<(&'static str, &'static str)>);

    impl QuestionGenerator for FixedProblems {
        fn generate(
            &self,
            category: Category,
            count: usize,
            created_at: DateTime<Utc>,
        ) -> Vec<Problem> {
            self.0
                .iter()
                .cycle()
                .take(count)
                .map(|(expr, answer)| Problem::new(category, *expr, *answer, created_at))
                .collect()
        }
    }

    fn additions() -> FixedProblems {
        FixedProblems(vec![("27 + 56", "83"), ("45 + 12", "57"), ("33 + 21", "54")])
    }

    #[test]
    fn zero_count_is_rejected() {
        let mut tracker = PracticeTracker::new();
        let err = tracker
            .start(&additions(), Category::TwoDigitAddition, 0, fixed_now())
            .unwrap_err();
        assert!(matches!(err, SessionError::Empty));
        assert_eq!(tracker.status(), PracticeStatus::NotStarted);
    }

    #[test]
    fn submitting_before_start_fails() {
        let mut tracker = PracticeTracker::new();
        assert!(matches!(
            tracker.submit_answer("1", fixed_now()),
            Err(SessionError::NotStarted)
        ));
        assert!(matches!(
            tracker.toggle_pause(fixed_now()),
            Err(SessionError::NotStarted)
        ));
    }

    #[test]
    fn answers_advance_and_finalize_once() {
        let t0 = fixed_now();
        let mut tracker = PracticeTracker::new();
        tracker
            .start(&additions(), Category::TwoDigitAddition, 2, t0)
            .unwrap();
        assert_eq!(tracker.current_problem().unwrap().expression(), "27 + 56");

        let first = tracker.submit_answer("83", t0 + Duration::seconds(3)).unwrap();
        assert!(first.answer.is_correct);
        assert!(!first.needs_wrong_answer_upsert);
        assert_eq!(first.answer.time_spent, Duration::seconds(3));
        assert!(!first.is_complete);

        let second = tracker.submit_answer("56", t0 + Duration::seconds(8)).unwrap();
        assert!(second.needs_wrong_answer_upsert);
        assert_eq!(second.answer.time_spent, Duration::seconds(5));
        assert!(second.is_complete);

        let session = tracker.session().unwrap();
        assert!(session.is_completed());
        assert_eq!(session.ended_at(), Some(t0 + Duration::seconds(8)));
        assert_eq!(session.total_time(), Duration::seconds(8));
        assert_eq!(session.average_time(), Duration::seconds(4));
        assert_eq!(tracker.correct_count(), 1);
        assert_eq!(tracker.wrong_count(), 1);

        assert!(matches!(
            tracker.submit_answer("83", t0 + Duration::seconds(9)),
            Err(SessionError::Completed)
        ));
        assert!(tracker.current_problem().is_none());
    }

    #[test]
    fn paused_time_is_excluded_from_both_timers() {
        let t0 = fixed_now();
        let mut tracker = PracticeTracker::new();
        tracker
            .start(&additions(), Category::TwoDigitAddition, 2, t0)
            .unwrap();

        assert_eq!(
            tracker.toggle_pause(t0 + Duration::seconds(2)).unwrap(),
            PracticeStatus::Paused
        );
        assert!(matches!(
            tracker.submit_answer("83", t0 + Duration::seconds(5)),
            Err(SessionError::Paused)
        ));
        let frozen = tracker.elapsed(t0 + Duration::seconds(40));
        assert_eq!(frozen.session, Duration::seconds(2));
        assert_eq!(frozen.question, Duration::seconds(2));

        assert_eq!(
            tracker.toggle_pause(t0 + Duration::seconds(62)).unwrap(),
            PracticeStatus::InProgress
        );
        let outcome = tracker.submit_answer("83", t0 + Duration::seconds(63)).unwrap();
        assert_eq!(outcome.answer.time_spent, Duration::seconds(3));

        tracker.submit_answer("57", t0 + Duration::seconds(65)).unwrap();
        assert_eq!(tracker.session().unwrap().total_time(), Duration::seconds(5));
    }

    #[test]
    fn progress_and_reset() {
        let t0 = fixed_now();
        let mut tracker = PracticeTracker::new();
        tracker
            .start(&additions(), Category::TwoDigitAddition, 3, t0)
            .unwrap();
        tracker.submit_answer("0", t0).unwrap();

        let progress = tracker.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.remaining, 2);
        assert!(!progress.is_complete);

        tracker.reset();
        assert_eq!(tracker.status(), PracticeStatus::NotStarted);
        assert_eq!(tracker.progress().total, 0);
    }

    #[test]
    fn elapsed_freezes_after_completion() {
        let t0 = fixed_now();
        let mut tracker = PracticeTracker::new();
        tracker
            .start(&additions(), Category::TwoDigitAddition, 1, t0)
            .unwrap();
        tracker.submit_answer("83", t0 + Duration::seconds(4)).unwrap();

        let later = tracker.elapsed(t0 + Duration::minutes(10));
        assert_eq!(later.session, Duration::seconds(4));
        assert_eq!(later.question, Duration::seconds(4));
        assert!(matches!(
            tracker.toggle_pause(t0 + Duration::minutes(10)),
            Err(SessionError::Completed)
        ));
    }
}
