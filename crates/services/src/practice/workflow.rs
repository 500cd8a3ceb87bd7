use std::sync::Arc;

use quickcal_core::generator::QuestionGenerator;
use quickcal_core::model::{Category, SessionId, SubmittedAnswer, WrongAnswerId, WrongAnswerRecord};
use storage::repository::{PracticeSessionRepository, StorageError, WrongAnswerRepository};

use super::tracker::{PracticeStatus, PracticeTracker};
use crate::Clock;
use crate::error::SessionError;

/// Result of answering one problem through the persisted loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeAnswerResult {
    pub answer: SubmittedAnswer,
    pub is_complete: bool,
    /// Notebook record touched by an incorrect answer, when the write succeeded.
    pub wrong_answer_id: Option<WrongAnswerId>,
    /// Set once the completed session has been saved.
    pub saved_session_id: Option<SessionId>,
}

/// Orchestrates practice runs with best-effort persistence.
///
/// The in-memory tracker is authoritative; storage failures while starting or
/// answering are logged and never interrupt the run. `finalize_session`
/// retries the final save and surfaces its error.
#[derive(Clone)]
pub struct PracticeLoopService {
    clock: Clock,
    generator: Arc<dyn QuestionGenerator>,
    sessions: Arc<dyn PracticeSessionRepository>,
    wrong_answers: Arc<dyn WrongAnswerRepository>,
}

impl PracticeLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        generator: Arc<dyn QuestionGenerator>,
        sessions: Arc<dyn PracticeSessionRepository>,
        wrong_answers: Arc<dyn WrongAnswerRepository>,
    ) -> Self {
        Self {
            clock,
            generator,
            sessions,
            wrong_answers,
        }
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Start a run of `count` problems and record the session shell.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when `count` is zero.
    #[tracing::instrument(skip_all, fields(category = %category, count = count))]
    pub async fn start_practice(
        &self,
        category: Category,
        count: u32,
    ) -> Result<PracticeTracker, SessionError> {
        let mut tracker = PracticeTracker::new();
        tracker.start(self.generator.as_ref(), category, count, self.clock.now())?;

        if let Some(session) = tracker.session() {
            match self.sessions.insert_session(session).await {
                Ok(id) => tracker.set_session_id(id),
                Err(err) => tracing::warn!(error = %err, "failed to record session start"),
            }
        }
        tracing::info!(session_id = ?tracker.session_id(), "practice started");
        Ok(tracker)
    }

    /// Submit an answer for the current problem.
    ///
    /// Appends the answer, upserts the notebook on a miss, and saves the
    /// session when the last problem is answered. All three writes are best-effort.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the tracker rejects the submission.
    #[tracing::instrument(skip_all)]
    pub async fn submit_answer(
        &self,
        tracker: &mut PracticeTracker,
        input: &str,
    ) -> Result<PracticeAnswerResult, SessionError> {
        let outcome = tracker.submit_answer(input, self.clock.now())?;

        // Completion saves the whole answer list, so the append is only for in-progress runs.
        if let (false, Some(id)) = (outcome.is_complete, tracker.session_id()) {
            if let Err(err) = self.sessions.append_answer(id, &outcome.answer).await {
                tracing::warn!(error = %err, session_id = %id, "failed to append answer");
            }
        }

        let mut wrong_answer_id = None;
        if outcome.needs_wrong_answer_upsert {
            match self.record_wrong_answer(&outcome.answer).await {
                Ok(id) => wrong_answer_id = Some(id),
                Err(err) => tracing::warn!(
                    error = %err,
                    expression = %outcome.answer.expression,
                    "failed to update wrong-answer notebook"
                ),
            }
        }

        let mut saved_session_id = None;
        if outcome.is_complete {
            match self.persist(tracker).await {
                Ok(id) => {
                    saved_session_id = Some(id);
                    if let Some(session) = tracker.session() {
                        tracing::info!(
                            session_id = %id,
                            correct = session.correct_answers(),
                            total = session.total_questions(),
                            "practice finished"
                        );
                    }
                }
                Err(err) => tracing::warn!(error = %err, "failed to save completed session"),
            }
        }

        Ok(PracticeAnswerResult {
            answer: outcome.answer,
            is_complete: outcome.is_complete,
            wrong_answer_id,
            saved_session_id,
        })
    }

    /// # Errors
    ///
    /// Returns `SessionError` outside an active run.
    pub fn toggle_pause(
        &self,
        tracker: &mut PracticeTracker,
    ) -> Result<PracticeStatus, SessionError> {
        let status = tracker.toggle_pause(self.clock.now())?;
        tracing::debug!(?status, "toggled pause");
        Ok(status)
    }

    /// Save a completed session explicitly.
    ///
    /// Useful when the automatic save after the last answer failed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` or `InProgress` before completion,
    /// `SessionError::Storage` if persistence fails.
    #[tracing::instrument(skip_all)]
    pub async fn finalize_session(
        &self,
        tracker: &mut PracticeTracker,
    ) -> Result<SessionId, SessionError> {
        match tracker.status() {
            PracticeStatus::NotStarted => return Err(SessionError::NotStarted),
            PracticeStatus::InProgress | PracticeStatus::Paused => {
                return Err(SessionError::InProgress);
            }
            PracticeStatus::Completed => {}
        }
        Ok(self.persist(tracker).await?)
    }

    /// Upsert the notebook entry for an incorrect answer, keyed by exact expression text.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup or write fails.
    pub async fn record_wrong_answer(
        &self,
        answer: &SubmittedAnswer,
    ) -> Result<WrongAnswerId, StorageError> {
        let record = match self.wrong_answers.find_by_expression(&answer.expression).await? {
            Some(mut existing) => {
                existing.add_wrong_attempt(answer.user_answer.clone(), answer.answered_at);
                existing
            }
            None => WrongAnswerRecord::first_miss(answer),
        };
        self.wrong_answers.upsert_wrong_answer(&record).await
    }

    async fn persist(&self, tracker: &mut PracticeTracker) -> Result<SessionId, StorageError> {
        let session = tracker.session().ok_or(StorageError::NotFound)?;
        if session.id().is_some() {
            match self.sessions.save_session(session).await {
                Ok(()) => return session.id().ok_or(StorageError::NotFound),
                // The shell row is gone (e.g. data was reset mid-run); store it fresh.
                Err(StorageError::NotFound) => {}
                Err(err) => return Err(err),
            }
        }
        let id = self.sessions.insert_session(session).await?;
        tracker.set_session_id(id);
        Ok(id)
    }
}
