use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quickcal_core::model::{
    Category, MistakeFilter, PracticeSession, SessionId, SubmittedAnswer, UserPreferences,
    WrongAnswerId, WrongAnswerRecord,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Filter for listing practice sessions, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuery {
    pub completed_only: bool,
    pub started_from: Option<DateTime<Utc>>,
    pub category: Option<Category>,
    /// Maximum rows returned; `None` returns every match.
    pub limit: Option<u32>,
}

impl SessionQuery {
    #[must_use]
    pub fn completed() -> Self {
        Self {
            completed_only: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limit(self, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    #[must_use]
    pub fn matches(&self, session: &PracticeSession) -> bool {
        (!self.completed_only || session.is_completed())
            && self
                .started_from
                .is_none_or(|from| session.started_at() >= from)
            && self.category.is_none_or(|c| session.category() == c)
    }
}

impl Default for SessionQuery {
    fn default() -> Self {
        Self {
            completed_only: false,
            started_from: None,
            category: None,
            limit: None,
        }
    }
}

/// Repository contract for practice sessions and their answers.
#[async_trait]
pub trait PracticeSessionRepository: Send + Sync {
    /// Insert a new session shell (and any answers it already holds).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn insert_session(&self, session: &PracticeSession) -> Result<SessionId, StorageError>;

    /// Overwrite a stored session, including its full answer list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session has no id or is missing.
    async fn save_session(&self, session: &PracticeSession) -> Result<(), StorageError>;

    /// Append one answer to a stored session, keeping its correct count in step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session is missing.
    async fn append_answer(
        &self,
        session_id: SessionId,
        answer: &SubmittedAnswer,
    ) -> Result<(), StorageError>;

    /// Fetch a session with its answers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_session(&self, id: SessionId) -> Result<PracticeSession, StorageError>;

    /// List sessions matching `query`, newest start first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query or mapping failures.
    async fn list_sessions(&self, query: &SessionQuery)
    -> Result<Vec<PracticeSession>, StorageError>;

    /// Delete every session and answer, returning the number of sessions removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if deletion fails.
    async fn delete_all_sessions(&self) -> Result<u64, StorageError>;
}

/// Repository contract for the wrong-answer notebook.
#[async_trait]
pub trait WrongAnswerRepository: Send + Sync {
    /// Exact, unnormalized match on the expression text.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failures.
    async fn find_by_expression(
        &self,
        expression: &str,
    ) -> Result<Option<WrongAnswerRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_wrong_answer(&self, id: WrongAnswerId) -> Result<WrongAnswerRecord, StorageError>;

    /// Insert a record without an id, or update the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when inserting an expression that already
    /// has a record, `StorageError::NotFound` when updating a missing id.
    async fn upsert_wrong_answer(
        &self,
        record: &WrongAnswerRecord,
    ) -> Result<WrongAnswerId, StorageError>;

    /// List records matching `filter`, most recently missed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query or mapping failures.
    async fn list_wrong_answers(
        &self,
        filter: MistakeFilter,
    ) -> Result<Vec<WrongAnswerRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn delete_wrong_answer(&self, id: WrongAnswerId) -> Result<(), StorageError>;

    /// Delete all records matching `filter`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if deletion fails.
    async fn delete_wrong_answers(&self, filter: MistakeFilter) -> Result<u64, StorageError>;
}

/// Repository contract for the singleton preferences record.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on query or mapping failures.
    async fn get_preferences(&self) -> Result<Option<UserPreferences>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the preferences cannot be stored.
    async fn save_preferences(&self, preferences: &UserPreferences) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if deletion fails.
    async fn clear_preferences(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<BTreeMap<SessionId, PracticeSession>>>,
    wrong_answers: Arc<Mutex<BTreeMap<WrongAnswerId, WrongAnswerRecord>>>,
    preferences: Arc<Mutex<Option<UserPreferences>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl PracticeSessionRepository for InMemoryRepository {
    async fn insert_session(&self, session: &PracticeSession) -> Result<SessionId, StorageError> {
        let id = SessionId::new(self.next_id());
        let mut stored = session.clone();
        stored.set_id(id);
        lock(&self.sessions)?.insert(id, stored);
        Ok(id)
    }

    async fn save_session(&self, session: &PracticeSession) -> Result<(), StorageError> {
        let id = session.id().ok_or(StorageError::NotFound)?;
        let mut guard = lock(&self.sessions)?;
        let slot = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        *slot = session.clone();
        Ok(())
    }

    async fn append_answer(
        &self,
        session_id: SessionId,
        answer: &SubmittedAnswer,
    ) -> Result<(), StorageError> {
        let mut guard = lock(&self.sessions)?;
        let session = guard.get_mut(&session_id).ok_or(StorageError::NotFound)?;
        session
            .record_answer(answer.clone())
            .map_err(|_| StorageError::Conflict)
    }

    async fn get_session(&self, id: SessionId) -> Result<PracticeSession, StorageError> {
        lock(&self.sessions)?
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<PracticeSession>, StorageError> {
        let guard = lock(&self.sessions)?;
        let mut found: Vec<_> = guard
            .values()
            .filter(|session| query.matches(session))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.started_at()
                .cmp(&a.started_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        if let Some(limit) = query.limit {
            found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(found)
    }

    async fn delete_all_sessions(&self) -> Result<u64, StorageError> {
        let mut guard = lock(&self.sessions)?;
        let removed = guard.len() as u64;
        guard.clear();
        Ok(removed)
    }
}

#[async_trait]
impl WrongAnswerRepository for InMemoryRepository {
    async fn find_by_expression(
        &self,
        expression: &str,
    ) -> Result<Option<WrongAnswerRecord>, StorageError> {
        Ok(lock(&self.wrong_answers)?
            .values()
            .find(|record| record.expression() == expression)
            .cloned())
    }

    async fn get_wrong_answer(&self, id: WrongAnswerId) -> Result<WrongAnswerRecord, StorageError> {
        lock(&self.wrong_answers)?
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn upsert_wrong_answer(
        &self,
        record: &WrongAnswerRecord,
    ) -> Result<WrongAnswerId, StorageError> {
        let mut guard = lock(&self.wrong_answers)?;
        if let Some(id) = record.id() {
            let slot = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
            *slot = record.clone();
            return Ok(id);
        }

        if guard
            .values()
            .any(|existing| existing.expression() == record.expression())
        {
            return Err(StorageError::Conflict);
        }
        let id = WrongAnswerId::new(self.next_id());
        let mut stored = record.clone();
        stored.set_id(id);
        guard.insert(id, stored);
        Ok(id)
    }

    async fn list_wrong_answers(
        &self,
        filter: MistakeFilter,
    ) -> Result<Vec<WrongAnswerRecord>, StorageError> {
        let guard = lock(&self.wrong_answers)?;
        let mut found: Vec<_> = guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.last_wrong_at()
                .cmp(&a.last_wrong_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(found)
    }

    async fn delete_wrong_answer(&self, id: WrongAnswerId) -> Result<(), StorageError> {
        lock(&self.wrong_answers)?
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn delete_wrong_answers(&self, filter: MistakeFilter) -> Result<u64, StorageError> {
        let mut guard = lock(&self.wrong_answers)?;
        let before = guard.len();
        guard.retain(|_, record| !filter.matches(record));
        Ok((before - guard.len()) as u64)
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryRepository {
    async fn get_preferences(&self) -> Result<Option<UserPreferences>, StorageError> {
        Ok(lock(&self.preferences)?.clone())
    }

    async fn save_preferences(&self, preferences: &UserPreferences) -> Result<(), StorageError> {
        *lock(&self.preferences)? = Some(preferences.clone());
        Ok(())
    }

    async fn clear_preferences(&self) -> Result<(), StorageError> {
        *lock(&self.preferences)? = None;
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn PracticeSessionRepository>,
    pub wrong_answers: Arc<dyn WrongAnswerRepository>,
    pub preferences: Arc<dyn PreferencesRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn PracticeSessionRepository> = Arc::new(repo.clone());
        let wrong_answers: Arc<dyn WrongAnswerRepository> = Arc::new(repo.clone());
        let preferences: Arc<dyn PreferencesRepository> = Arc::new(repo);
        Self {
            sessions,
            wrong_answers,
            preferences,
        }
    }
}
