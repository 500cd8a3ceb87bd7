use std::sync::Arc;

use quickcal_core::generator::QuestionGenerator;
use quickcal_core::model::{MistakeFilter, UserPreferences};
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::history_service::HistoryService;
use crate::mistakes_service::MistakeService;
use crate::practice::PracticeLoopService;
use crate::preferences_service::PreferencesService;

/// What a full data reset removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetSummary {
    pub sessions_removed: u64,
    pub wrong_answers_removed: u64,
    pub preferences: UserPreferences,
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    practice: Arc<PracticeLoopService>,
    mistakes: Arc<MistakeService>,
    history: Arc<HistoryService>,
    preferences: Arc<PreferencesService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, generator))
    }

    /// Build services over fresh in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, generator: Arc<dyn QuestionGenerator>) -> Self {
        Self::from_storage(Storage::in_memory(), clock, generator)
    }

    #[must_use]
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Self {
        let practice = Arc::new(PracticeLoopService::new(
            clock.clone(),
            generator,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.wrong_answers),
        ));
        let mistakes = Arc::new(MistakeService::new(Arc::clone(&storage.wrong_answers)));
        let history = Arc::new(HistoryService::new(
            clock.clone(),
            Arc::clone(&storage.sessions),
        ));
        let preferences = Arc::new(PreferencesService::new(
            clock,
            Arc::clone(&storage.preferences),
        ));

        Self {
            storage,
            practice,
            mistakes,
            history,
            preferences,
        }
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeLoopService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn mistakes(&self) -> Arc<MistakeService> {
        Arc::clone(&self.mistakes)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn preferences(&self) -> Arc<PreferencesService> {
        Arc::clone(&self.preferences)
    }

    /// Delete every session and notebook entry and restore default preferences.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if any deletion or the preferences reset fails.
    pub async fn reset_all_data(&self) -> Result<ResetSummary, AppServicesError> {
        let sessions_removed = self.storage.sessions.delete_all_sessions().await?;
        let wrong_answers_removed = self
            .storage
            .wrong_answers
            .delete_wrong_answers(MistakeFilter::All)
            .await?;
        let preferences = self.preferences.restore_defaults().await?;
        tracing::info!(sessions_removed, wrong_answers_removed, "reset all data");

        Ok(ResetSummary {
            sessions_removed,
            wrong_answers_removed,
            preferences,
        })
    }
}
