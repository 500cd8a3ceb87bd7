use std::sync::Arc;

use quickcal_core::model::{PreferencesUpdate, UserPreferences};
use storage::repository::PreferencesRepository;

use crate::Clock;
use crate::error::PreferencesServiceError;

#[derive(Clone)]
pub struct PreferencesService {
    clock: Clock,
    repo: Arc<dyn PreferencesRepository>,
}

impl PreferencesService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn PreferencesRepository>) -> Self {
        Self { clock, repo }
    }

    /// Load persisted preferences (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` on storage failures.
    pub async fn load(&self) -> Result<UserPreferences, PreferencesServiceError> {
        let stored = self.repo.get_preferences().await?;
        Ok(stored.unwrap_or_else(|| UserPreferences::defaults(self.clock.now())))
    }

    /// Validate and persist a partial update.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` if validation fails or persistence fails.
    pub async fn update(
        &self,
        update: PreferencesUpdate,
    ) -> Result<UserPreferences, PreferencesServiceError> {
        let mut preferences = self.load().await?;
        preferences.apply(update, self.clock.now())?;
        self.repo.save_preferences(&preferences).await?;
        tracing::debug!(
            questions_per_session = preferences.questions_per_session(),
            "saved preferences"
        );
        Ok(preferences)
    }

    /// Replace stored preferences with first-launch defaults.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` on storage failures.
    pub async fn restore_defaults(&self) -> Result<UserPreferences, PreferencesServiceError> {
        let defaults = UserPreferences::defaults(self.clock.now());
        self.repo.save_preferences(&defaults).await?;
        Ok(defaults)
    }
}
