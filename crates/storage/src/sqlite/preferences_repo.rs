use quickcal_core::model::UserPreferences;

use super::SqliteRepository;
use super::mapping::{conn, map_preferences_row};
use crate::repository::{PreferencesRepository, StorageError};

#[async_trait::async_trait]
impl PreferencesRepository for SqliteRepository {
    async fn get_preferences(&self) -> Result<Option<UserPreferences>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT questions_per_session, sound_enabled, haptic_feedback_enabled,
                   auto_submit_enabled, created_at, updated_at
            FROM user_preferences
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;
        row.as_ref().map(map_preferences_row).transpose()
    }

    async fn save_preferences(&self, preferences: &UserPreferences) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_preferences (
                id, questions_per_session, sound_enabled, haptic_feedback_enabled,
                auto_submit_enabled, created_at, updated_at
            )
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                questions_per_session = excluded.questions_per_session,
                sound_enabled = excluded.sound_enabled,
                haptic_feedback_enabled = excluded.haptic_feedback_enabled,
                auto_submit_enabled = excluded.auto_submit_enabled,
                updated_at = excluded.updated_at
            ",
        )
        .bind(i64::from(preferences.questions_per_session()))
        .bind(preferences.sound_enabled())
        .bind(preferences.haptic_feedback_enabled())
        .bind(preferences.auto_submit_enabled())
        .bind(preferences.created_at())
        .bind(preferences.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn clear_preferences(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM user_preferences")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
