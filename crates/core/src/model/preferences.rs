use chrono::{DateTime, Utc};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Allowed questions-per-session values.
pub const QUESTIONS_PER_SESSION_RANGE: RangeInclusive<u32> = 5..=50;

pub const DEFAULT_QUESTIONS_PER_SESSION: u32 = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PreferencesError {
    #[error("questions per session must be between 5 and 50, got {0}")]
    QuestionsPerSessionOutOfRange(u32),
}

/// Per-install practice preferences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPreferences {
    questions_per_session: u32,
    sound_enabled: bool,
    haptic_feedback_enabled: bool,
    auto_submit_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct PreferencesUpdate {
    pub questions_per_session: Option<u32>,
    pub sound_enabled: Option<bool>,
    pub haptic_feedback_enabled: Option<bool>,
    pub auto_submit_enabled: Option<bool>,
}

impl PreferencesUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions_per_session.is_none()
            && self.sound_enabled.is_none()
            && self.haptic_feedback_enabled.is_none()
            && self.auto_submit_enabled.is_none()
    }
}

impl UserPreferences {
    #[must_use]
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            questions_per_session: DEFAULT_QUESTIONS_PER_SESSION,
            sound_enabled: true,
            haptic_feedback_enabled: true,
            auto_submit_enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate preferences from storage.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesError` if the stored question count is out of range.
    pub fn from_persisted(
        questions_per_session: u32,
        sound_enabled: bool,
        haptic_feedback_enabled: bool,
        auto_submit_enabled: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, PreferencesError> {
        validate_questions(questions_per_session)?;
        Ok(Self {
            questions_per_session,
            sound_enabled,
            haptic_feedback_enabled,
            auto_submit_enabled,
            created_at,
            updated_at,
        })
    }

    /// Apply a partial update, bumping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesError` if the new question count is out of range;
    /// nothing is changed in that case.
    pub fn apply(
        &mut self,
        update: PreferencesUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), PreferencesError> {
        if let Some(count) = update.questions_per_session {
            validate_questions(count)?;
            self.questions_per_session = count;
        }
        if let Some(value) = update.sound_enabled {
            self.sound_enabled = value;
        }
        if let Some(value) = update.haptic_feedback_enabled {
            self.haptic_feedback_enabled = value;
        }
        if let Some(value) = update.auto_submit_enabled {
            self.auto_submit_enabled = value;
        }
        self.updated_at = now;
        Ok(())
    }

    #[must_use]
    pub fn questions_per_session(&self) -> u32 {
        self.questions_per_session
    }

    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    #[must_use]
    pub fn haptic_feedback_enabled(&self) -> bool {
        self.haptic_feedback_enabled
    }

    #[must_use]
    pub fn auto_submit_enabled(&self) -> bool {
        self.auto_submit_enabled
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn validate_questions(count: u32) -> Result<(), PreferencesError> {
    if QUESTIONS_PER_SESSION_RANGE.contains(&count) {
        Ok(())
    } else {
        Err(PreferencesError::QuestionsPerSessionOutOfRange(count))
    }
}
