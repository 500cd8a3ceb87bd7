//! Shared error types for the services crate.

use thiserror::Error;

use quickcal_core::model::{PracticeSessionError, PreferencesError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the practice tracker and the persisted practice loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no problems available for session")]
    Empty,
    #[error("no practice session has been started")]
    NotStarted,
    #[error("session already completed")]
    Completed,
    #[error("session is paused")]
    Paused,
    #[error("session is still in progress")]
    InProgress,
    #[error(transparent)]
    Session(#[from] PracticeSessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `MistakeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MistakeServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PreferencesService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PreferencesServiceError {
    #[error(transparent)]
    Preferences(#[from] PreferencesError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping or resetting app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Preferences(#[from] PreferencesServiceError),
}
