#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, PracticeSessionRepository, PreferencesRepository, SessionQuery, Storage,
    StorageError, WrongAnswerRepository,
};
