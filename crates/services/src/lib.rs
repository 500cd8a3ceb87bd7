#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod history_service;
pub mod mistakes_service;
pub mod practice;
pub mod preferences_service;

pub use quickcal_core::Clock;

pub use app_services::{AppServices, ResetSummary};
pub use error::{
    AppServicesError, HistoryServiceError, MistakeServiceError, PreferencesServiceError,
    SessionError,
};
pub use history_service::{HistoryRange, HistoryService, HistoryStats, ParseHistoryRangeError};
pub use mistakes_service::{MistakeCounts, MistakeGroup, MistakeService, RetryResult};
pub use practice::{
    ElapsedSnapshot, ElapsedTicker, PracticeAnswerResult, PracticeLoopService, PracticeProgress,
    PracticeStatus, PracticeTracker, SubmitOutcome,
};
pub use preferences_service::PreferencesService;
