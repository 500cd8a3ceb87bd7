mod answer;
mod category;
mod ids;
mod preferences;
mod problem;
mod session;
mod wrong_answer;

pub use answer::SubmittedAnswer;
pub use category::{Category, ParseCategoryError};
pub use ids::{ParseIdError, SessionId, WrongAnswerId};
pub use preferences::{
    DEFAULT_QUESTIONS_PER_SESSION, PreferencesError, PreferencesUpdate,
    QUESTIONS_PER_SESSION_RANGE, UserPreferences,
};
pub use problem::Problem;
pub use session::{PerformanceTier, PracticeSession, PracticeSessionError};
pub use wrong_answer::{MistakeFilter, WrongAnswerRecord};
