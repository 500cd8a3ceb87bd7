mod progress;
mod ticker;
mod tracker;
mod workflow;

// Public API of the practice subsystem.
pub use crate::error::SessionError;
pub use progress::{ElapsedSnapshot, PracticeProgress, format_elapsed};
pub use ticker::{ElapsedTicker, TICK_PERIOD};
pub use tracker::{PracticeStatus, PracticeTracker, SubmitOutcome};
pub use workflow::{PracticeAnswerResult, PracticeLoopService};
