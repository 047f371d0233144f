mod assessment;
mod slot;
mod story;

// Public API of the session subsystem.
pub use crate::error::{AssessmentError, StoryError};
pub use assessment::AssessmentSession;
pub use slot::HydrateOutcome;
pub(crate) use slot::SnapshotSlot;
pub use story::StorySession;
