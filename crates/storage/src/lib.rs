#![forbid(unsafe_code)]

pub mod repository;
pub mod snapshot;
pub mod sqlite;

pub use repository::{InMemoryRepository, SnapshotStore, Storage, StorageError};
pub use snapshot::{
    ASSESSMENT_KEY, AssessmentSnapshot, STORY_KEY, SessionSnapshot, SnapshotError, StorySnapshot,
};
