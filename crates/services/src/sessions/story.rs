use std::sync::Arc;

use serde_json::Value;
use storage::repository::{SnapshotStore, StorageError};
use storage::snapshot::StorySnapshot;
use study_core::model::{Sentence, Story, StoryState, StoryStatus};
use tracing::{info, warn};

use super::slot::{HydrateOutcome, Loaded, SnapshotSlot};
use crate::api::{AddSentenceResponse, StartStoryResponse, StudyApi};
use crate::error::{ApiError, StoryError};
use crate::notify::Notifier;

const START_FAILED: &str = "Failed to start story";
const ADD_SENTENCE_FAILED: &str = "Failed to add sentence";
const COMPLETE_FAILED: &str = "Failed to complete story";
const PROGRESS_FAILED: &str = "Failed to get progress";
const LIST_FAILED: &str = "Failed to get stories";

/// Owns the story-writing state and keeps it in sync with the backend and
/// durable storage.
///
/// Remote failures are recorded in `last_error`, sent to the notifier, and
/// returned as `StoryError::Remote` carrying the server's message or a fixed
/// fallback.
pub struct StorySession {
    api: Arc<dyn StudyApi>,
    notifier: Arc<dyn Notifier>,
    snapshots: SnapshotSlot<StorySnapshot>,
    state: StoryState,
}

impl StorySession {
    #[must_use]
    pub fn new(
        api: Arc<dyn StudyApi>,
        store: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            notifier,
            snapshots: SnapshotSlot::new(store),
            state: StoryState::new(),
        }
    }

    /// Restore state from the stored snapshot, filling missing fields with
    /// defaults. A snapshot that cannot be read at all is discarded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store itself cannot be read or the bad
    /// snapshot cannot be removed.
    pub async fn hydrate(&mut self) -> Result<HydrateOutcome, StorageError> {
        match self.snapshots.read().await? {
            Loaded::Missing => {
                self.state.reset();
                Ok(HydrateOutcome::Empty)
            }
            Loaded::Restored(state) => {
                self.state = state;
                Ok(HydrateOutcome::Restored)
            }
            Loaded::Corrupt(err) => {
                warn!(error = %err, "discarding unreadable story snapshot");
                self.notifier.notify_error(&err.to_string());
                self.state.reset();
                self.snapshots.clear().await?;
                Ok(HydrateOutcome::Recovered)
            }
        }
    }

    /// Write the full state to durable storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    pub async fn persist(&self) -> Result<(), StorageError> {
        self.snapshots.write(&self.state).await
    }

    #[must_use]
    pub fn state(&self) -> &StoryState {
        &self.state
    }

    #[must_use]
    pub fn current_story(&self) -> Option<&Story> {
        self.state.current_story()
    }

    #[must_use]
    pub fn sentences(&self) -> &[Sentence] {
        self.state.sentences()
    }

    #[must_use]
    pub fn sentence_count(&self) -> usize {
        self.state.sentence_count()
    }

    #[must_use]
    pub fn status(&self) -> StoryStatus {
        self.state.status()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error()
    }

    /// Create a story on the backend and start writing it.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Remote` if the backend call fails or
    /// `StoryError::Storage` if persisting fails.
    pub async fn start(
        &mut self,
        title: impl Into<String>,
    ) -> Result<StartStoryResponse, StoryError> {
        let title = title.into();
        let response = match self.api.start_story(&title).await {
            Ok(response) => response,
            Err(err) => return Err(self.remote_failure(err, START_FAILED)),
        };

        let story = Story::new(response.story_id.clone(), title, response.guidance.clone());
        info!(story_id = %story.id, "story started");
        self.state.begin(story);

        self.persist().await?;
        Ok(response)
    }

    /// Send a sentence for the current story and append what the backend
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::State` when no story is set or it is completed,
    /// `StoryError::Remote` if the backend call fails, or
    /// `StoryError::Storage` if persisting fails.
    pub async fn add_sentence(
        &mut self,
        sentence: &str,
    ) -> Result<AddSentenceResponse, StoryError> {
        let story_id = self.state.require_open_story()?.id.clone();
        let response = match self.api.add_sentence(&story_id, sentence).await {
            Ok(response) => response,
            Err(err) => return Err(self.remote_failure(err, ADD_SENTENCE_FAILED)),
        };

        self.state.push_sentence(response.sentence.clone())?;
        self.persist().await?;
        Ok(response)
    }

    /// Finish the current story.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::State` when no story is set,
    /// `StoryError::Remote` if the backend call fails, or
    /// `StoryError::Storage` if persisting fails.
    pub async fn complete(&mut self) -> Result<Value, StoryError> {
        let story_id = self.state.require_story()?.id.clone();
        let response = match self.api.complete_story(&story_id).await {
            Ok(response) => response,
            Err(err) => return Err(self.remote_failure(err, COMPLETE_FAILED)),
        };

        self.state.mark_completed()?;
        info!(story_id = %story_id, sentences = self.state.sentence_count(), "story completed");

        self.persist().await?;
        Ok(response)
    }

    /// Read overall progress from the backend. Does not touch the session
    /// unless the call fails.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Remote` if the backend call fails.
    pub async fn fetch_progress(&mut self) -> Result<Value, StoryError> {
        match self.api.story_progress().await {
            Ok(progress) => Ok(progress),
            Err(err) => Err(self.remote_failure(err, PROGRESS_FAILED)),
        }
    }

    /// List stories from the backend. Does not touch the session unless the
    /// call fails.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Remote` if the backend call fails.
    pub async fn list_stories(&mut self) -> Result<Value, StoryError> {
        match self.api.list_stories().await {
            Ok(stories) => Ok(stories),
            Err(err) => Err(self.remote_failure(err, LIST_FAILED)),
        }
    }

    /// Adopt a story that was created elsewhere. Progress starts over.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if persisting fails.
    pub async fn set_current_story(&mut self, story: Story) -> Result<(), StorageError> {
        self.state.set_current(story);
        self.persist().await
    }

    /// Drop all state and the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be removed.
    pub async fn clear(&mut self) -> Result<(), StorageError> {
        self.state.reset();
        self.snapshots.clear().await
    }

    fn remote_failure(&mut self, err: ApiError, fallback: &str) -> StoryError {
        let raw = err.to_string();
        warn!(error = %raw, operation = fallback, "story request failed");
        self.state.record_error(raw.clone());
        self.notifier.notify_error(&raw);

        let message = err
            .server_message()
            .map_or_else(|| fallback.to_owned(), ToOwned::to_owned);
        StoryError::Remote {
            message,
            source: err,
        }
    }
}
