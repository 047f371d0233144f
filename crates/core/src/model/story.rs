use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::StoryId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoryStateError {
    #[error("no current story found")]
    NoCurrentStory,

    #[error("story {story_id} is already completed")]
    AlreadyCompleted { story_id: StoryId },

    #[error("story status is {status} but no story is set")]
    StatusWithoutStory { status: StoryStatus },
}

/// The story being written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    #[serde(default)]
    pub guidance: Option<String>,
}

impl Story {
    #[must_use]
    pub fn new(id: impl Into<StoryId>, title: impl Into<String>, guidance: Option<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            guidance,
        }
    }
}

/// Lifecycle of a story. Only moves forward, except through an explicit
/// clear or a new current story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl StoryStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StoryStatus::NotStarted => "not_started",
            StoryStatus::InProgress => "in_progress",
            StoryStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sentence as returned by the story backend. Kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sentence(Value);

impl Sentence {
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// In-memory state of the story-writing session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryState {
    current_story: Option<Story>,
    sentences: Vec<Sentence>,
    status: StoryStatus,
    last_error: Option<String>,
}

impl StoryState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate state from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoryStateError` when sentences or a started status exist
    /// without a story to belong to.
    pub fn from_persisted(
        current_story: Option<Story>,
        sentences: Vec<Sentence>,
        status: StoryStatus,
        last_error: Option<String>,
    ) -> Result<Self, StoryStateError> {
        if current_story.is_none() {
            if status != StoryStatus::NotStarted {
                return Err(StoryStateError::StatusWithoutStory { status });
            }
            if !sentences.is_empty() {
                return Err(StoryStateError::NoCurrentStory);
            }
        }
        Ok(Self {
            current_story,
            sentences,
            status,
            last_error,
        })
    }

    #[must_use]
    pub fn current_story(&self) -> Option<&Story> {
        self.current_story.as_ref()
    }

    #[must_use]
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Always equal to the number of sentences.
    #[must_use]
    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    #[must_use]
    pub fn status(&self) -> StoryStatus {
        self.status
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start writing `story` from scratch.
    pub fn begin(&mut self, story: Story) {
        self.current_story = Some(story);
        self.sentences.clear();
        self.status = StoryStatus::InProgress;
        self.last_error = None;
    }

    /// Adopt a story created elsewhere without starting it.
    pub fn set_current(&mut self, story: Story) {
        self.current_story = Some(story);
        self.sentences.clear();
        self.status = StoryStatus::NotStarted;
        self.last_error = None;
    }

    /// # Errors
    ///
    /// Returns `NoCurrentStory` when no story is set.
    pub fn require_story(&self) -> Result<&Story, StoryStateError> {
        self.current_story
            .as_ref()
            .ok_or(StoryStateError::NoCurrentStory)
    }

    /// The current story, provided it still accepts sentences.
    ///
    /// # Errors
    ///
    /// Returns `NoCurrentStory` or `AlreadyCompleted`.
    pub fn require_open_story(&self) -> Result<&Story, StoryStateError> {
        let story = self.require_story()?;
        if self.status == StoryStatus::Completed {
            return Err(StoryStateError::AlreadyCompleted {
                story_id: story.id.clone(),
            });
        }
        Ok(story)
    }

    /// # Errors
    ///
    /// Returns `StoryStateError` if the story is missing or completed.
    pub fn push_sentence(&mut self, sentence: Sentence) -> Result<(), StoryStateError> {
        self.require_open_story()?;
        self.sentences.push(sentence);
        self.last_error = None;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NoCurrentStory` when no story is set.
    pub fn mark_completed(&mut self) -> Result<(), StoryStateError> {
        self.require_story()?;
        self.status = StoryStatus::Completed;
        self.last_error = None;
        Ok(())
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
