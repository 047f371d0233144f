//! Contract for the remote study backend.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use study_core::model::{Question, QuestionId, Sentence, SessionId, StoryId};

use crate::error::ApiError;

pub use http::HttpStudyApi;
pub use reqwest::StatusCode;

/// Remote operations consumed by the session managers.
#[async_trait]
pub trait StudyApi: Send + Sync {
    /// Open a new assessment session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures or non-success responses.
    async fn start_assessment(&self) -> Result<StartAssessmentResponse, ApiError>;

    /// Submit an answer for one question.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures or non-success responses.
    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError>;

    /// Create a story with the given title.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures or non-success responses.
    async fn start_story(&self, title: &str) -> Result<StartStoryResponse, ApiError>;

    /// Append a sentence to a story.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures or non-success responses.
    async fn add_sentence(
        &self,
        story_id: &StoryId,
        sentence: &str,
    ) -> Result<AddSentenceResponse, ApiError>;

    /// Mark a story as finished.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures or non-success responses.
    async fn complete_story(&self, story_id: &StoryId) -> Result<Value, ApiError>;

    /// Read the writer's overall story progress.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures or non-success responses.
    async fn story_progress(&self) -> Result<Value, ApiError>;

    /// List the writer's stories.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures or non-success responses.
    async fn list_stories(&self) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartAssessmentResponse {
    pub session_id: SessionId,
    pub questions: Vec<Question>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    /// Missing verdicts read as incorrect; the answer is still recorded.
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub feedback: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartStoryResponse {
    pub story_id: StoryId,
    #[serde(default)]
    pub guidance: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddSentenceResponse {
    pub sentence: Sentence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
