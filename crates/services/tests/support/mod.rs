#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use services::api::{
    AddSentenceResponse, StartAssessmentResponse, StartStoryResponse, StatusCode,
    SubmitAnswerRequest, SubmitAnswerResponse,
};
use services::{ApiError, StudyApi};
use storage::InMemoryRepository;
use storage::repository::{SnapshotStore, StorageError};
use study_core::model::StoryId;

/// Canned backend: replies per operation, optional blanket failure, and a
/// log of every call with its payload.
#[derive(Default)]
pub struct FakeApi {
    replies: Mutex<HashMap<&'static str, Value>>,
    failure: Mutex<Option<(StatusCode, Option<String>)>>,
    calls: Mutex<Vec<(&'static str, Value)>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, op: &'static str, value: Value) {
        self.replies.lock().unwrap().insert(op, value);
    }

    pub fn fail(&self, status: StatusCode, message: Option<&str>) {
        *self.failure.lock().unwrap() = Some((status, message.map(ToOwned::to_owned)));
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<(&'static str, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn answer<T: DeserializeOwned>(&self, op: &'static str, payload: Value) -> Result<T, ApiError> {
        self.calls.lock().unwrap().push((op, payload));
        if let Some((status, message)) = self.failure.lock().unwrap().clone() {
            return Err(ApiError::Status { status, message });
        }
        let value = self
            .replies
            .lock()
            .unwrap()
            .get(op)
            .cloned()
            .unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl StudyApi for FakeApi {
    async fn start_assessment(&self) -> Result<StartAssessmentResponse, ApiError> {
        self.answer("start_assessment", Value::Null)
    }

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError> {
        self.answer("submit_answer", serde_json::to_value(request)?)
    }

    async fn start_story(&self, title: &str) -> Result<StartStoryResponse, ApiError> {
        self.answer("start_story", json!({ "title": title }))
    }

    async fn add_sentence(
        &self,
        story_id: &StoryId,
        sentence: &str,
    ) -> Result<AddSentenceResponse, ApiError> {
        self.answer(
            "add_sentence",
            json!({ "story_id": story_id, "sentence": sentence }),
        )
    }

    async fn complete_story(&self, story_id: &StoryId) -> Result<Value, ApiError> {
        self.answer("complete_story", json!({ "story_id": story_id }))
    }

    async fn story_progress(&self) -> Result<Value, ApiError> {
        self.answer("story_progress", Value::Null)
    }

    async fn list_stories(&self) -> Result<Value, ApiError> {
        self.answer("list_stories", Value::Null)
    }
}

pub fn store() -> InMemoryRepository {
    InMemoryRepository::new()
}

/// Store that reads as empty and refuses every write.
#[derive(Default)]
pub struct FailingStore;

#[async_trait]
impl SnapshotStore for FailingStore {
    async fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn save(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}
