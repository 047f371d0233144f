//! Persisted snapshot shapes for the session states.
//!
//! These mirror the domain states so they can be written as a single JSON
//! document without leaking storage concerns into the domain layer. Field
//! names are camelCase so snapshots stay readable by the web client.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use study_core::model::{
    AnswerRecord, AssessmentState, AssessmentStateError, Question, Sentence, SessionId, Story,
    StoryState, StoryStateError, StoryStatus,
};

use crate::repository::StorageError;

/// Storage key for the assessment snapshot.
pub const ASSESSMENT_KEY: &str = "assessment-state";
/// Storage key for the story snapshot.
pub const STORY_KEY: &str = "story-state";

/// Why a stored snapshot could not be turned back into state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON for this session: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Assessment(#[from] AssessmentStateError),
    #[error(transparent)]
    Story(#[from] StoryStateError),
}

/// A serializable view of one session's full state.
pub trait SessionSnapshot: Serialize + DeserializeOwned {
    type State;

    /// Fixed storage key the snapshot lives under.
    const KEY: &'static str;

    fn from_state(state: &Self::State) -> Self;

    /// Convert the record back into domain state.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the record breaks a state invariant.
    fn into_state(self) -> Result<Self::State, SnapshotError>;
}

/// Serialize `state` into the snapshot document for `S`.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode<S: SessionSnapshot>(state: &S::State) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&S::from_state(state))?)
}

/// Parse a snapshot document and rebuild the state it describes.
///
/// # Errors
///
/// Returns `SnapshotError` for malformed JSON or an inconsistent state.
pub fn decode<S: SessionSnapshot>(raw: &str) -> Result<S::State, SnapshotError> {
    serde_json::from_str::<S>(raw)?.into_state()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSnapshot {
    pub current_session: Option<SessionId>,
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub answers: Vec<AnswerRecord>,
}

impl SessionSnapshot for AssessmentSnapshot {
    type State = AssessmentState;
    const KEY: &'static str = ASSESSMENT_KEY;

    fn from_state(state: &AssessmentState) -> Self {
        Self {
            current_session: state.session_id().cloned(),
            questions: state.questions().to_vec(),
            current_question_index: state.current_index(),
            answers: state.answers().to_vec(),
        }
    }

    fn into_state(self) -> Result<AssessmentState, SnapshotError> {
        Ok(AssessmentState::from_persisted(
            self.current_session,
            self.questions,
            self.current_question_index,
            self.answers,
        )?)
    }
}

/// Story snapshot. Missing fields fall back to their defaults, so older or
/// partial snapshots are merged onto an empty state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorySnapshot {
    pub current_story: Option<Story>,
    pub sentences: Vec<Sentence>,
    pub story_status: StoryStatus,
    // Written for readers of the raw snapshot; recomputed on load.
    pub current_sentence_count: usize,
    pub error: Option<String>,
}

impl SessionSnapshot for StorySnapshot {
    type State = StoryState;
    const KEY: &'static str = STORY_KEY;

    fn from_state(state: &StoryState) -> Self {
        Self {
            current_story: state.current_story().cloned(),
            sentences: state.sentences().to_vec(),
            story_status: state.status(),
            current_sentence_count: state.sentence_count(),
            error: state.last_error().map(ToOwned::to_owned),
        }
    }

    fn into_state(self) -> Result<StoryState, SnapshotError> {
        Ok(StoryState::from_persisted(
            self.current_story,
            self.sentences,
            self.story_status,
            self.error,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use study_core::model::QuestionId;

    fn assessment() -> AssessmentState {
        let mut state = AssessmentState::new();
        state.begin(
            SessionId::from("s1"),
            vec![Question::new(1_u64), Question::new(2_u64)],
        );
        state
            .record_answer(AnswerRecord {
                question_id: QuestionId::from(1_u64),
                answer: "A".into(),
                is_correct: true,
                feedback: Some("ok".into()),
            })
            .unwrap();
        state
    }

    #[test]
    fn assessment_snapshot_uses_web_field_names() {
        let raw = encode::<AssessmentSnapshot>(&assessment()).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            json!({
                "currentSession": "s1",
                "questions": [{"id": 1}, {"id": 2}],
                "currentQuestionIndex": 0,
                "answers": [
                    {"questionId": 1, "answer": "A", "isCorrect": true, "feedback": "ok"}
                ]
            })
        );
    }

    #[test]
    fn assessment_snapshot_restores_same_state() {
        let state = assessment();
        let raw = encode::<AssessmentSnapshot>(&state).unwrap();
        assert_eq!(decode::<AssessmentSnapshot>(&raw).unwrap(), state);
    }

    #[test]
    fn assessment_snapshot_requires_all_fields() {
        let err = decode::<AssessmentSnapshot>(r#"{"questions": []}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }

    #[test]
    fn assessment_snapshot_rejects_bad_index() {
        let raw = r#"{"currentSession":"s1","questions":[{"id":1}],"currentQuestionIndex":4,"answers":[]}"#;
        let err = decode::<AssessmentSnapshot>(raw).unwrap_err();
        assert!(matches!(err, SnapshotError::Assessment(_)));
    }

    #[test]
    fn story_snapshot_merges_onto_defaults() {
        let raw = r#"{"currentStory":{"id":"st1","title":"T","guidance":"g"}}"#;
        let state = decode::<StorySnapshot>(raw).unwrap();
        assert_eq!(state.current_story().map(|s| s.title.as_str()), Some("T"));
        assert_eq!(state.status(), StoryStatus::NotStarted);
        assert_eq!(state.sentence_count(), 0);
    }

    #[test]
    fn story_snapshot_recomputes_sentence_count() {
        let raw = r#"{
            "currentStory": {"id": "st1", "title": "T", "guidance": null},
            "sentences": ["One.", "Two."],
            "storyStatus": "in_progress",
            "currentSentenceCount": 7,
            "error": null
        }"#;
        let state = decode::<StorySnapshot>(raw).unwrap();
        assert_eq!(state.sentence_count(), 2);
        assert_eq!(StorySnapshot::from_state(&state).current_sentence_count, 2);
    }

    #[test]
    fn story_snapshot_rejects_garbage() {
        let err = decode::<StorySnapshot>("not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }
}
