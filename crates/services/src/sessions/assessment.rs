use std::sync::Arc;

use storage::repository::{SnapshotStore, StorageError};
use storage::snapshot::AssessmentSnapshot;
use study_core::model::{
    AnswerRecord, AssessmentState, AssessmentStateError, Progress, Question, SessionId,
};
use tracing::{info, warn};

use super::slot::{HydrateOutcome, Loaded, SnapshotSlot};
use crate::api::{StartAssessmentResponse, StudyApi, SubmitAnswerRequest, SubmitAnswerResponse};
use crate::error::AssessmentError;
use crate::notify::Notifier;

/// Owns the assessment state and keeps it in sync with the backend and
/// durable storage.
///
/// Every successful mutation is followed by a full snapshot write. Remote
/// failures leave the state untouched.
pub struct AssessmentSession {
    api: Arc<dyn StudyApi>,
    notifier: Arc<dyn Notifier>,
    snapshots: SnapshotSlot<AssessmentSnapshot>,
    state: AssessmentState,
}

impl AssessmentSession {
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
            state: AssessmentState::new(),
        }
    }

    /// Restore state from the stored snapshot.
    ///
    /// An unreadable snapshot is discarded and the session starts empty.
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
                warn!(error = %err, "discarding unreadable assessment snapshot");
                self.notifier
                    .notify_error(&format!("Could not restore your assessment: {err}"));
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
    pub fn state(&self) -> &AssessmentState {
        &self.state
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.state.session_id()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.state.questions()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.state.current_index()
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        self.state.answers()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.state.current_question()
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.state.progress()
    }

    /// Start a new assessment, replacing whatever was in progress.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Api` if the backend call fails (state is
    /// unchanged) or `AssessmentError::Storage` if persisting fails.
    pub async fn start(&mut self) -> Result<StartAssessmentResponse, AssessmentError> {
        let response = self.api.start_assessment().await.inspect_err(|err| {
            warn!(error = %err, "start assessment failed");
        })?;

        self.state
            .begin(response.session_id.clone(), response.questions.clone());
        info!(
            session_id = %response.session_id,
            questions = response.questions.len(),
            "assessment started"
        );

        self.persist().await?;
        Ok(response)
    }

    /// Submit an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::State` when there is no current question or
    /// it was already answered, `AssessmentError::Api` if the backend call
    /// fails, or `AssessmentError::Storage` if persisting fails.
    pub async fn submit_answer(
        &mut self,
        answer: impl Into<String>,
    ) -> Result<SubmitAnswerResponse, AssessmentError> {
        let answer = answer.into();
        let question_id = self.state.answerable_question()?.id.clone();
        let session_id = self
            .state
            .session_id()
            .cloned()
            .ok_or(AssessmentStateError::MissingSession)?;

        let request = SubmitAnswerRequest {
            session_id,
            question_id: question_id.clone(),
            answer: answer.clone(),
        };
        let response = self.api.submit_answer(&request).await.inspect_err(|err| {
            warn!(error = %err, question_id = %question_id, "submit answer failed");
        })?;

        self.state.record_answer(AnswerRecord {
            question_id,
            answer,
            is_correct: response.is_correct,
            feedback: response.feedback.clone(),
        })?;

        self.persist().await?;
        Ok(response)
    }

    /// Move to the next question.
    ///
    /// Returns `false` without touching state when already at the last
    /// question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if persisting the new position fails.
    pub async fn advance(&mut self) -> Result<bool, StorageError> {
        if !self.state.advance() {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Drop all state and the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be removed.
    pub async fn reset(&mut self) -> Result<(), StorageError> {
        self.state.reset();
        self.snapshots.clear().await
    }
}
