use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{QuestionId, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssessmentStateError {
    #[error("invalid state: no current question")]
    NoCurrentQuestion,

    #[error("invalid state: question {question_id} already answered")]
    AlreadyAnswered { question_id: QuestionId },

    #[error("answer is for question {got}, current question is {expected}")]
    QuestionMismatch {
        expected: QuestionId,
        got: QuestionId,
    },

    #[error("current index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{answers} answers recorded but only {reachable} questions reached")]
    TooManyAnswers { answers: usize, reachable: usize },

    #[error("answer references question {question_id} which was never reached")]
    UnknownQuestion { question_id: QuestionId },

    #[error("questions present without a session id")]
    MissingSession,
}

/// A question as served by the assessment backend.
///
/// Only `id` is interpreted; every other field the server sends (prompt,
/// options, ...) is carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Question {
    #[must_use]
    pub fn new(id: impl Into<QuestionId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// One submitted answer together with the server's verdict.
///
/// `feedback` is kept as whatever JSON the server sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub answer: String,
    pub is_correct: bool,
    #[serde(default)]
    pub feedback: Option<Value>,
}

/// 1-based display position within the question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// In-memory state of one assessment attempt.
///
/// Invariant: `answers.len() <= current_index + 1 <= questions.len()` whenever
/// questions are present, and each question is answered at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssessmentState {
    session_id: Option<SessionId>,
    questions: Vec<Question>,
    current_index: usize,
    answers: Vec<AnswerRecord>,
}

impl AssessmentState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate state from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentStateError` if the snapshot breaks any of the
    /// position or answer invariants.
    pub fn from_persisted(
        session_id: Option<SessionId>,
        questions: Vec<Question>,
        current_index: usize,
        answers: Vec<AnswerRecord>,
    ) -> Result<Self, AssessmentStateError> {
        if !questions.is_empty() && session_id.is_none() {
            return Err(AssessmentStateError::MissingSession);
        }
        let in_range = if questions.is_empty() {
            current_index == 0
        } else {
            current_index < questions.len()
        };
        if !in_range {
            return Err(AssessmentStateError::IndexOutOfRange {
                index: current_index,
                len: questions.len(),
            });
        }

        let reachable = questions.len().min(current_index + 1);
        if answers.len() > reachable {
            return Err(AssessmentStateError::TooManyAnswers {
                answers: answers.len(),
                reachable,
            });
        }

        let reached = &questions[..reachable];
        for (pos, record) in answers.iter().enumerate() {
            if !reached.iter().any(|q| q.id == record.question_id) {
                return Err(AssessmentStateError::UnknownQuestion {
                    question_id: record.question_id.clone(),
                });
            }
            if answers[..pos]
                .iter()
                .any(|earlier| earlier.question_id == record.question_id)
            {
                return Err(AssessmentStateError::AlreadyAnswered {
                    question_id: record.question_id.clone(),
                });
            }
        }

        Ok(Self {
            session_id,
            questions,
            current_index,
            answers,
        })
    }

    /// Replace everything with a freshly started session.
    pub fn begin(&mut self, session_id: SessionId, questions: Vec<Question>) {
        self.session_id = Some(session_id);
        self.questions = questions;
        self.current_index = 0;
        self.answers.clear();
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.session_id.is_some()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            current: self.current_index + 1,
            total: self.questions.len(),
        }
    }

    #[must_use]
    pub fn is_answered(&self, question_id: &QuestionId) -> bool {
        self.answers.iter().any(|a| &a.question_id == question_id)
    }

    /// The current question, provided it can still take an answer.
    ///
    /// # Errors
    ///
    /// Returns `NoCurrentQuestion` when nothing is loaded and
    /// `AlreadyAnswered` when the current question has a recorded answer.
    pub fn answerable_question(&self) -> Result<&Question, AssessmentStateError> {
        let question = self
            .current_question()
            .ok_or(AssessmentStateError::NoCurrentQuestion)?;
        if self.is_answered(&question.id) {
            return Err(AssessmentStateError::AlreadyAnswered {
                question_id: question.id.clone(),
            });
        }
        Ok(question)
    }

    /// Append an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentStateError` if there is no answerable current
    /// question or the record targets a different question.
    pub fn record_answer(&mut self, record: AnswerRecord) -> Result<(), AssessmentStateError> {
        let current = self.answerable_question()?;
        if current.id != record.question_id {
            return Err(AssessmentStateError::QuestionMismatch {
                expected: current.id.clone(),
                got: record.question_id,
            });
        }
        self.answers.push(record);
        Ok(())
    }

    /// Move to the next question. Returns `false` at the last question.
    pub fn advance(&mut self) -> bool {
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(n: u64) -> AssessmentState {
        let mut state = AssessmentState::new();
        state.begin(
            SessionId::from("s1"),
            (1..=n).map(Question::new).collect(),
        );
        state
    }

    fn answer(id: u64) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId::from(id),
            answer: "A".into(),
            is_correct: true,
            feedback: None,
        }
    }

    #[test]
    fn begin_points_at_first_question() {
        let state = started(2);
        assert_eq!(state.current_question(), Some(&Question::new(1_u64)));
        assert_eq!(state.progress(), Progress { current: 1, total: 2 });
    }

    #[test]
    fn empty_state_has_no_question() {
        let state = AssessmentState::new();
        assert!(state.current_question().is_none());
        assert_eq!(state.progress(), Progress { current: 1, total: 0 });
        assert_eq!(
            state.answerable_question(),
            Err(AssessmentStateError::NoCurrentQuestion)
        );
    }

    #[test]
    fn advance_stops_at_last_question() {
        let mut state = started(2);
        assert!(state.advance());
        assert_eq!(state.current_index(), 1);
        assert!(!state.advance());
        assert_eq!(state.current_index(), 1);
    }

    #[test]
    fn advance_on_empty_is_noop() {
        let mut state = AssessmentState::new();
        assert!(!state.advance());
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn question_cannot_be_answered_twice() {
        let mut state = started(2);
        state.record_answer(answer(1)).unwrap();
        let err = state.record_answer(answer(1)).unwrap_err();
        assert_eq!(
            err,
            AssessmentStateError::AlreadyAnswered {
                question_id: QuestionId::from(1_u64)
            }
        );
        assert_eq!(state.answers().len(), 1);
    }

    #[test]
    fn answer_for_other_question_is_rejected() {
        let mut state = started(2);
        let err = state.record_answer(answer(2)).unwrap_err();
        assert!(matches!(err, AssessmentStateError::QuestionMismatch { .. }));
        assert!(state.answers().is_empty());
    }

    #[test]
    fn from_persisted_accepts_consistent_state() {
        let questions = vec![Question::new(1_u64), Question::new(2_u64)];
        let state = AssessmentState::from_persisted(
            Some(SessionId::from("s1")),
            questions,
            1,
            vec![answer(1), answer(2)],
        )
        .unwrap();
        assert_eq!(state.answers().len(), 2);
    }

    #[test]
    fn from_persisted_rejects_index_past_end() {
        let err = AssessmentState::from_persisted(
            Some(SessionId::from("s1")),
            vec![Question::new(1_u64)],
            1,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, AssessmentStateError::IndexOutOfRange { index: 1, len: 1 });
    }

    #[test]
    fn from_persisted_rejects_answers_ahead_of_position() {
        let err = AssessmentState::from_persisted(
            Some(SessionId::from("s1")),
            vec![Question::new(1_u64), Question::new(2_u64)],
            0,
            vec![answer(1), answer(2)],
        )
        .unwrap_err();
        assert!(matches!(err, AssessmentStateError::TooManyAnswers { .. }));
    }

    #[test]
    fn from_persisted_rejects_unreached_answer() {
        let err = AssessmentState::from_persisted(
            Some(SessionId::from("s1")),
            vec![Question::new(1_u64), Question::new(2_u64)],
            0,
            vec![answer(2)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AssessmentStateError::UnknownQuestion {
                question_id: QuestionId::from(2_u64)
            }
        );
    }

    #[test]
    fn question_keeps_unknown_fields() {
        let raw = r#"{"id":3,"prompt":"2+2?","options":["3","4"]}"#;
        let question: Question = serde_json::from_str(raw).unwrap();
        assert_eq!(question.id, QuestionId::from(3_u64));
        assert_eq!(question.fields["prompt"], "2+2?");
        let back: Value = serde_json::to_value(&question).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(raw).unwrap());
    }
}
