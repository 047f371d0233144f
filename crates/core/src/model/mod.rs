mod assessment;
mod ids;
mod story;

pub use ids::{QuestionId, RemoteId, SessionId, StoryId};

pub use assessment::{AnswerRecord, AssessmentState, AssessmentStateError, Progress, Question};
pub use story::{Sentence, Story, StoryState, StoryStateError, StoryStatus};
