use thiserror::Error;

use crate::model::AssessmentStateError;
use crate::model::StoryStateError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Assessment(#[from] AssessmentStateError),
    #[error(transparent)]
    Story(#[from] StoryStateError),
}
