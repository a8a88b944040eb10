//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::model::{AnswerEventError, CategoryError, ExamResultError, IdError, StatisticsError};
use storage::repository::StorageError;

use crate::question_source::QuestionSourceError;

/// Errors emitted by `AnswerRecorder`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecorderError {
    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error(transparent)]
    Id(#[from] IdError),

    #[error("time spent out of range: {0} seconds")]
    TimeSpentOutOfRange(i64),

    #[error(transparent)]
    Event(#[from] AnswerEventError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatisticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatisticsReadError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the exam session and its loop service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("question pool is empty")]
    EmptyPool,

    #[error("exam session has not been started")]
    NotStarted,

    #[error("exam session is already in progress")]
    AlreadyStarted,

    #[error("exam session is already finished")]
    AlreadyFinished,

    #[error("exam session is not finished")]
    NotFinished,

    #[error("position {position} out of range 0..{total}")]
    PositionOutOfRange { position: usize, total: usize },

    #[error("option index {index} out of range")]
    InvalidOption { index: usize },

    #[error(transparent)]
    Result(#[from] ExamResultError),

    #[error(transparent)]
    Tally(#[from] StatisticsError),

    #[error(transparent)]
    Questions(#[from] QuestionSourceError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AdvisorService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdvisorError {
    #[error("advisor is not configured")]
    Disabled,

    #[error("advisor returned an empty response")]
    EmptyResponse,

    #[error("advisor request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `AccountService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
