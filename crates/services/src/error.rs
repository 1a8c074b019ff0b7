//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{AnswerError, QuestionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors from the question-generation collaborator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("question generation is not configured")]
    Disabled,
    #[error("generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("generator returned an empty response")]
    EmptyResponse,
    #[error("generator returned malformed JSON: {0}")]
    MalformedResponse(String),
    #[error("generated question #{index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error("generator returned no questions")]
    NoQuestions,
}

/// Errors from configuration read at startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid EXAM_TOPIC_ROUTING value: {0} (expected `exact` or `containment`)")]
    InvalidRouting(String),
}

/// Errors from the countdown timer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimerError {
    #[error("countdown timer needs a running tokio runtime")]
    NoRuntime,
}

/// Errors emitted by the session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("a test is already being generated")]
    AlreadyGenerating,
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    #[error("submission has not been requested")]
    SubmitNotRequested,
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Timer(#[from] TimerError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
