use async_trait::async_trait;
use exam_core::model::TestHistory;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key under which the whole history snapshot is stored.
pub const HISTORY_KEY: &str = "exam_prep_history";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Encode the history as the JSON array that gets persisted.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_history(history: &TestHistory) -> Result<String, StorageError> {
    serde_json::to_string(history).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Decode a persisted snapshot.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the value is not a valid history,
/// including histories whose questions break the question invariants.
pub fn decode_history(raw: &str) -> Result<TestHistory, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Persistence port for the test history.
///
/// The history is read and written as one snapshot; there is no per-result access.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Load the stored history. A store with nothing in it yields an empty history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored value is malformed, or
    /// `StorageError::Connection` if the backend cannot be reached.
    async fn load_history(&self) -> Result<TestHistory, StorageError>;

    /// Replace the stored history with `history`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be encoded or written.
    async fn save_history(&self, history: &TestHistory) -> Result<(), StorageError>;
}

/// Simple in-memory repository for testing and prototyping.
///
/// Holds the encoded snapshot, so it fails on malformed data the same way a
/// real backend does.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshot: Arc<Mutex<Option<String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already stored raw value.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// The raw stored value, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn load_history(&self) -> Result<TestHistory, StorageError> {
        match self.raw()? {
            Some(raw) => decode_history(&raw),
            None => Ok(TestHistory::new()),
        }
    }

    async fn save_history(&self, history: &TestHistory) -> Result<(), StorageError> {
        let encoded = encode_history(history)?;
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(encoded);
        Ok(())
    }
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub history: Arc<dyn HistoryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let history: Arc<dyn HistoryRepository> = Arc::new(InMemoryRepository::new());
        Self { history }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{AnswerSheet, QuestionDraft, QuestionId, TestId};
    use exam_core::scoring::score_test;
    use exam_core::time::fixed_now;

    fn history_with_one_result() -> TestHistory {
        let question = QuestionDraft {
            question_text: "Is state stored remotely with a backend?".into(),
            code_snippet: Some("terraform {\n  backend \"s3\" {}\n}".into()),
            options: vec!["True".into(), "False".into()],
            correct_answer_indices: vec![0],
            explanation: "Backends store state.".into(),
            domain: "7. Implement and maintain state (backend, locking, remote)".into(),
        }
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(1));
        let questions = vec![question];
        let mut answers = AnswerSheet::for_questions(&questions);
        answers.toggle(&questions[0], 0).unwrap();

        let mut history = TestHistory::new();
        history.record(score_test(TestId::new(1), &questions, &answers, fixed_now()));
        history
    }

    #[tokio::test]
    async fn empty_store_loads_empty_history() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let repo = InMemoryRepository::new();
        let history = history_with_one_result();
        repo.save_history(&history).await.unwrap();

        assert!(repo.raw().unwrap().unwrap().contains("\"testId\":1"));
        assert_eq!(repo.load_history().await.unwrap(), history);
    }

    #[tokio::test]
    async fn malformed_snapshot_is_a_serialization_error() {
        let repo = InMemoryRepository::with_raw("{not json");
        let err = repo.load_history().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
