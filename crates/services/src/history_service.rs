use std::sync::Arc;

use exam_core::model::{EXAM_TOPICS, TestHistory, TestResult};
use exam_core::stats::{PerformanceReport, TopicRouting, analyze};
use storage::repository::{HistoryRepository, StorageError};
use tracing::{debug, warn};

/// In-memory copy of the test history, written through to a repository.
#[derive(Clone)]
pub struct HistoryService {
    repo: Arc<dyn HistoryRepository>,
    history: TestHistory,
    routing: TopicRouting,
}

impl HistoryService {
    /// Load the stored history once.
    ///
    /// A malformed snapshot is logged and replaced by an empty history.
    ///
    /// # Errors
    ///
    /// Returns any non-serialization `StorageError`, such as
    /// `StorageError::Connection` when the store cannot be read at all.
    pub async fn load(repo: Arc<dyn HistoryRepository>) -> Result<Self, StorageError> {
        let history = match repo.load_history().await {
            Ok(history) => {
                debug!(results = history.len(), "loaded test history");
                history
            }
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "discarding malformed test history");
                TestHistory::new()
            }
            Err(err) => return Err(err),
        };

        Ok(Self {
            repo,
            history,
            routing: TopicRouting::default(),
        })
    }

    #[must_use]
    pub fn with_routing(mut self, routing: TopicRouting) -> Self {
        self.routing = routing;
        self
    }

    #[must_use]
    pub fn history(&self) -> &TestHistory {
        &self.history
    }

    /// Prepend `result` and persist the whole history.
    ///
    /// The in-memory history keeps the result even when persisting fails.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot could not be written.
    pub async fn record(&mut self, result: TestResult) -> Result<(), StorageError> {
        self.history.record(result);
        self.repo.save_history(&self.history).await
    }

    /// Summary metrics and topic breakdown over the current history.
    #[must_use]
    pub fn report(&self) -> PerformanceReport {
        analyze(&self.history, &EXAM_TOPICS, self.routing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use exam_core::model::{AnswerSheet, QuestionDraft, QuestionId, TestId};
    use exam_core::scoring::score_test;
    use exam_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, encode_history};

    fn result_in(test_id: u32, domain: &str) -> TestResult {
        let questions = vec![
            QuestionDraft {
                question_text: "terraform fmt rewrites files to canonical style".into(),
                code_snippet: None,
                options: vec!["True".into(), "False".into()],
                correct_answer_indices: vec![0],
                explanation: String::new(),
                domain: domain.into(),
            }
            .validate()
            .unwrap()
            .assign_id(QuestionId::new(1)),
        ];
        let mut answers = AnswerSheet::for_questions(&questions);
        answers.toggle(&questions[0], 0).unwrap();
        score_test(TestId::new(test_id), &questions, &answers, fixed_now())
    }

    fn result(test_id: u32) -> TestResult {
        result_in(test_id, EXAM_TOPICS[3].name)
    }

    /// Holds a real snapshot but refuses to be read.
    struct LockedRepository {
        inner: InMemoryRepository,
    }

    #[async_trait]
    impl HistoryRepository for LockedRepository {
        async fn load_history(&self) -> Result<TestHistory, StorageError> {
            Err(StorageError::Connection("database is locked".into()))
        }

        async fn save_history(&self, history: &TestHistory) -> Result<(), StorageError> {
            self.inner.save_history(history).await
        }
    }

    #[tokio::test]
    async fn corrupt_history_loads_as_empty() {
        let repo = Arc::new(InMemoryRepository::with_raw("not json at all"));
        let service = HistoryService::load(repo).await.unwrap();
        assert!(service.history().is_empty());
        assert_eq!(service.report().summary.tests_taken, 0);
    }

    #[tokio::test]
    async fn unreadable_store_fails_load_and_keeps_stored_history() {
        let stored = TestHistory::from_results((1..=5).map(result).collect());
        let inner = InMemoryRepository::with_raw(encode_history(&stored).unwrap());
        let repo = Arc::new(LockedRepository {
            inner: inner.clone(),
        });

        let err = HistoryService::load(repo).await.err().unwrap();
        assert!(matches!(err, StorageError::Connection(_)));
        assert_eq!(inner.load_history().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn record_prepends_and_persists() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut service = HistoryService::load(repo.clone()).await.unwrap();
        service.record(result(1)).await.unwrap();
        service.record(result(2)).await.unwrap();

        let reloaded = HistoryService::load(repo).await.unwrap();
        let ids: Vec<_> = reloaded.history().iter().map(|r| r.test_id().value()).collect();
        assert_eq!(ids, vec![2, 1]);

        let report = reloaded.report();
        assert_eq!(report.summary.pass_rate_percent, 100);
        let cli = report.topics.get(EXAM_TOPICS[3].name).unwrap();
        assert_eq!((cli.correct, cli.total), (2, 2));
    }

    #[tokio::test]
    async fn exact_routing_keeps_drifted_labels_apart() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut service = HistoryService::load(repo).await.unwrap();
        service.record(result_in(1, "Terraform Cloud")).await.unwrap();

        let cloud = EXAM_TOPICS[8].name;
        let tolerant = service.report();
        assert_eq!(tolerant.topics.get(cloud).unwrap().total, 1);
        assert!(tolerant.topics.get("Terraform Cloud").is_none());

        let strict = service.with_routing(TopicRouting::Exact).report();
        assert_eq!(strict.topics.get(cloud).unwrap().total, 0);
        let drifted = strict.topics.get("Terraform Cloud").unwrap();
        assert!(!drifted.is_configured());
        assert_eq!(drifted.total, 1);
    }
}
