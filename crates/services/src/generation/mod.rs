//! Practice-exam generation through an external question generator.

mod ai_client;

use std::sync::Arc;

use async_trait::async_trait;
use exam_core::model::{
    EXAM_TOPICS, Question, QuestionDraft, QuestionId, TestId, TopicConfig, split_batches,
};
use tracing::{info, warn};

use crate::error::GenerationError;

pub use ai_client::{AiConfig, AiQuestionClient};

/// One topic of a batch and how many questions it should get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRequest {
    pub label: String,
    pub question_count: u32,
}

/// A single request to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub test_id: TestId,
    pub batch: &'static str,
    pub topics: Vec<TopicRequest>,
}

impl BatchRequest {
    #[must_use]
    pub fn new(test_id: TestId, batch: &'static str, topics: &[TopicConfig]) -> Self {
        Self {
            test_id,
            batch,
            topics: topics
                .iter()
                .map(|t| TopicRequest {
                    label: t.name.to_owned(),
                    question_count: t.question_count,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn expected_questions(&self) -> u32 {
        self.topics.iter().map(|t| t.question_count).sum()
    }
}

/// The external collaborator that writes questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Produce questions for every topic in `request`, in topic order.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` if the generator is unreachable or answers with
    /// something that is not a list of questions.
    async fn generate_batch(
        &self,
        request: &BatchRequest,
    ) -> Result<Vec<QuestionDraft>, GenerationError>;
}

/// Builds a full exam from two concurrent generator batches.
#[derive(Clone)]
pub struct ExamGenerator {
    source: Arc<dyn QuestionGenerator>,
    topics: Vec<TopicConfig>,
}

impl ExamGenerator {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            source,
            topics: EXAM_TOPICS.to_vec(),
        }
    }

    #[cfg(test)]
    fn with_topics(mut self, topics: Vec<TopicConfig>) -> Self {
        self.topics = topics;
        self
    }

    /// Generate the questions for `test_id`.
    ///
    /// The topic list is split into two batches that run concurrently; their
    /// results are concatenated in batch order and numbered 1..=N. Either batch
    /// failing fails the whole attempt.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` if a batch fails, a question is invalid, or no
    /// questions come back at all.
    pub async fn generate(&self, test_id: TestId) -> Result<Vec<Question>, GenerationError> {
        let (first, second) = split_batches(&self.topics);
        let first = BatchRequest::new(test_id, "A", first);
        let second = BatchRequest::new(test_id, "B", second);

        info!(test_id = %test_id, "generating practice test");
        let (first_drafts, second_drafts) =
            tokio::try_join!(self.run_batch(&first), self.run_batch(&second))?;

        let questions = first_drafts
            .into_iter()
            .chain(second_drafts)
            .enumerate()
            .map(|(index, draft)| {
                let validated = draft
                    .validate()
                    .map_err(|source| GenerationError::InvalidQuestion { index, source })?;
                let id = u32::try_from(index + 1).unwrap_or(u32::MAX);
                Ok(validated.assign_id(QuestionId::new(id)))
            })
            .collect::<Result<Vec<_>, GenerationError>>()?;

        if questions.is_empty() {
            return Err(GenerationError::NoQuestions);
        }

        info!(test_id = %test_id, count = questions.len(), "practice test generated");
        Ok(questions)
    }

    async fn run_batch(&self, request: &BatchRequest) -> Result<Vec<QuestionDraft>, GenerationError> {
        if request.topics.is_empty() {
            return Ok(Vec::new());
        }

        let drafts = self.source.generate_batch(request).await?;
        let expected = request.expected_questions() as usize;
        if drafts.len() != expected {
            warn!(
                batch = request.batch,
                expected,
                received = drafts.len(),
                "generator returned an unexpected number of questions"
            );
        }
        Ok(drafts)
    }
}
