mod answer;
mod ids;
mod question;
mod result;
mod topic;

pub use ids::{PRACTICE_TEST_COUNT, QuestionId, TestId};

pub use answer::{AnswerError, AnswerRecord, AnswerSheet};
pub use question::{MIN_OPTIONS, Question, QuestionDraft, QuestionError, ValidatedQuestion};
pub use result::{TestHistory, TestResult};
pub use topic::{EXAM_QUESTION_COUNT, EXAM_TOPICS, FIRST_BATCH_TOPICS, TopicConfig, split_batches};
