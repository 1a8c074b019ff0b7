use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Fewest options a question may offer (true/false).
pub const MIN_OPTIONS: usize = 2;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question as produced by the generation collaborator.
///
/// Field names match the wire format (`questionText`, `correctAnswerIndices`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    pub options: Vec<String>,
    pub correct_answer_indices: Vec<usize>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub domain: String,
}

impl QuestionDraft {
    /// Check the question invariants and normalize the draft.
    ///
    /// Duplicate correct indices collapse into one; a blank code snippet becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are fewer than
    /// [`MIN_OPTIONS`] options, no correct answer is given, or a correct index
    /// does not point at an option.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        if self.question_text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                count: self.options.len(),
            });
        }

        let correct: BTreeSet<usize> = self.correct_answer_indices.into_iter().collect();
        if correct.is_empty() {
            return Err(QuestionError::NoCorrectAnswer);
        }
        if let Some(&index) = correct.iter().find(|&&i| i >= self.options.len()) {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index,
                options: self.options.len(),
            });
        }

        let code_snippet = self
            .code_snippet
            .filter(|snippet| !snippet.trim().is_empty());

        Ok(ValidatedQuestion {
            text: self.question_text,
            code_snippet,
            options: self.options,
            correct,
            explanation: self.explanation,
            domain: self.domain.trim().to_owned(),
        })
    }
}

/// A question that satisfies every invariant but has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    text: String,
    code_snippet: Option<String>,
    options: Vec<String>,
    correct: BTreeSet<usize>,
    explanation: String,
    domain: String,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            text: self.text,
            code_snippet: self.code_snippet,
            options: self.options,
            correct: self.correct,
            explanation: self.explanation,
            domain: self.domain,
        }
    }
}

/// A multiple-choice exam question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    text: String,
    code_snippet: Option<String>,
    options: Vec<String>,
    correct: BTreeSet<usize>,
    explanation: String,
    domain: String,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn code_snippet(&self) -> Option<&str> {
        self.code_snippet.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Positions of the correct options.
    #[must_use]
    pub fn correct_indices(&self) -> &BTreeSet<usize> {
        &self.correct
    }

    #[must_use]
    pub fn is_correct_option(&self, index: usize) -> bool {
        self.correct.contains(&index)
    }

    /// True when more than one option is correct; selections then accumulate
    /// instead of replacing each other.
    #[must_use]
    pub fn is_multi_select(&self) -> bool {
        self.correct.len() > 1
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Topic label as reported by the generator. May drift from the configured labels.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    id: QuestionId,
    #[serde(flatten)]
    draft: QuestionDraft,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Ok(record.draft.validate()?.assign_id(record.id))
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            draft: QuestionDraft {
                question_text: question.text,
                code_snippet: question.code_snippet,
                options: question.options,
                correct_answer_indices: question.correct.into_iter().collect(),
                explanation: question.explanation,
                domain: question.domain,
            },
        }
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("a question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("question has no correct answer")]
    NoCorrectAnswer,

    #[error("correct answer index {index} is out of range for {options} options")]
    CorrectIndexOutOfRange { index: usize, options: usize },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
