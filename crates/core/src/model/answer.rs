use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("no answer record for question {0}")]
    UnknownQuestion(QuestionId),

    #[error("option {option} does not exist on question {question_id} ({options} options)")]
    OptionOutOfRange {
        question_id: QuestionId,
        option: usize,
        options: usize,
    },
}

/// The options a user currently has selected for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub selected_indices: BTreeSet<usize>,
}

impl AnswerRecord {
    #[must_use]
    pub fn empty(question_id: QuestionId) -> Self {
        Self {
            question_id,
            selected_indices: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.selected_indices.is_empty()
    }

    #[must_use]
    pub fn is_selected(&self, option: usize) -> bool {
        self.selected_indices.contains(&option)
    }

    /// Apply a click on `option`.
    ///
    /// Multi-select questions flip membership; single-select questions replace
    /// the selection, so it never holds more than one position.
    pub fn toggle(&mut self, option: usize, multi_select: bool) {
        if multi_select {
            if !self.selected_indices.remove(&option) {
                self.selected_indices.insert(option);
            }
        } else {
            self.selected_indices.clear();
            self.selected_indices.insert(option);
        }
    }
}

/// One answer record per question, in question order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSheet {
    records: Vec<AnswerRecord>,
}

impl AnswerSheet {
    /// Build an empty record for every question, preserving order.
    #[must_use]
    pub fn for_questions(questions: &[Question]) -> Self {
        Self {
            records: questions
                .iter()
                .map(|q| AnswerRecord::empty(q.id()))
                .collect(),
        }
    }

    #[must_use]
    pub fn from_records(records: Vec<AnswerRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&AnswerRecord> {
        self.records.iter().find(|r| r.question_id == question_id)
    }

    /// Selected positions for a question; a missing record reads as an empty selection.
    #[must_use]
    pub fn selection(&self, question_id: QuestionId) -> BTreeSet<usize> {
        self.get(question_id)
            .map(|r| r.selected_indices.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_answered()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Toggle `option` on the record belonging to `question`.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::OptionOutOfRange` if the question has no such option,
    /// or `AnswerError::UnknownQuestion` if the sheet has no record for it.
    pub fn toggle(&mut self, question: &Question, option: usize) -> Result<(), AnswerError> {
        if option >= question.option_count() {
            return Err(AnswerError::OptionOutOfRange {
                question_id: question.id(),
                option,
                options: question.option_count(),
            });
        }
        let record = self
            .records
            .iter_mut()
            .find(|r| r.question_id == question.id())
            .ok_or(AnswerError::UnknownQuestion(question.id()))?;
        record.toggle(option, question.is_multi_select());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionDraft;

    fn question(id: u32, correct: Vec<usize>) -> Question {
        QuestionDraft {
            question_text: format!("Q{id}"),
            code_snippet: None,
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer_indices: correct,
            explanation: String::new(),
            domain: "topic".into(),
        }
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(id))
    }

    #[test]
    fn single_select_replaces_selection() {
        let q = question(1, vec![1]);
        let mut sheet = AnswerSheet::for_questions(std::slice::from_ref(&q));
        sheet.toggle(&q, 0).unwrap();
        sheet.toggle(&q, 2).unwrap();
        sheet.toggle(&q, 2).unwrap();
        assert_eq!(sheet.selection(q.id()), BTreeSet::from([2]));
    }

    #[test]
    fn multi_select_flips_membership() {
        let q = question(1, vec![0, 2]);
        let mut sheet = AnswerSheet::for_questions(std::slice::from_ref(&q));
        sheet.toggle(&q, 0).unwrap();
        sheet.toggle(&q, 2).unwrap();
        sheet.toggle(&q, 3).unwrap();
        sheet.toggle(&q, 3).unwrap();
        assert_eq!(sheet.selection(q.id()), BTreeSet::from([0, 2]));
    }

    #[test]
    fn sheet_tracks_order_and_answered_count() {
        let questions = vec![question(1, vec![0]), question(2, vec![1]), question(3, vec![2])];
        let mut sheet = AnswerSheet::for_questions(&questions);
        let order: Vec<_> = sheet.records().iter().map(|r| r.question_id.value()).collect();
        assert_eq!(order, vec![1, 2, 3]);

        sheet.toggle(&questions[1], 1).unwrap();
        assert_eq!(sheet.answered_count(), 1);
        assert!(sheet.selection(QuestionId::new(99)).is_empty());
    }

    #[test]
    fn toggle_rejects_bad_option_and_unknown_question() {
        let q = question(1, vec![0]);
        let other = question(2, vec![0]);
        let mut sheet = AnswerSheet::for_questions(std::slice::from_ref(&q));

        let err = sheet.toggle(&q, 4).unwrap_err();
        assert!(matches!(err, AnswerError::OptionOutOfRange { option: 4, .. }));

        let err = sheet.toggle(&other, 0).unwrap_err();
        assert_eq!(err, AnswerError::UnknownQuestion(QuestionId::new(2)));
    }
}
