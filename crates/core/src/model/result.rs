use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::AnswerSheet;
use crate::model::ids::{QuestionId, TestId};
use crate::model::question::Question;
use crate::scoring::{answers_match, percentage};

/// Outcome of one submitted test, with everything needed to review it later.
///
/// Built once by [`crate::scoring::score_test`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    test_id: TestId,
    score: u32,
    total_questions: u32,
    passed: bool,
    date_taken: DateTime<Utc>,
    user_answers: AnswerSheet,
    questions: Vec<Question>,
}

impl TestResult {
    pub(crate) fn new(
        test_id: TestId,
        score: u32,
        total_questions: u32,
        passed: bool,
        date_taken: DateTime<Utc>,
        user_answers: AnswerSheet,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            test_id,
            score,
            total_questions,
            passed,
            date_taken,
            user_answers,
            questions,
        }
    }

    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    /// Number of questions answered with an exactly matching option set.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn date_taken(&self) -> DateTime<Utc> {
        self.date_taken
    }

    /// Completion date in the machine's local time zone.
    #[must_use]
    pub fn local_date(&self) -> NaiveDate {
        self.date_taken.with_timezone(&Local).date_naive()
    }

    #[must_use]
    pub fn user_answers(&self) -> &AnswerSheet {
        &self.user_answers
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Score as a rounded whole percentage; 0 for an empty test.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total_questions)
    }

    /// Whether the given question was answered correctly in this result.
    ///
    /// Unknown question ids read as incorrect.
    #[must_use]
    pub fn is_correct(&self, question_id: QuestionId) -> bool {
        self.questions
            .iter()
            .find(|q| q.id() == question_id)
            .is_some_and(|q| {
                answers_match(q.correct_indices(), &self.user_answers.selection(question_id))
            })
    }
}

/// All submitted results, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestHistory {
    results: Vec<TestResult>,
}

impl TestHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_results(results: Vec<TestResult>) -> Self {
        Self { results }
    }

    /// Prepend a freshly submitted result.
    pub fn record(&mut self, result: TestResult) {
        self.results.insert(0, result);
    }

    #[must_use]
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TestResult> {
        self.results.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestResult> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a TestHistory {
    type Item = &'a TestResult;
    type IntoIter = std::slice::Iter<'a, TestResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionDraft;
    use crate::scoring::score_test;
    use crate::time::fixed_now;

    fn question(id: u32, correct: usize) -> Question {
        QuestionDraft {
            question_text: format!("Q{id}"),
            code_snippet: None,
            options: vec!["a".into(), "b".into()],
            correct_answer_indices: vec![correct],
            explanation: String::new(),
            domain: "topic".into(),
        }
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(id))
    }

    fn result(test_id: u32) -> TestResult {
        let questions = vec![question(1, 0)];
        let sheet = AnswerSheet::for_questions(&questions);
        score_test(TestId::new(test_id), &questions, &sheet, fixed_now())
    }

    #[test]
    fn record_prepends_most_recent_first() {
        let mut history = TestHistory::new();
        history.record(result(1));
        history.record(result(2));
        let ids: Vec<_> = history.iter().map(|r| r.test_id().value()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(history.latest().unwrap().test_id(), TestId::new(2));
    }

    #[test]
    fn history_round_trips_through_json() {
        let mut history = TestHistory::new();
        history.record(result(4));
        let json = serde_json::to_string(&history).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"totalQuestions\":1"));
        let back: TestHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn is_correct_reports_per_question_outcome() {
        let questions = vec![question(1, 0), question(2, 1)];
        let mut sheet = AnswerSheet::for_questions(&questions);
        sheet.toggle(&questions[0], 0).unwrap();
        sheet.toggle(&questions[1], 0).unwrap();
        let result = score_test(TestId::new(1), &questions, &sheet, fixed_now());
        assert!(result.is_correct(QuestionId::new(1)));
        assert!(!result.is_correct(QuestionId::new(2)));
        assert!(!result.is_correct(QuestionId::new(3)));
        assert_eq!(result.percentage(), 50);
    }
}
