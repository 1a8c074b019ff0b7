//! Exact-match scoring of a submitted test.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::model::{AnswerSheet, Question, TestId, TestResult};

/// Minimum score, in percent, to pass an exam.
pub const PASSING_PERCENT: u32 = 70;

/// True iff the selection is exactly the correct set. No partial credit.
#[must_use]
pub fn answers_match(correct: &BTreeSet<usize>, selected: &BTreeSet<usize>) -> bool {
    correct == selected
}

/// Whether `score` out of `total` reaches [`PASSING_PERCENT`].
///
/// Compared with integers so 40/57 (70.2 %) passes and 39/57 (68.4 %) does not,
/// without floating-point edge cases. An empty test never passes.
#[must_use]
pub fn is_passing(score: u32, total: u32) -> bool {
    if total == 0 {
        return false;
    }
    u64::from(score) * 100 >= u64::from(total) * u64::from(PASSING_PERCENT)
}

/// `part / whole` as a whole percentage rounded half-up; 0 when `whole` is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(whole) * 100.0).round() as u32
}

/// Score `answers` against `questions` and freeze both into a [`TestResult`].
///
/// A question without an answer record counts as an empty selection.
#[must_use]
pub fn score_test(
    test_id: TestId,
    questions: &[Question],
    answers: &AnswerSheet,
    taken_at: DateTime<Utc>,
) -> TestResult {
    let score = questions
        .iter()
        .filter(|q| answers_match(q.correct_indices(), &answers.selection(q.id())))
        .count();

    let score = u32::try_from(score).unwrap_or(u32::MAX);
    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);

    TestResult::new(
        test_id,
        score,
        total,
        is_passing(score, total),
        taken_at,
        answers.clone(),
        questions.to_vec(),
    )
}
