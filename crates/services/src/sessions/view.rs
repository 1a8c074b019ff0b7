use std::collections::BTreeSet;

use chrono::NaiveDate;
use exam_core::countdown::format_clock;
use exam_core::model::{Question, TestHistory, TestId};
use exam_core::stats::{PerformanceReport, PerformanceSummary, TopicStats};

use super::state::{ActiveTest, ReviewedTest, TestProgress};
use crate::timer::TimerSnapshot;

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

/// One numbered practice test on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeTestItem {
    pub test_id: TestId,
    pub attempts: usize,
    /// Percentage of the most recent attempt.
    pub latest_percent: Option<u32>,
}

/// Everything the dashboard screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub summary: PerformanceSummary,
    /// Topic buckets with at least one question, in breakdown order.
    pub topics: Vec<TopicStats>,
    pub practice_tests: Vec<PracticeTestItem>,
    pub generating: Option<TestId>,
    pub error: Option<String>,
}

impl DashboardView {
    pub(crate) fn build(
        report: &PerformanceReport,
        history: &TestHistory,
        generating: Option<TestId>,
        error: Option<String>,
    ) -> Self {
        let practice_tests = TestId::practice_tests()
            .map(|test_id| {
                let mut attempts = history.iter().filter(|r| r.test_id() == test_id);
                let latest_percent = attempts.next().map(|r| r.percentage());
                PracticeTestItem {
                    test_id,
                    attempts: usize::from(latest_percent.is_some()) + attempts.count(),
                    latest_percent,
                }
            })
            .collect();

        Self {
            summary: report.summary,
            topics: report.topics.visible().cloned().collect(),
            practice_tests,
            generating,
            error,
        }
    }
}

//
// ─── TEST ──────────────────────────────────────────────────────────────────────
//

/// Countdown as shown in the test header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockView {
    pub remaining_secs: u32,
    pub urgent: bool,
}

impl ClockView {
    /// `MM:SS`.
    #[must_use]
    pub fn label(&self) -> String {
        format_clock(self.remaining_secs)
    }
}

impl From<TimerSnapshot> for ClockView {
    fn from(snapshot: TimerSnapshot) -> Self {
        Self {
            remaining_secs: snapshot.remaining_secs,
            urgent: snapshot.is_urgent(),
        }
    }
}

/// One cell of the question grid used to jump around the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    /// 1-based question number.
    pub number: usize,
    pub answered: bool,
    pub flagged: bool,
    pub current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitConfirmation {
    pub unanswered: usize,
}

/// The test screen for the question under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct TestView<'a> {
    pub test_id: TestId,
    pub question: &'a Question,
    pub selected: BTreeSet<usize>,
    pub flagged: bool,
    pub progress: TestProgress,
    pub clock: ClockView,
    pub grid: Vec<GridCell>,
    pub confirmation: Option<SubmitConfirmation>,
}

impl<'a> TestView<'a> {
    pub(crate) fn build(active: &'a ActiveTest) -> Option<Self> {
        let question = active.current_question()?;
        let progress = active.progress();
        let grid = active
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| GridCell {
                number: index + 1,
                answered: active.answers.get(q.id()).is_some_and(|r| r.is_answered()),
                flagged: active.flagged.contains(&q.id()),
                current: index == active.cursor,
            })
            .collect();

        Some(Self {
            test_id: active.test_id,
            question,
            selected: active.answers.selection(question.id()),
            flagged: active.flagged.contains(&question.id()),
            progress,
            clock: active.timer.snapshot().into(),
            grid,
            confirmation: active.confirming_submit.then_some(SubmitConfirmation {
                unanswered: progress.unanswered,
            }),
        })
    }
}

//
// ─── REVIEW ────────────────────────────────────────────────────────────────────
//

/// How one option looks in review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionReview<'a> {
    pub index: usize,
    pub text: &'a str,
    pub correct: bool,
    pub selected: bool,
}

impl OptionReview<'_> {
    /// Selected but not part of the correct set.
    #[must_use]
    pub fn is_wrong_selection(&self) -> bool {
        self.selected && !self.correct
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewCell {
    pub number: usize,
    pub correct: bool,
    pub current: bool,
}

/// The review screen for the question under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewView<'a> {
    pub test_id: TestId,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub passed: bool,
    pub taken_on: NaiveDate,
    /// 1-based position of the cursor.
    pub position: usize,
    pub question: &'a Question,
    pub correct: bool,
    pub flagged_during_test: bool,
    pub options: Vec<OptionReview<'a>>,
    pub grid: Vec<ReviewCell>,
}

impl<'a> ReviewView<'a> {
    pub(crate) fn build(review: &'a ReviewedTest) -> Option<Self> {
        let result = &review.result;
        let question = review.current_question()?;
        let selected = result.user_answers().selection(question.id());
        let options = question
            .options()
            .iter()
            .enumerate()
            .map(|(index, text)| OptionReview {
                index,
                text,
                correct: question.is_correct_option(index),
                selected: selected.contains(&index),
            })
            .collect();
        let grid = result
            .questions()
            .iter()
            .enumerate()
            .map(|(index, q)| ReviewCell {
                number: index + 1,
                correct: result.is_correct(q.id()),
                current: index == review.cursor,
            })
            .collect();

        Some(Self {
            test_id: result.test_id(),
            score: result.score(),
            total_questions: result.total_questions(),
            percentage: result.percentage(),
            passed: result.passed(),
            taken_on: result.local_date(),
            position: review.cursor + 1,
            question,
            correct: result.is_correct(question.id()),
            flagged_during_test: review.was_flagged(question.id()),
            options,
            grid,
        })
    }
}
