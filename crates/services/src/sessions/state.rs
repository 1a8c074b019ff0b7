use std::collections::BTreeSet;
use std::fmt;

use exam_core::model::{AnswerSheet, Question, QuestionId, TestId, TestResult};

use crate::timer::CountdownTimer;

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Data-free view of the controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Generating,
    InProgress,
    Reviewing,
}

impl SessionPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::InProgress => "in progress",
            Self::Reviewing => "reviewing",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Controller state. The countdown lives inside `InProgress`, so leaving that
/// state by any path drops (and thereby stops) the timer.
#[derive(Debug)]
pub enum SessionState {
    Idle,
    Generating { test_id: TestId },
    InProgress(ActiveTest),
    Reviewing(ReviewedTest),
}

impl SessionState {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Idle => SessionPhase::Idle,
            Self::Generating { .. } => SessionPhase::Generating,
            Self::InProgress(_) => SessionPhase::InProgress,
            Self::Reviewing(_) => SessionPhase::Reviewing,
        }
    }
}

/// A test being taken.
#[derive(Debug)]
pub struct ActiveTest {
    pub(crate) test_id: TestId,
    pub(crate) questions: Vec<Question>,
    pub(crate) answers: AnswerSheet,
    pub(crate) cursor: usize,
    pub(crate) flagged: BTreeSet<QuestionId>,
    pub(crate) confirming_submit: bool,
    pub(crate) timer: CountdownTimer,
}

impl ActiveTest {
    pub(crate) fn new(test_id: TestId, questions: Vec<Question>, timer: CountdownTimer) -> Self {
        let answers = AnswerSheet::for_questions(&questions);
        Self {
            test_id,
            questions,
            answers,
            cursor: 0,
            flagged: BTreeSet::new(),
            confirming_submit: false,
            timer,
        }
    }

    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    #[must_use]
    pub fn is_flagged(&self, question_id: QuestionId) -> bool {
        self.flagged.contains(&question_id)
    }

    #[must_use]
    pub fn flagged(&self) -> &BTreeSet<QuestionId> {
        &self.flagged
    }

    #[must_use]
    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    #[must_use]
    pub fn progress(&self) -> TestProgress {
        TestProgress::new(self.cursor, self.questions.len(), self.answers.answered_count())
    }
}

/// A submitted test open for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedTest {
    pub(crate) result: TestResult,
    pub(crate) cursor: usize,
    pub(crate) flagged: BTreeSet<QuestionId>,
}

impl ReviewedTest {
    #[must_use]
    pub fn result(&self) -> &TestResult {
        &self.result
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.result.questions().get(self.cursor)
    }

    /// Whether the question was flagged before submission.
    #[must_use]
    pub fn was_flagged(&self, question_id: QuestionId) -> bool {
        self.flagged.contains(&question_id)
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Aggregated view of test progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestProgress {
    /// 1-based position of the cursor.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    /// `position / total` as a rounded percentage.
    pub percent: u32,
}

impl TestProgress {
    #[must_use]
    pub fn new(cursor: usize, total: usize, answered: usize) -> Self {
        let position = if total == 0 { 0 } else { cursor + 1 };
        let percent = exam_core::scoring::percentage(
            u32::try_from(position).unwrap_or(u32::MAX),
            u32::try_from(total).unwrap_or(u32::MAX),
        );
        Self {
            position,
            total,
            answered,
            unanswered: total.saturating_sub(answered),
            percent,
        }
    }
}

/// Clamp a requested position into `[0, len - 1]`.
pub(crate) fn clamp_cursor(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}
