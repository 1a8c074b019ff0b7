use exam_core::Clock;
use exam_core::countdown::EXAM_DURATION_SECS;
use exam_core::model::{AnswerError, Question, QuestionId, TestHistory, TestId, TestResult};
use exam_core::scoring::score_test;
use exam_core::stats::PerformanceReport;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::state::{ActiveTest, ReviewedTest, SessionPhase, SessionState, clamp_cursor};
use super::view::{DashboardView, ReviewView, TestView};
use crate::error::{GenerationError, SessionError};
use crate::generation::ExamGenerator;
use crate::history_service::HistoryService;
use crate::timer::{CountdownTimer, TimerSnapshot};

/// Message shown on the dashboard after a failed generation attempt.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate test. Please check your API key configuration or try again.";

/// Message shown on the dashboard when the exam countdown cannot start.
pub const TIMER_FAILED_MESSAGE: &str = "Could not start the exam timer. Please try again.";

//
// ─── TICKETS & OUTCOMES ────────────────────────────────────────────────────────
//

/// Proof that a start request entered `Generating`.
///
/// Only the ticket of the most recent start can complete it; responses for an
/// abandoned or superseded start are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    test_id: TestId,
    epoch: u64,
}

impl GenerationTicket {
    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Started { question_count: usize },
    Failed,
    /// The ticket no longer matches the controller state.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitReason {
    Confirmed,
    TimeExpired,
}

impl SubmitReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::TimeExpired => "time expired",
        }
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one practice-exam session: Idle → Generating → InProgress → Reviewing.
///
/// All mutation goes through `&mut self`, so nothing interleaves with a
/// pending generation except by way of a [`GenerationTicket`].
pub struct SessionController {
    state: SessionState,
    generator: ExamGenerator,
    history: HistoryService,
    clock: Clock,
    duration_secs: u32,
    last_error: Option<String>,
    epoch: u64,
}

impl SessionController {
    #[must_use]
    pub fn new(generator: ExamGenerator, history: HistoryService, clock: Clock) -> Self {
        Self {
            state: SessionState::Idle,
            generator,
            history,
            clock,
            duration_secs: EXAM_DURATION_SECS,
            last_error: None,
            epoch: 0,
        }
    }

    /// Override the exam length.
    #[must_use]
    pub fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn history(&self) -> &TestHistory {
        self.history.history()
    }

    #[must_use]
    pub fn report(&self) -> PerformanceReport {
        self.history.report()
    }

    /// A handle to the generator, for running a generation outside the controller.
    #[must_use]
    pub fn generator(&self) -> ExamGenerator {
        self.generator.clone()
    }

    // ─── generation ──────────────────────────────────────────────────────────

    /// Enter `Generating` for `test_id` and clear any previous error.
    ///
    /// Only allowed from `Idle`; a test under review is restarted through
    /// [`Self::begin_retake`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyGenerating` while a start is pending, or
    /// `SessionError::InvalidTransition` during a test or its review.
    pub fn begin_start(&mut self, test_id: TestId) -> Result<GenerationTicket, SessionError> {
        match self.state {
            SessionState::Idle => Ok(self.enter_generating(test_id)),
            SessionState::Generating { .. } => Err(SessionError::AlreadyGenerating),
            SessionState::InProgress(_) | SessionState::Reviewing(_) => {
                Err(self.invalid("start a test"))
            }
        }
    }

    fn enter_generating(&mut self, test_id: TestId) -> GenerationTicket {
        self.epoch += 1;
        self.last_error = None;
        self.state = SessionState::Generating { test_id };
        debug!(test_id = %test_id, "session generating");
        GenerationTicket {
            test_id,
            epoch: self.epoch,
        }
    }

    /// Apply the generator's answer for `ticket`.
    ///
    /// Success starts the countdown and enters `InProgress` with one empty
    /// answer record per question. Failure returns to `Idle` with
    /// [`GENERATION_FAILED_MESSAGE`] and keeps nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Timer` if the countdown cannot start; the
    /// session is back in `Idle` with [`TIMER_FAILED_MESSAGE`] in that case.
    pub fn finish_start(
        &mut self,
        ticket: GenerationTicket,
        generated: Result<Vec<Question>, GenerationError>,
    ) -> Result<GenerationOutcome, SessionError> {
        let current = matches!(
            self.state,
            SessionState::Generating { test_id } if test_id == ticket.test_id
        );
        if !current || ticket.epoch != self.epoch {
            debug!(test_id = %ticket.test_id, "ignoring stale generation response");
            return Ok(GenerationOutcome::Ignored);
        }

        let questions = match generated {
            Ok(questions) if !questions.is_empty() => questions,
            Ok(_) => return Ok(self.fail_generation(ticket.test_id, &GenerationError::NoQuestions)),
            Err(err) => return Ok(self.fail_generation(ticket.test_id, &err)),
        };

        let timer = match CountdownTimer::start(self.duration_secs) {
            Ok(timer) => timer,
            Err(err) => {
                warn!(test_id = %ticket.test_id, error = %err, "exam timer failed to start");
                self.state = SessionState::Idle;
                self.last_error = Some(TIMER_FAILED_MESSAGE.to_owned());
                return Err(err.into());
            }
        };

        let question_count = questions.len();
        self.state = SessionState::InProgress(ActiveTest::new(ticket.test_id, questions, timer));
        info!(test_id = %ticket.test_id, question_count, "test started");
        Ok(GenerationOutcome::Started { question_count })
    }

    /// Generate and start `test_id` in one step.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_start`] and [`Self::finish_start`].
    pub async fn start_test(&mut self, test_id: TestId) -> Result<GenerationOutcome, SessionError> {
        let ticket = self.begin_start(test_id)?;
        let generated = self.generator.generate(test_id).await;
        self.finish_start(ticket, generated)
    }

    /// Enter `Generating` again for the test under review.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Reviewing`.
    pub fn begin_retake(&mut self) -> Result<GenerationTicket, SessionError> {
        let SessionState::Reviewing(review) = &self.state else {
            return Err(self.invalid("retake"));
        };
        let test_id = review.result.test_id();
        Ok(self.enter_generating(test_id))
    }

    /// Regenerate and restart the test under review.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_retake`] and [`Self::finish_start`].
    pub async fn retake(&mut self) -> Result<GenerationOutcome, SessionError> {
        let ticket = self.begin_retake()?;
        let generated = self.generator.generate(ticket.test_id).await;
        self.finish_start(ticket, generated)
    }

    fn fail_generation(&mut self, test_id: TestId, err: &GenerationError) -> GenerationOutcome {
        warn!(test_id = %test_id, error = %err, "test generation failed");
        self.last_error = Some(GENERATION_FAILED_MESSAGE.to_owned());
        self.state = SessionState::Idle;
        GenerationOutcome::Failed
    }

    /// Leave a pending or running test without scoring it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` from `Idle` or `Reviewing`.
    pub fn abandon(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Generating { .. } | SessionState::InProgress(_) => {}
            _ => return Err(self.invalid("abandon")),
        }
        // Bumping the epoch orphans any ticket still in flight.
        self.epoch += 1;
        self.state = SessionState::Idle;
        debug!("session abandoned");
        Ok(())
    }

    // ─── answering ───────────────────────────────────────────────────────────

    /// Toggle `option` of the question with `question_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `InProgress`, or
    /// `SessionError::Answer` for an unknown question or option.
    pub fn toggle_option(
        &mut self,
        question_id: QuestionId,
        option: usize,
    ) -> Result<(), SessionError> {
        let active = self.active_mut("answer")?;
        let question = active
            .questions
            .iter()
            .find(|q| q.id() == question_id)
            .ok_or(AnswerError::UnknownQuestion(question_id))?;
        active.answers.toggle(question, option)?;
        Ok(())
    }

    /// Toggle `option` of the question under the cursor.
    ///
    /// # Errors
    ///
    /// Same as [`Self::toggle_option`].
    pub fn toggle_current(&mut self, option: usize) -> Result<(), SessionError> {
        let active = self.active_mut("answer")?;
        let Some(question) = active.questions.get(active.cursor) else {
            return Ok(());
        };
        active.answers.toggle(question, option)?;
        Ok(())
    }

    /// Flag or unflag the current question. Returns whether it is now flagged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `InProgress`.
    pub fn toggle_flag(&mut self) -> Result<bool, SessionError> {
        let active = self.active_mut("flag a question")?;
        let Some(id) = active.current_question().map(Question::id) else {
            return Ok(false);
        };
        if active.flagged.remove(&id) {
            Ok(false)
        } else {
            active.flagged.insert(id);
            Ok(true)
        }
    }

    // ─── navigation ──────────────────────────────────────────────────────────

    /// Move the cursor forward, stopping at the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `InProgress` and `Reviewing`.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        let cursor = self.cursor("navigate")?;
        self.go_to(cursor.saturating_add(1))
    }

    /// Move the cursor back, stopping at the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `InProgress` and `Reviewing`.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        let cursor = self.cursor("navigate")?;
        self.go_to(cursor.saturating_sub(1))
    }

    /// Jump to a zero-based position, clamped to the question range.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `InProgress` and `Reviewing`.
    pub fn go_to(&mut self, index: usize) -> Result<usize, SessionError> {
        let phase = self.state.phase().as_str();
        let cursor = match &mut self.state {
            SessionState::InProgress(active) => {
                active.cursor = clamp_cursor(index, active.questions.len());
                active.cursor
            }
            SessionState::Reviewing(review) => {
                review.cursor = clamp_cursor(index, review.result.questions().len());
                review.cursor
            }
            _ => {
                return Err(SessionError::InvalidTransition {
                    action: "navigate",
                    phase,
                });
            }
        };
        Ok(cursor)
    }

    fn cursor(&self, action: &'static str) -> Result<usize, SessionError> {
        match &self.state {
            SessionState::InProgress(active) => Ok(active.cursor),
            SessionState::Reviewing(review) => Ok(review.cursor),
            _ => Err(self.invalid(action)),
        }
    }

    // ─── submission ──────────────────────────────────────────────────────────

    /// Open the submit confirmation. Returns the number of unanswered questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `InProgress`.
    pub fn request_submit(&mut self) -> Result<usize, SessionError> {
        let active = self.active_mut("submit")?;
        active.confirming_submit = true;
        Ok(active.progress().unanswered)
    }

    /// Close the submit confirmation and keep answering.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `InProgress`.
    pub fn cancel_submit(&mut self) -> Result<(), SessionError> {
        self.active_mut("cancel submission")?.confirming_submit = false;
        Ok(())
    }

    /// Score the test, record it in history and enter `Reviewing`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SubmitNotRequested` unless [`Self::request_submit`]
    /// was called first, or `SessionError::InvalidTransition` outside `InProgress`.
    pub async fn confirm_submit(&mut self) -> Result<&TestResult, SessionError> {
        if !self.active_mut("submit")?.confirming_submit {
            return Err(SessionError::SubmitNotRequested);
        }
        self.finish_test(SubmitReason::Confirmed).await
    }

    /// React to the countdown reaching zero.
    ///
    /// Scores the running test without confirmation. Returns `false` and does
    /// nothing when no test is running or its timer has not expired, so a
    /// stale signal is harmless.
    pub async fn handle_timer_expired(&mut self) -> bool {
        let expired = matches!(
            &self.state,
            SessionState::InProgress(active) if active.timer.is_expired()
        );
        if !expired {
            debug!(phase = %self.phase(), "ignoring timer expiry");
            return false;
        }
        self.finish_test(SubmitReason::TimeExpired).await.is_ok()
    }

    /// Receiver for the running countdown, if a test is in progress.
    #[must_use]
    pub fn timer_watch(&self) -> Option<watch::Receiver<TimerSnapshot>> {
        match &self.state {
            SessionState::InProgress(active) => Some(active.timer.subscribe()),
            _ => None,
        }
    }

    async fn finish_test(&mut self, reason: SubmitReason) -> Result<&TestResult, SessionError> {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        let SessionState::InProgress(mut active) = state else {
            self.state = state;
            return Err(self.invalid("submit"));
        };
        active.timer.dispose();

        let result = score_test(
            active.test_id,
            &active.questions,
            &active.answers,
            self.clock.now(),
        );
        info!(
            test_id = %result.test_id(),
            score = result.score(),
            total = result.total_questions(),
            passed = result.passed(),
            reason = reason.as_str(),
            "test submitted"
        );

        self.state = SessionState::Reviewing(ReviewedTest {
            result: result.clone(),
            cursor: 0,
            flagged: active.flagged,
        });

        if let Err(err) = self.history.record(result).await {
            error!(error = %err, "failed to persist test history");
        }

        match &self.state {
            SessionState::Reviewing(review) => Ok(&review.result),
            _ => Err(self.invalid("submit")),
        }
    }

    /// Leave the review screen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` while generating or during a test.
    pub fn back_to_dashboard(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Reviewing(_) => {
                self.state = SessionState::Idle;
                debug!("session idle");
                Ok(())
            }
            _ => Err(self.invalid("return to the dashboard")),
        }
    }

    // ─── views ───────────────────────────────────────────────────────────────

    #[must_use]
    pub fn dashboard(&self) -> DashboardView {
        let generating = match self.state {
            SessionState::Generating { test_id } => Some(test_id),
            _ => None,
        };
        DashboardView::build(
            &self.history.report(),
            self.history.history(),
            generating,
            self.last_error.clone(),
        )
    }

    #[must_use]
    pub fn test_view(&self) -> Option<TestView<'_>> {
        match &self.state {
            SessionState::InProgress(active) => TestView::build(active),
            _ => None,
        }
    }

    #[must_use]
    pub fn review_view(&self) -> Option<ReviewView<'_>> {
        match &self.state {
            SessionState::Reviewing(review) => ReviewView::build(review),
            _ => None,
        }
    }

    fn active_mut(&mut self, action: &'static str) -> Result<&mut ActiveTest, SessionError> {
        let phase = self.state.phase().as_str();
        match &mut self.state {
            SessionState::InProgress(active) => Ok(active),
            _ => Err(SessionError::InvalidTransition { action, phase }),
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.state.phase().as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use exam_core::model::QuestionDraft;
    use exam_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    use crate::generation::{BatchRequest, QuestionGenerator};

    struct Unreachable;

    #[async_trait]
    impl QuestionGenerator for Unreachable {
        async fn generate_batch(
            &self,
            _request: &BatchRequest,
        ) -> Result<Vec<QuestionDraft>, GenerationError> {
            Err(GenerationError::Disabled)
        }
    }

    async fn controller() -> SessionController {
        let history = HistoryService::load(Arc::new(InMemoryRepository::new())).await.unwrap();
        SessionController::new(
            ExamGenerator::new(Arc::new(Unreachable)),
            history,
            Clock::fixed(fixed_now()),
        )
    }

    fn questions(n: u32) -> Vec<Question> {
        (1..=n)
            .map(|i| {
                QuestionDraft {
                    question_text: format!("Question {i}"),
                    code_snippet: None,
                    options: vec!["a".into(), "b".into(), "c".into()],
                    correct_answer_indices: vec![1],
                    explanation: String::new(),
                    domain: "topic".into(),
                }
                .validate()
                .unwrap()
                .assign_id(QuestionId::new(i))
            })
            .collect()
    }

    #[tokio::test]
    async fn second_start_while_generating_is_rejected() {
        let mut session = controller().await;
        session.begin_start(TestId::new(1)).unwrap();
        let err = session.begin_start(TestId::new(2)).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyGenerating));
        assert_eq!(session.phase(), SessionPhase::Generating);
    }

    #[tokio::test]
    async fn navigation_is_clamped() {
        let mut session = controller().await;
        let ticket = session.begin_start(TestId::new(1)).unwrap();
        session.finish_start(ticket, Ok(questions(3))).unwrap();

        assert_eq!(session.previous().unwrap(), 0);
        assert_eq!(session.go_to(10).unwrap(), 2);
        assert_eq!(session.next().unwrap(), 2);
        assert_eq!(session.previous().unwrap(), 1);
    }

    #[tokio::test]
    async fn toggles_only_touch_the_named_question() {
        let mut session = controller().await;
        let ticket = session.begin_start(TestId::new(1)).unwrap();
        session.finish_start(ticket, Ok(questions(2))).unwrap();

        session.toggle_option(QuestionId::new(2), 1).unwrap();
        session.toggle_option(QuestionId::new(2), 2).unwrap();
        let err = session.toggle_option(QuestionId::new(9), 0).unwrap_err();
        assert!(matches!(err, SessionError::Answer(AnswerError::UnknownQuestion(_))));

        let SessionState::InProgress(active) = session.state() else {
            panic!("expected a running test");
        };
        assert!(active.answers().selection(QuestionId::new(1)).is_empty());
        assert_eq!(
            active.answers().selection(QuestionId::new(2)).into_iter().collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[tokio::test]
    async fn confirm_requires_request() {
        let mut session = controller().await;
        let ticket = session.begin_start(TestId::new(1)).unwrap();
        session.finish_start(ticket, Ok(questions(2))).unwrap();

        let err = session.confirm_submit().await.unwrap_err();
        assert!(matches!(err, SessionError::SubmitNotRequested));

        assert_eq!(session.request_submit().unwrap(), 2);
        session.cancel_submit().unwrap();
        assert!(session.confirm_submit().await.is_err());
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }

    #[tokio::test]
    async fn flags_toggle_on_the_current_question() {
        let mut session = controller().await;
        let ticket = session.begin_start(TestId::new(1)).unwrap();
        session.finish_start(ticket, Ok(questions(2))).unwrap();

        assert!(session.toggle_flag().unwrap());
        session.next().unwrap();
        assert!(session.toggle_flag().unwrap());
        assert!(!session.toggle_flag().unwrap());

        let SessionState::InProgress(active) = session.state() else {
            panic!("expected a running test");
        };
        assert!(active.is_flagged(QuestionId::new(1)));
        assert!(!active.is_flagged(QuestionId::new(2)));
    }

    #[tokio::test]
    async fn empty_question_list_counts_as_failure() {
        let mut session = controller().await;
        let ticket = session.begin_start(TestId::new(4)).unwrap();
        let outcome = session.finish_start(ticket, Ok(Vec::new())).unwrap();
        assert_eq!(outcome, GenerationOutcome::Failed);
        assert_eq!(session.last_error(), Some(GENERATION_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn review_restarts_only_through_retake() {
        let mut session = controller().await;
        let ticket = session.begin_start(TestId::new(6)).unwrap();
        session.finish_start(ticket, Ok(questions(2))).unwrap();
        session.request_submit().unwrap();
        session.confirm_submit().await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Reviewing);

        let err = session.begin_start(TestId::new(2)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition { action: "start a test", phase: "reviewing" }
        ));
        assert_eq!(session.phase(), SessionPhase::Reviewing);

        let ticket = session.begin_retake().unwrap();
        assert_eq!(ticket.test_id(), TestId::new(6));
        assert_eq!(session.phase(), SessionPhase::Generating);
    }

    #[test]
    fn timer_failure_returns_to_idle_with_message() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let mut session = runtime.block_on(controller());
        drop(runtime);

        let ticket = session.begin_start(TestId::new(1)).unwrap();
        let err = session.finish_start(ticket, Ok(questions(2))).unwrap_err();
        assert!(matches!(err, SessionError::Timer(_)));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.last_error(), Some(TIMER_FAILED_MESSAGE));
        assert_eq!(session.dashboard().error.as_deref(), Some(TIMER_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn actions_outside_their_phase_are_rejected() {
        let mut session = controller().await;
        assert!(matches!(
            session.next().unwrap_err(),
            SessionError::InvalidTransition { action: "navigate", phase: "idle" }
        ));
        assert!(session.toggle_current(0).is_err());
        assert!(session.abandon().is_err());
        assert!(session.begin_retake().is_err());
        assert!(!session.handle_timer_expired().await);
        assert!(session.timer_watch().is_none());
    }
}
