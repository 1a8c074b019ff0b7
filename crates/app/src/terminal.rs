//! Interactive practice loop on stdin/stdout.

use std::future::{Future, pending};
use std::pin::Pin;

use exam_core::model::{PRACTICE_TEST_COUNT, Question, TestId};
use services::sessions::{GenerationOutcome, GenerationTicket, SessionPhase};
use services::{GenerationError, SessionController, SessionError, wait_for_expiry};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render;

type PendingGeneration = Pin<Box<dyn Future<Output = Result<Vec<Question>, GenerationError>>>>;

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Start(u32),
    Choose(usize),
    Next,
    Previous,
    GoTo(usize),
    Flag,
    Submit,
    Yes,
    No,
    Abandon,
    Retake,
    Back,
    CheatSheet,
    Show,
    Help,
    Quit,
}

impl Input {
    /// Parse a command line. Option letters are case-insensitive; question
    /// numbers are 1-based.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Some(Self::Show);
        };
        let head = head.to_ascii_lowercase();
        let arg = words.next();
        if words.next().is_some() {
            return None;
        }

        let number = |raw: Option<&str>| raw.and_then(|s| s.parse::<usize>().ok());
        let input = match (head.as_str(), arg) {
            ("start" | "s", Some(raw)) => Self::Start(raw.parse().ok()?),
            ("go" | "goto" | "g", raw) => Self::GoTo(number(raw)?.checked_sub(1)?),
            ("next" | "n", None) => Self::Next,
            ("prev" | "previous" | "p", None) => Self::Previous,
            ("flag", None) => Self::Flag,
            ("submit", None) => Self::Submit,
            ("yes" | "y", None) => Self::Yes,
            ("no", None) => Self::No,
            ("abandon" | "cancel", None) => Self::Abandon,
            ("retake", None) => Self::Retake,
            ("back" | "dashboard", None) => Self::Back,
            ("sheet" | "cheatsheet", None) => Self::CheatSheet,
            ("show" | "time", None) => Self::Show,
            ("help" | "h" | "?", None) => Self::Help,
            ("quit" | "exit" | "q", None) => Self::Quit,
            (letter, None) if letter.len() == 1 => {
                let byte = letter.as_bytes()[0];
                if !byte.is_ascii_lowercase() {
                    return None;
                }
                Self::Choose(usize::from(byte - b'a'))
            }
            _ => return None,
        };
        Some(input)
    }
}

fn help(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => "Commands: start <1-10>, sheet, help, quit",
        SessionPhase::Generating => "Generating questions... type 'cancel' to give up",
        SessionPhase::InProgress => {
            "Commands: a/b/c/... toggle an option, n(ext), p(rev), go <n>, flag, submit, show, abandon"
        }
        SessionPhase::Reviewing => "Commands: n(ext), p(rev), go <n>, retake, back",
    }
}

/// Drive `session` from stdin until the user quits or input ends.
///
/// # Errors
///
/// Returns an I/O error if stdin cannot be read.
pub async fn run(mut session: SessionController) -> io::Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut generation: Option<(GenerationTicket, PendingGeneration)> = None;

    print!("{}", render::dashboard(&session.dashboard()));
    println!("{}", help(SessionPhase::Idle));

    loop {
        let timer = session.timer_watch();
        let expiry = async {
            match timer {
                Some(watch) => wait_for_expiry(watch).await,
                None => pending().await,
            }
        };
        let generated = async {
            match generation.as_mut() {
                Some((_, future)) => future.as_mut().await,
                None => pending().await,
            }
        };

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    return Ok(());
                };
                let Some(input) = Input::parse(&line) else {
                    println!("Unrecognised command. {}", help(session.phase()));
                    continue;
                };
                if input == Input::Quit {
                    return Ok(());
                }
                match handle(&mut session, input).await {
                    Ok(Some(ticket)) => {
                        let generator = session.generator();
                        let test_id = ticket.test_id();
                        println!("Generating Practice Test {}...", test_id.value());
                        let future: PendingGeneration =
                            Box::pin(async move { generator.generate(test_id).await });
                        generation = Some((ticket, future));
                        continue;
                    }
                    Ok(None) => {}
                    Err(err) => println!("{err}"),
                }
                if session.phase() != SessionPhase::Generating {
                    generation = None;
                }
            }
            questions = generated => {
                let Some((ticket, _)) = generation.take() else {
                    continue;
                };
                match session.finish_start(ticket, questions) {
                    Ok(GenerationOutcome::Ignored) => continue,
                    Ok(_) => {}
                    Err(err) => println!("{err}"),
                }
            }
            expired = expiry => {
                if expired && session.handle_timer_expired().await {
                    println!("Time is up. Your test has been submitted.");
                }
            }
        }

        show(&session);
    }
}

/// Apply one input. Returns a ticket when a generation should start.
async fn handle(
    session: &mut SessionController,
    input: Input,
) -> Result<Option<GenerationTicket>, SessionError> {
    match (session.phase(), input) {
        (_, Input::Help) => println!("{}", help(session.phase())),
        (_, Input::Show) => {}
        (SessionPhase::Idle, Input::Start(n)) => {
            if !(1..=PRACTICE_TEST_COUNT).contains(&n) {
                println!("Pick a practice test between 1 and {PRACTICE_TEST_COUNT}.");
                return Ok(None);
            }
            return session.begin_start(TestId::new(n)).map(Some);
        }
        (SessionPhase::Reviewing, Input::Retake) => return session.begin_retake().map(Some),
        (SessionPhase::Idle, Input::CheatSheet) => print!("{}", render::cheat_sheet()),
        (_, Input::Choose(option)) => session.toggle_current(option)?,
        (_, Input::Next) => {
            session.next()?;
        }
        (_, Input::Previous) => {
            session.previous()?;
        }
        (_, Input::GoTo(index)) => {
            session.go_to(index)?;
        }
        (_, Input::Flag) => {
            session.toggle_flag()?;
        }
        (_, Input::Submit) => {
            session.request_submit()?;
        }
        (_, Input::Yes) => {
            session.confirm_submit().await?;
        }
        (_, Input::No) => session.cancel_submit()?,
        (_, Input::Abandon) => session.abandon()?,
        (_, Input::Back) => session.back_to_dashboard()?,
        (phase, other) => {
            debug!(?other, %phase, "command not available");
            println!("Not available now. {}", help(phase));
        }
    }
    Ok(None)
}

fn show(session: &SessionController) {
    match session.phase() {
        SessionPhase::Idle => print!("{}", render::dashboard(&session.dashboard())),
        SessionPhase::Generating => {}
        SessionPhase::InProgress => {
            if let Some(view) = session.test_view() {
                print!("{}", render::test(&view));
            }
        }
        SessionPhase::Reviewing => {
            if let Some(view) = session.review_view() {
                print!("{}", render::review(&view));
            }
        }
    }
}
