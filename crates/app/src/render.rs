//! Plain-text rendering of the session views.

use std::fmt::Write as _;

use exam_core::cheatsheet::{CHEAT_SHEET, CHEAT_SHEET_TITLE};
use exam_core::model::TestHistory;
use exam_core::scoring::PASSING_PERCENT;
use services::sessions::{DashboardView, ReviewView, TestView};

const RULE: &str = "────────────────────────────────────────────────────────────";

/// Option label shown to the user: `A`, `B`, ...
#[must_use]
pub fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .and_then(|i| b'A'.checked_add(i))
        .map_or('?', char::from)
}

/// Topic bucket name, with blank domain labels shown as `(unlabelled)`.
fn topic_label(label: &str) -> &str {
    let label = label.trim();
    if label.is_empty() { "(unlabelled)" } else { label }
}

#[must_use]
pub fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Terraform Associate (003) practice");
    let _ = writeln!(out, "{RULE}");
    if let Some(error) = &view.error {
        let _ = writeln!(out, "! {error}");
    }
    out.push_str(&summary(view));

    let _ = writeln!(out, "\nPractice tests (start <n>):");
    for item in &view.practice_tests {
        let status = match item.latest_percent {
            Some(percent) => format!("last {percent}%, {} attempt(s)", item.attempts),
            None => "not taken".to_owned(),
        };
        let marker = if view.generating == Some(item.test_id) {
            "  generating..."
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {:>2}. Practice Test {:<3} {status}{marker}",
            item.test_id.value(),
            item.test_id.value()
        );
    }
    out
}

/// Headline figures and the topic breakdown.
#[must_use]
pub fn summary(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Tests taken: {}   Average: {}%   Pass rate: {}%",
        view.summary.tests_taken,
        view.summary.average_score_percent,
        view.summary.pass_rate_percent
    );
    if !view.topics.is_empty() {
        let _ = writeln!(out, "\nBy topic:");
        for topic in &view.topics {
            let percent = topic.percent().unwrap_or(0);
            let _ = writeln!(
                out,
                "  {percent:>3}%  {:>3}/{:<3} {}",
                topic.correct,
                topic.total,
                topic_label(&topic.label)
            );
        }
    }
    out
}

#[must_use]
pub fn test(view: &TestView<'_>) -> String {
    let mut out = String::new();
    let urgent = if view.clock.urgent { "  HURRY" } else { "" };
    let _ = writeln!(
        out,
        "Practice Test {}   Question {}/{}   Answered {}   Time {}{urgent}",
        view.test_id.value(),
        view.progress.position,
        view.progress.total,
        view.progress.answered,
        view.clock.label()
    );
    let _ = writeln!(out, "{RULE}");

    let question = view.question;
    let flag = if view.flagged { " [flagged]" } else { "" };
    let _ = writeln!(out, "{}{flag}", question.domain());
    let _ = writeln!(out, "\n{}", question.text());
    if let Some(code) = question.code_snippet() {
        let _ = writeln!(out);
        for line in code.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    if question.is_multi_select() {
        let _ = writeln!(
            out,
            "\n(Select {} answers)",
            question.correct_indices().len()
        );
    }
    let _ = writeln!(out);
    for (index, option) in question.options().iter().enumerate() {
        let mark = if view.selected.contains(&index) { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {}) {option}", option_letter(index));
    }

    let _ = writeln!(out, "\n{}", grid(view));
    if let Some(confirm) = view.confirmation {
        if confirm.unanswered > 0 {
            let _ = writeln!(
                out,
                "You have {} unanswered question(s). Submit anyway? (yes/no)",
                confirm.unanswered
            );
        } else {
            let _ = writeln!(out, "Submit the test? (yes/no)");
        }
    }
    out
}

fn grid(view: &TestView<'_>) -> String {
    view.grid
        .iter()
        .map(|cell| {
            let state = match (cell.current, cell.flagged, cell.answered) {
                (true, _, _) => '>',
                (false, true, _) => '?',
                (false, false, true) => '*',
                (false, false, false) => '.',
            };
            format!("{state}{}", cell.number)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[must_use]
pub fn review(view: &ReviewView<'_>) -> String {
    let mut out = String::new();
    let verdict = if view.passed { "PASSED" } else { "FAILED" };
    let _ = writeln!(
        out,
        "Practice Test {} review   {}/{} ({}%)   {verdict} (pass mark {PASSING_PERCENT}%)   {}",
        view.test_id.value(),
        view.score,
        view.total_questions,
        view.percentage,
        view.taken_on
    );
    let _ = writeln!(out, "{RULE}");

    let question = view.question;
    let mark = if view.correct { "Correct" } else { "Incorrect" };
    let flagged = if view.flagged_during_test {
        "  (flagged during test)"
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "Question {}/{}: {mark}{flagged}",
        view.position, view.total_questions
    );
    let _ = writeln!(out, "{}\n\n{}", question.domain(), question.text());
    if let Some(code) = question.code_snippet() {
        let _ = writeln!(out);
        for line in code.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    let _ = writeln!(out);
    for option in &view.options {
        let status = match (option.correct, option.selected) {
            (true, true) => "correct, your answer",
            (true, false) => "correct",
            (false, true) => "your answer, wrong",
            (false, false) => "",
        };
        let _ = writeln!(
            out,
            "  {}) {}{}",
            option_letter(option.index),
            option.text,
            if status.is_empty() {
                String::new()
            } else {
                format!("  <- {status}")
            }
        );
    }
    if !question.explanation().is_empty() {
        let _ = writeln!(out, "\nExplanation: {}", question.explanation());
    }

    let cells = view
        .grid
        .iter()
        .map(|cell| {
            let state = match (cell.current, cell.correct) {
                (true, _) => '>',
                (false, true) => '+',
                (false, false) => '-',
            };
            format!("{state}{}", cell.number)
        })
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "\n{cells}");
    out
}

/// One line per result, most recent first.
#[must_use]
pub fn history(history: &TestHistory) -> String {
    if history.is_empty() {
        return "No tests taken yet.\n".to_owned();
    }
    let mut out = String::new();
    for result in history {
        let _ = writeln!(
            out,
            "{}  Practice Test {:<3} {:>3}/{:<3} {:>3}%  {}",
            result.local_date(),
            result.test_id().value(),
            result.score(),
            result.total_questions(),
            result.percentage(),
            if result.passed() { "PASS" } else { "FAIL" }
        );
    }
    out
}

/// The revision notes for every objective.
#[must_use]
pub fn cheat_sheet() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{CHEAT_SHEET_TITLE}");
    let _ = writeln!(out, "{RULE}");
    for section in &CHEAT_SHEET {
        let _ = writeln!(out, "\n{}", section.title);
        if let Some(code) = section.code {
            for line in code.lines() {
                let _ = writeln!(out, "    | {line}");
            }
        }
        for entry in section.entries {
            let _ = writeln!(out, "  * {}: {}", entry.term, entry.detail);
        }
    }
    out
}
