//! Performance statistics derived from the test history.
//!
//! Nothing here is stored; every figure is recomputed from the history on demand.

use std::collections::BTreeMap;

use crate::model::{TestHistory, TopicConfig};
use crate::scoring::{answers_match, percentage};

//
// ─── TOPIC ROUTING ─────────────────────────────────────────────────────────────
//

/// How a question's reported domain label is mapped onto a configured topic.
///
/// The generator does not always echo the configured label verbatim, so the
/// default also accepts a label contained in a configured one. That fallback
/// can misroute a label that happens to be a substring of an unrelated topic;
/// use `Exact` when labels are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicRouting {
    /// Label must equal a configured name or id.
    Exact,
    /// Exact first, then the first configured name containing the label.
    #[default]
    ExactThenContainment,
}

impl TopicRouting {
    /// Resolve `label` to a configured topic, or `None` for an ad-hoc bucket.
    #[must_use]
    pub fn resolve<'a>(self, topics: &'a [TopicConfig], label: &str) -> Option<&'a TopicConfig> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }

        let exact = topics
            .iter()
            .find(|t| t.name == label)
            .or_else(|| topics.iter().find(|t| t.id == label));

        match self {
            Self::Exact => exact,
            Self::ExactThenContainment => {
                exact.or_else(|| topics.iter().find(|t| t.name.contains(label)))
            }
        }
    }
}

//
// ─── OUTPUT TYPES ──────────────────────────────────────────────────────────────
//

/// Dashboard headline figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerformanceSummary {
    pub tests_taken: usize,
    pub average_score_percent: u32,
    pub pass_rate_percent: u32,
}

/// Accumulated accuracy for one topic bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicStats {
    pub label: String,
    /// Configured topic id; `None` for ad-hoc buckets created from drifted labels.
    pub topic_id: Option<&'static str>,
    pub correct: u32,
    pub total: u32,
}

impl TopicStats {
    /// Rounded accuracy, or `None` if no question landed in this bucket.
    #[must_use]
    pub fn percent(&self) -> Option<u32> {
        (self.total > 0).then(|| percentage(self.correct, self.total))
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.topic_id.is_some()
    }
}

/// Per-topic buckets: configured topics in configuration order, then ad-hoc
/// buckets sorted by label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicBreakdown {
    buckets: Vec<TopicStats>,
}

impl TopicBreakdown {
    /// Every bucket, including ones with no questions.
    #[must_use]
    pub fn buckets(&self) -> &[TopicStats] {
        &self.buckets
    }

    /// Buckets worth rendering (at least one question).
    pub fn visible(&self) -> impl Iterator<Item = &TopicStats> {
        self.buckets.iter().filter(|b| b.total > 0)
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&TopicStats> {
        self.buckets.iter().find(|b| b.label == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PerformanceReport {
    pub summary: PerformanceSummary,
    pub topics: TopicBreakdown,
}

//
// ─── AGGREGATION ───────────────────────────────────────────────────────────────
//

/// Average score and pass rate across the history. Both are 0 when it is empty.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn summarize(history: &TestHistory) -> PerformanceSummary {
    let tests_taken = history.len();
    if tests_taken == 0 {
        return PerformanceSummary::default();
    }

    let ratio_sum: f64 = history
        .iter()
        .map(|r| {
            if r.total_questions() == 0 {
                0.0
            } else {
                f64::from(r.score()) / f64::from(r.total_questions())
            }
        })
        .sum();
    let average_score_percent = (ratio_sum / tests_taken as f64 * 100.0).round() as u32;

    let passed = history.iter().filter(|r| r.passed()).count();
    let pass_rate_percent = (passed as f64 / tests_taken as f64 * 100.0).round() as u32;

    PerformanceSummary {
        tests_taken,
        average_score_percent,
        pass_rate_percent,
    }
}

/// Fold every historical question into its topic bucket.
///
/// Counting is commutative, so the result does not depend on history order.
#[must_use]
pub fn topic_breakdown(
    history: &TestHistory,
    topics: &[TopicConfig],
    routing: TopicRouting,
) -> TopicBreakdown {
    let mut configured = vec![(0_u32, 0_u32); topics.len()];
    let mut ad_hoc: BTreeMap<String, (u32, u32)> = BTreeMap::new();

    for result in history {
        for question in result.questions() {
            let selected = result.user_answers().selection(question.id());
            let hit = u32::from(answers_match(question.correct_indices(), &selected));

            let slot = match routing.resolve(topics, question.domain()) {
                Some(topic) => {
                    let index = topics
                        .iter()
                        .position(|t| t.id == topic.id)
                        .unwrap_or_default();
                    &mut configured[index]
                }
                None => ad_hoc.entry(question.domain().to_owned()).or_default(),
            };
            slot.0 = slot.0.saturating_add(hit);
            slot.1 = slot.1.saturating_add(1);
        }
    }

    let mut buckets: Vec<TopicStats> = topics
        .iter()
        .zip(configured)
        .map(|(topic, (correct, total))| TopicStats {
            label: topic.name.to_owned(),
            topic_id: Some(topic.id),
            correct,
            total,
        })
        .collect();
    buckets.extend(ad_hoc.into_iter().map(|(label, (correct, total))| TopicStats {
        label,
        topic_id: None,
        correct,
        total,
    }));

    TopicBreakdown { buckets }
}

/// Summary plus topic breakdown in one pass over the inputs.
#[must_use]
pub fn analyze(
    history: &TestHistory,
    topics: &[TopicConfig],
    routing: TopicRouting,
) -> PerformanceReport {
    PerformanceReport {
        summary: summarize(history),
        topics: topic_breakdown(history, topics, routing),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerSheet, EXAM_TOPICS, Question, QuestionDraft, QuestionId, TestId, TestResult};
    use crate::scoring::score_test;
    use crate::time::fixed_now;

    fn question(id: u32, domain: &str) -> Question {
        QuestionDraft {
            question_text: format!("Q{id}"),
            code_snippet: None,
            options: vec!["right".into(), "wrong".into()],
            correct_answer_indices: vec![0],
            explanation: String::new(),
            domain: domain.into(),
        }
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(id))
    }

    /// Build a result where question `i` is answered correctly iff `correct[i]`.
    fn result(test_id: u32, domains: &[&str], correct: &[bool]) -> TestResult {
        let questions: Vec<_> = domains
            .iter()
            .enumerate()
            .map(|(i, d)| question(u32::try_from(i + 1).unwrap(), d))
            .collect();
        let mut answers = AnswerSheet::for_questions(&questions);
        for (q, ok) in questions.iter().zip(correct) {
            answers.toggle(q, if *ok { 0 } else { 1 }).unwrap();
        }
        score_test(TestId::new(test_id), &questions, &answers, fixed_now())
    }

    #[test]
    fn empty_history_reports_zeroes() {
        let report = analyze(&TestHistory::new(), &EXAM_TOPICS, TopicRouting::default());
        assert_eq!(report.summary, PerformanceSummary::default());
        assert_eq!(report.topics.buckets().len(), EXAM_TOPICS.len());
        assert_eq!(report.topics.visible().count(), 0);
    }

    #[test]
    fn one_pass_one_fail_gives_half_pass_rate() {
        let cli = EXAM_TOPICS[3].name;
        let history = TestHistory::from_results(vec![
            result(1, &[cli, cli], &[true, true]),
            result(2, &[cli, cli], &[true, false]),
        ]);
        let summary = summarize(&history);
        assert_eq!(summary.tests_taken, 2);
        assert_eq!(summary.pass_rate_percent, 50);
        assert_eq!(summary.average_score_percent, 75);
    }

    #[test]
    fn routing_prefers_exact_then_containment() {
        let routing = TopicRouting::ExactThenContainment;
        assert_eq!(routing.resolve(&EXAM_TOPICS, EXAM_TOPICS[6].name).unwrap().id, "terraform-state");
        assert_eq!(routing.resolve(&EXAM_TOPICS, "terraform-cloud").unwrap().id, "terraform-cloud");
        assert_eq!(routing.resolve(&EXAM_TOPICS, "Use Terraform CLI").unwrap().id, "terraform-cli");
        assert!(routing.resolve(&EXAM_TOPICS, "Sentinel policies").is_none());
        assert!(routing.resolve(&EXAM_TOPICS, "   ").is_none());

        assert!(TopicRouting::Exact.resolve(&EXAM_TOPICS, "Use Terraform CLI").is_none());
    }

    #[test]
    fn drifted_labels_get_ad_hoc_buckets_after_configured_ones() {
        let state = EXAM_TOPICS[6].name;
        let history = TestHistory::from_results(vec![result(
            1,
            &[state, "Zeta drift", "Implement and maintain state", "Alpha drift"],
            &[true, false, false, true],
        )]);
        let breakdown = topic_breakdown(&history, &EXAM_TOPICS, TopicRouting::default());

        let bucket = breakdown.get(state).unwrap();
        assert_eq!((bucket.correct, bucket.total), (1, 2));
        assert_eq!(bucket.percent(), Some(50));

        let labels: Vec<_> = breakdown.buckets()[EXAM_TOPICS.len()..]
            .iter()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Alpha drift", "Zeta drift"]);
        assert!(!breakdown.get("Alpha drift").unwrap().is_configured());

        let visible: Vec<_> = breakdown.visible().map(|b| b.label.as_str()).collect();
        assert_eq!(visible, vec![state, "Alpha drift", "Zeta drift"]);
    }

    #[test]
    fn breakdown_is_independent_of_history_order() {
        let a = EXAM_TOPICS[0].name;
        let b = EXAM_TOPICS[5].name;
        let results = vec![
            result(1, &[a, b, "other"], &[true, false, true]),
            result(2, &[b, b, a], &[true, true, false]),
            result(3, &[a, "other"], &[false, false]),
        ];
        let forward = TestHistory::from_results(results.clone());
        let mut reversed = results;
        reversed.reverse();
        let reversed = TestHistory::from_results(reversed);

        let left = analyze(&forward, &EXAM_TOPICS, TopicRouting::default());
        let right = analyze(&reversed, &EXAM_TOPICS, TopicRouting::default());
        assert_eq!(left, right);

        let total_questions: u32 = left.topics.buckets().iter().map(|b| b.total).sum();
        assert_eq!(total_questions, 8);
        assert!(left.topics.buckets().iter().all(|b| b.correct <= b.total));
    }
}
