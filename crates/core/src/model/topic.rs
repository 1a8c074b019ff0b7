/// One exam objective with its weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopicConfig {
    /// Stable identifier, independent of the display label.
    pub id: &'static str,
    /// Display label; also the label the generator is asked to report.
    pub name: &'static str,
    /// Share of the exam, 0.0 - 1.0.
    pub weight: f64,
    /// Questions of this topic in one full-length exam.
    pub question_count: u32,
}

/// Terraform Associate (003) objectives. Per-exam counts sum to [`EXAM_QUESTION_COUNT`].
pub const EXAM_TOPICS: [TopicConfig; 9] = [
    TopicConfig {
        id: "iac-concepts",
        name: "1. Understand infrastructure as code (IaC) concepts",
        weight: 0.10,
        question_count: 6,
    },
    TopicConfig {
        id: "terraform-purpose",
        name: "2. Understand the purpose of Terraform (vs other IaC)",
        weight: 0.07,
        question_count: 4,
    },
    TopicConfig {
        id: "terraform-basics",
        name: "3. Understand Terraform basics (providers, resources, data sources)",
        weight: 0.10,
        question_count: 6,
    },
    TopicConfig {
        id: "terraform-cli",
        name: "4. Use Terraform CLI (init, plan, apply, destroy, fmt, validate)",
        weight: 0.10,
        question_count: 6,
    },
    TopicConfig {
        id: "terraform-modules",
        name: "5. Interact with Terraform modules (inputs, outputs, source)",
        weight: 0.13,
        question_count: 7,
    },
    TopicConfig {
        id: "terraform-workflow",
        name: "6. Navigate Terraform workflow (write -> plan -> create)",
        weight: 0.25,
        question_count: 14,
    },
    TopicConfig {
        id: "terraform-state",
        name: "7. Implement and maintain state (backend, locking, remote)",
        weight: 0.13,
        question_count: 7,
    },
    TopicConfig {
        id: "terraform-config",
        name: "8. Read, generate, and modify configuration (variables, locals, loops)",
        weight: 0.08,
        question_count: 5,
    },
    TopicConfig {
        id: "terraform-cloud",
        name: "9. Understand Terraform Cloud capabilities",
        weight: 0.04,
        question_count: 2,
    },
];

/// Questions in one full-length exam.
pub const EXAM_QUESTION_COUNT: u32 = 57;

/// Topics requested in the first generation batch; the rest go in the second.
pub const FIRST_BATCH_TOPICS: usize = 5;

/// Split a topic list into the two generation batches.
#[must_use]
pub fn split_batches(topics: &[TopicConfig]) -> (&[TopicConfig], &[TopicConfig]) {
    topics.split_at(FIRST_BATCH_TOPICS.min(topics.len()))
}
