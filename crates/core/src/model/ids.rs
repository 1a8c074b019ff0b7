use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a question, unique within one test (assigned 1..=N).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(u32);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Number of practice tests offered on the dashboard.
pub const PRACTICE_TEST_COUNT: u32 = 10;

/// Identifier of a practice test (the numbered tests on the dashboard).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestId(u32);

impl TestId {
    /// Creates a new `TestId`
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Tests 1..=[`PRACTICE_TEST_COUNT`].
    pub fn practice_tests() -> impl Iterator<Item = TestId> {
        (1..=PRACTICE_TEST_COUNT).map(TestId)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&QuestionId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: TestId = serde_json::from_str("3").unwrap();
        assert_eq!(back, TestId::new(3));
    }

    #[test]
    fn debug_and_display_formats() {
        assert_eq!(format!("{:?}", TestId::new(2)), "TestId(2)");
        assert_eq!(QuestionId::new(12).to_string(), "12");
    }

    #[test]
    fn practice_tests_are_numbered_from_one() {
        let ids: Vec<_> = TestId::practice_tests().map(|t| t.value()).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }
}
