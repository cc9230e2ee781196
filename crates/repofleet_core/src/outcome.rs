use std::path::PathBuf;

use crate::classify::{FailureClass, NOT_APPLICABLE_MESSAGE, classify_failure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Applied,
    AlreadyApplied,
    Planned,
    NotApplicable,
    Failed,
    Skipped,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Applied | Self::AlreadyApplied | Self::Planned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyApplied => "already_applied",
            Self::Planned => "planned",
            Self::NotApplicable => "not_applicable",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome of one (target, operation) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub target: String,
    pub operation: String,
    pub outcome: Outcome,
    pub message: String,
    pub output_path: Option<PathBuf>,
}

impl OperationResult {
    pub fn new(
        target: &str,
        operation: &str,
        outcome: Outcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target: target.to_string(),
            operation: operation.to_string(),
            outcome,
            message: message.into(),
            output_path: None,
        }
    }

    pub fn with_output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }

    /// Build the result for a failed call from its diagnostic text.
    pub fn from_failure(target: &str, operation: &str, error_text: &str) -> Self {
        match classify_failure(error_text) {
            FailureClass::AlreadyApplied(message) => {
                Self::new(target, operation, Outcome::AlreadyApplied, message)
            }
            FailureClass::NotApplicable => Self::new(
                target,
                operation,
                Outcome::NotApplicable,
                NOT_APPLICABLE_MESSAGE,
            ),
            FailureClass::Error => Self::new(target, operation, Outcome::Failed, error_text),
        }
    }

    pub fn success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_text_is_classified() {
        let soft = OperationResult::from_failure("acme/api", "codeql", "gh: Not Found (HTTP 404)");
        assert_eq!(soft.outcome, Outcome::NotApplicable);
        assert_eq!(soft.message, NOT_APPLICABLE_MESSAGE);
        assert!(!soft.success());

        let idempotent =
            OperationResult::from_failure("acme/api", "codeql", "state already configured");
        assert_eq!(idempotent.outcome, Outcome::AlreadyApplied);
        assert!(idempotent.success());

        let hard = OperationResult::from_failure("acme/api", "codeql", "gh: Bad credentials");
        assert_eq!(hard.outcome, Outcome::Failed);
        assert_eq!(hard.message, "gh: Bad credentials");
    }

    #[test]
    fn skipped_and_soft_results_are_not_successes() {
        for outcome in [Outcome::Skipped, Outcome::NotApplicable, Outcome::Failed] {
            assert!(!outcome.is_success(), "{}", outcome.as_str());
        }
        for outcome in [Outcome::Applied, Outcome::AlreadyApplied, Outcome::Planned] {
            assert!(outcome.is_success(), "{}", outcome.as_str());
        }
    }
}
