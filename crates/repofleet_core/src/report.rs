use crate::outcome::OperationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrder {
    TargetThenOperation,
    OperationThenTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Non-zero exit when any operation failed.
    FailOnAnyFailure,
    /// Failures are reported but never change the exit status.
    ReportOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSummary {
    pub operation: String,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub dry_run: bool,
    /// Operation names in selection order.
    pub operations: Vec<String>,
    /// Results in completion order.
    pub results: Vec<OperationResult>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|result| result.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn sorted(&self) -> Vec<&OperationResult> {
        let mut sorted = self.results.iter().collect::<Vec<_>>();
        sorted.sort_by(|left, right| {
            (&left.target, &left.operation).cmp(&(&right.target, &right.operation))
        });
        sorted
    }

    pub fn failures(&self, order: FailureOrder) -> Vec<&OperationResult> {
        let mut failures = self
            .results
            .iter()
            .filter(|result| !result.success())
            .collect::<Vec<_>>();
        match order {
            FailureOrder::TargetThenOperation => failures.sort_by(|left, right| {
                (&left.target, &left.operation).cmp(&(&right.target, &right.operation))
            }),
            FailureOrder::OperationThenTarget => failures.sort_by(|left, right| {
                (&left.operation, &left.target).cmp(&(&right.operation, &right.target))
            }),
        }
        failures
    }

    pub fn summary_by_operation(&self) -> Vec<OperationSummary> {
        self.operations
            .iter()
            .map(|operation| {
                let (succeeded, failed) = self
                    .results
                    .iter()
                    .filter(|result| &result.operation == operation)
                    .fold((0, 0), |(ok, fail), result| {
                        if result.success() {
                            (ok + 1, fail)
                        } else {
                            (ok, fail + 1)
                        }
                    });
                OperationSummary {
                    operation: operation.clone(),
                    succeeded,
                    failed,
                }
            })
            .collect()
    }

    pub fn exit_status(&self, policy: ExitPolicy) -> u8 {
        match policy {
            ExitPolicy::FailOnAnyFailure if self.has_failures() => 1,
            _ => 0,
        }
    }
}

/// Inline progress bar: `[████░░░░] 3/8 (38%)`.
pub fn render_progress(done: usize, total: usize, width: usize) -> String {
    let ratio = if total == 0 {
        1.0
    } else {
        (done.min(total) as f64) / (total as f64)
    };
    let filled = ((width as f64) * ratio) as usize;
    format!(
        "[{}{}] {done}/{total} ({:.0}%)",
        "█".repeat(filled),
        "░".repeat(width - filled),
        ratio * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;

    fn result(target: &str, operation: &str, outcome: Outcome) -> OperationResult {
        OperationResult::new(target, operation, outcome, outcome.as_str())
    }

    fn sample() -> RunReport {
        RunReport {
            dry_run: false,
            operations: vec!["sbom".to_string(), "codeql".to_string()],
            results: vec![
                result("acme/web", "codeql", Outcome::NotApplicable),
                result("acme/api", "sbom", Outcome::Applied),
                result("acme/web", "sbom", Outcome::Applied),
                result("acme/api", "codeql", Outcome::Failed),
            ],
        }
    }

    #[test]
    fn counts_reconcile() {
        let report = sample();
        assert_eq!(report.total(), 4);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn listing_is_sorted_by_target_then_operation() {
        let report = sample();
        let order = report
            .sorted()
            .into_iter()
            .map(|result| format!("{} {}", result.target, result.operation))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec!["acme/api codeql", "acme/api sbom", "acme/web codeql", "acme/web sbom"]
        );
    }

    #[test]
    fn failures_follow_requested_order() {
        let report = sample();
        let by_operation = report
            .failures(FailureOrder::OperationThenTarget)
            .into_iter()
            .map(|result| result.target.as_str())
            .collect::<Vec<_>>();
        assert_eq!(by_operation, vec!["acme/api", "acme/web"]);

        let mixed = RunReport {
            dry_run: false,
            operations: vec!["b".to_string(), "a".to_string()],
            results: vec![
                result("acme/z", "a", Outcome::Failed),
                result("acme/y", "b", Outcome::Failed),
            ],
        };
        let by_target = mixed
            .failures(FailureOrder::TargetThenOperation)
            .into_iter()
            .map(|result| result.target.as_str())
            .collect::<Vec<_>>();
        assert_eq!(by_target, vec!["acme/y", "acme/z"]);
        let by_operation = mixed
            .failures(FailureOrder::OperationThenTarget)
            .into_iter()
            .map(|result| result.target.as_str())
            .collect::<Vec<_>>();
        assert_eq!(by_operation, vec!["acme/z", "acme/y"]);
    }

    #[test]
    fn summary_keeps_selection_order() {
        let summary = sample().summary_by_operation();
        assert_eq!(
            summary,
            vec![
                OperationSummary {
                    operation: "sbom".to_string(),
                    succeeded: 2,
                    failed: 0
                },
                OperationSummary {
                    operation: "codeql".to_string(),
                    succeeded: 0,
                    failed: 2
                },
            ]
        );
    }

    #[test]
    fn exit_status_follows_policy() {
        let failing = sample();
        assert_eq!(failing.exit_status(ExitPolicy::FailOnAnyFailure), 1);
        assert_eq!(failing.exit_status(ExitPolicy::ReportOnly), 0);

        let soft_only = RunReport {
            dry_run: false,
            operations: vec!["codeql".to_string()],
            results: vec![
                result("acme/api", "codeql", Outcome::Applied),
                result("acme/web", "codeql", Outcome::Skipped),
            ],
        };
        assert_eq!(soft_only.exit_status(ExitPolicy::FailOnAnyFailure), 1);
        assert_eq!(soft_only.exit_status(ExitPolicy::ReportOnly), 0);

        let clean = RunReport {
            dry_run: true,
            operations: vec!["codeql".to_string()],
            results: vec![result("acme/api", "codeql", Outcome::Planned)],
        };
        assert_eq!(clean.exit_status(ExitPolicy::FailOnAnyFailure), 0);
    }

    #[test]
    fn progress_bar_rendering() {
        assert_eq!(render_progress(0, 4, 8), "[░░░░░░░░] 0/4 (0%)");
        assert_eq!(render_progress(1, 4, 8), "[██░░░░░░] 1/4 (25%)");
        assert_eq!(render_progress(4, 4, 8), "[████████] 4/4 (100%)");
        assert_eq!(render_progress(0, 0, 4), "[████] 0/0 (100%)");
    }
}
