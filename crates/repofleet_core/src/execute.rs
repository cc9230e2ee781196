use tracing::{debug, warn};

use crate::gh::{GhApi, Invocation};
use crate::outcome::{OperationResult, Outcome};

/// Run one invocation for one target and turn whatever happens into a result.
pub fn execute<A: GhApi + ?Sized>(
    api: &A,
    target: &str,
    operation: &str,
    invocation: &Invocation,
    dry_run: bool,
    success_message: &str,
) -> OperationResult {
    if dry_run {
        return OperationResult::new(
            target,
            operation,
            Outcome::Planned,
            format!("DRY RUN: {}", invocation.command_line()),
        );
    }

    debug!(repo = %target, operation = %operation, "executing");
    let result = match api.run(invocation) {
        Ok(output) if output.success() => {
            OperationResult::new(target, operation, Outcome::Applied, success_message)
        }
        Ok(output) => OperationResult::from_failure(target, operation, &output.error_text()),
        Err(error) => {
            OperationResult::new(target, operation, Outcome::Failed, format!("{error:#}"))
        }
    };
    if result.outcome == Outcome::Failed {
        warn!(
            repo = %target,
            operation = %operation,
            error = %result.message,
            "operation failed"
        );
    }
    result
}
