//! Interpretation of `gh` error text.
//!
//! `gh api` only exposes the HTTP status through its diagnostic text, so the
//! categories below are matched on substrings, case-insensitively:
//!
//! | text contains          | class                          |
//! |------------------------|--------------------------------|
//! | `already enabled`      | `AlreadyApplied` (success)     |
//! | `already configured`   | `AlreadyApplied` (success)     |
//! | `404`, `403`, `not enabled` | `NotApplicable` (soft failure) |
//! | anything else          | `Error`                        |
//!
//! The "already" rules are checked first.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    AlreadyApplied(&'static str),
    NotApplicable,
    Error,
}

pub const NOT_APPLICABLE_MESSAGE: &str = "Not enabled or no access";

pub fn classify_failure(text: &str) -> FailureClass {
    let lower = text.to_ascii_lowercase();
    if lower.contains("already enabled") {
        return FailureClass::AlreadyApplied("Already enabled");
    }
    if lower.contains("already configured") {
        return FailureClass::AlreadyApplied("Already configured");
    }
    if lower.contains("404") || lower.contains("403") || lower.contains("not enabled") {
        return FailureClass::NotApplicable;
    }
    FailureClass::Error
}
