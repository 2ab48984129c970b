//! Verdict Engine - Language-Agnostic Judging
//!
//! **Core Responsibility:**
//! Compare one completed run against an optional expected output and
//! classify it.
//!
//! **Critical Properties:**
//! - Knows nothing about HTTP or polling
//! - Knows nothing about language runtimes
//! - Pure function: (execution result, expected output) → verdict
//!
//! **Verdict Rules (first match wins):**
//! 1. No expected output, or only whitespace → no verdict
//! 2. Build failed → CE, whatever the run phase reports
//! 3. Run succeeded → AC if outputs match, WA otherwise
//! 4. Run hit the service time limit → TLE
//! 5. Anything else → RE
//!
//! **Normalization Rules:**
//! - Trim leading and trailing whitespace: YES
//! - Ignore trailing newline differences: YES (via trim)
//! - Case sensitivity: YES (exact match required)
//! - Internal whitespace: preserved

use paiza_common::types::{ExecutionResult, PhaseOutcome, Summary, TestCaseOutcome, Verdict};

/// Normalize output string for comparison
pub fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Derive the verdict for one run.
///
/// Returns `None` when there is nothing to compare against.
pub fn derive_verdict(result: &ExecutionResult, expected_output: Option<&str>) -> Option<Verdict> {
    let expected = normalize_output(expected_output?);
    if expected.is_empty() {
        return None;
    }

    let verdict = if result.build.outcome == Some(PhaseOutcome::Failure) {
        Verdict::CompileError
    } else if result.run.outcome == Some(PhaseOutcome::Success) {
        if normalize_output(result.stdout()) == expected {
            Verdict::Accepted
        } else {
            Verdict::WrongAnswer
        }
    } else if result.run.outcome == Some(PhaseOutcome::Timeout) {
        Verdict::TimeLimitExceeded
    } else {
        Verdict::RuntimeError
    };

    Some(verdict)
}

/// Aggregate a finished batch.
///
/// `all_passed` holds only when every outcome is exactly AC; a test case
/// without an expected output therefore never counts as passed.
/// An empty batch has no summary.
pub fn summarize(outcomes: &[TestCaseOutcome]) -> Option<Summary> {
    if outcomes.is_empty() {
        return None;
    }

    let accepted = outcomes
        .iter()
        .filter(|o| o.verdict == Some(Verdict::Accepted))
        .count();
    let total = outcomes.len();

    Some(Summary {
        accepted,
        total,
        all_passed: accepted == total,
    })
}
