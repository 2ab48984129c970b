//! Batch Executor - High-Level Orchestration
//!
//! **Responsibility:**
//! Run one program against many test cases and produce a judged report.
//!
//! **Architecture:**
//! 1. Validate the source once and take an immutable snapshot of it
//! 2. Fan out one `run_and_wait` per test case (client.rs)
//! 3. Judge each finished run with the verdict engine (evaluator.rs)
//! 4. Fan in: wait for every case, then summarize
//!
//! All cases are futures joined on the caller's task, so there is no
//! parallelism and no shared mutable state between cases. A failing case
//! becomes an `error` outcome for its own index and never affects siblings.

use crate::client::{run_and_wait, RunnerApi};
use crate::error::Result;
use crate::evaluator::{derive_verdict, summarize};
use chrono::Utc;
use futures_util::future::join_all;
use paiza_common::config::RunOptions;
use paiza_common::types::{
    BatchReport, ExecutionRequest, Language, LifecycleEvent, LifecycleState, TestCase,
    TestCaseOutcome,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Receiver side of lifecycle notifications for a host UI
pub type EventSink = UnboundedSender<LifecycleEvent>;

fn emit(events: Option<&EventSink>, batch_id: Uuid, index: usize, state: LifecycleState) {
    if let Some(sink) = events {
        // A host that stopped listening does not affect the batch
        let _ = sink.send(LifecycleEvent {
            batch_id,
            index,
            state,
        });
    }
}

/// Execute every test case concurrently and wait for all of them.
///
/// Fails only with a validation error (blank source), in which case nothing
/// is sent to the remote service. Per-case remote failures are recorded in
/// the corresponding outcome.
#[instrument(
    skip(api, source_code, test_cases, events),
    fields(language = %language, test_cases = test_cases.len())
)]
pub async fn run_all<A>(
    api: &A,
    source_code: &str,
    language: Language,
    test_cases: &[TestCase],
    options: RunOptions,
    events: Option<&EventSink>,
) -> Result<BatchReport>
where
    A: RunnerApi + ?Sized,
{
    let snapshot = ExecutionRequest::new(Arc::<str>::from(source_code), language, None)?;
    run_snapshot(api, &snapshot, test_cases, options, events).await
}

/// Same as [`run_all`] for a request that has already been validated.
/// The request's own stdin is ignored; each case supplies its input.
pub async fn run_snapshot<A>(
    api: &A,
    snapshot: &ExecutionRequest,
    test_cases: &[TestCase],
    options: RunOptions,
    events: Option<&EventSink>,
) -> Result<BatchReport>
where
    A: RunnerApi + ?Sized,
{
    let batch_id = Uuid::new_v4();
    let started_at = Utc::now();

    info!(
        batch_id = %batch_id,
        language = %snapshot.language(),
        test_cases = test_cases.len(),
        source_size = snapshot.source_code().len(),
        "Starting batch"
    );

    let outcomes = join_all(test_cases.iter().enumerate().map(|(index, test_case)| {
        run_case(api, batch_id, index, test_case, snapshot, options, events)
    }))
    .await;

    let summary = summarize(&outcomes);
    match &summary {
        Some(s) => info!(
            batch_id = %batch_id,
            accepted = s.accepted,
            total = s.total,
            all_passed = s.all_passed,
            "Batch complete"
        ),
        None => info!(batch_id = %batch_id, "Batch complete with no test cases"),
    }

    Ok(BatchReport {
        batch_id,
        language: snapshot.language(),
        started_at,
        finished_at: Utc::now(),
        outcomes,
        summary,
    })
}

/// Drive one test case from launch to its terminal state
async fn run_case<A>(
    api: &A,
    batch_id: Uuid,
    index: usize,
    test_case: &TestCase,
    snapshot: &ExecutionRequest,
    options: RunOptions,
    events: Option<&EventSink>,
) -> TestCaseOutcome
where
    A: RunnerApi + ?Sized,
{
    let mut outcome = TestCaseOutcome::pending(index, test_case);
    outcome.start();
    emit(events, batch_id, index, outcome.state);
    debug!(batch_id = %batch_id, index, "Test case running");

    let request = snapshot.with_stdin(test_case.input.as_str());
    match run_and_wait(api, &request, options).await {
        Ok(result) => {
            let verdict = derive_verdict(&result, test_case.expected_output.as_deref());
            debug!(
                batch_id = %batch_id,
                index,
                run_id = %result.run_id,
                verdict = ?verdict,
                "Test case completed"
            );
            outcome.complete(result, verdict);
        }
        Err(e) => {
            warn!(batch_id = %batch_id, index, error = %e, "Test case failed");
            outcome.fail(e.to_string());
        }
    }

    emit(events, batch_id, index, outcome.state);
    outcome
}
