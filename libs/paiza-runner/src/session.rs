// Host-owned test session: the current target file and the latest batch report.
// One session per logical host window; hosts pass it around by reference.

use crate::client::{run_and_wait, RunnerApi};
use crate::error::Result;
use crate::executor::{self, EventSink};
use paiza_common::config::RunOptions;
use paiza_common::types::{
    BatchReport, ExecutionRequest, ExecutionResult, Language, TestCase, ValidationError,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// File the session is currently pointed at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: Option<String>,
    pub source_code: String,
    pub language: Language,
}

/// Report of one `run_all`, tagged with the batch generation that produced it
#[derive(Debug, Clone, Serialize)]
pub struct SessionRun {
    pub generation: u64,
    /// False when a newer batch was started before this one finished
    pub current: bool,
    pub report: BatchReport,
}

pub struct TestSession {
    api: Arc<dyn RunnerApi>,
    options: RunOptions,
    target: RwLock<Option<Target>>,
    generation: AtomicU64,
    last_run: Mutex<Option<SessionRun>>,
}

impl TestSession {
    pub fn new(api: Arc<dyn RunnerApi>, options: RunOptions) -> Self {
        Self {
            api,
            options,
            target: RwLock::new(None),
            generation: AtomicU64::new(0),
            last_run: Mutex::new(None),
        }
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Point the session at a new document snapshot
    pub async fn set_target(&self, target: Target) {
        info!(
            name = target.name.as_deref().unwrap_or("<unnamed>"),
            language = %target.language,
            "Session target updated"
        );
        *self.target.write().await = Some(target);
    }

    pub async fn target(&self) -> Option<Target> {
        self.target.read().await.clone()
    }

    /// Take an immutable snapshot of the current target
    async fn snapshot(&self) -> Result<ExecutionRequest> {
        let guard = self.target.read().await;
        let target = guard.as_ref().ok_or(ValidationError::NoTarget)?;
        Ok(ExecutionRequest::new(
            target.source_code.as_str(),
            target.language,
            None,
        )?)
    }

    /// Run the target once with `stdin`
    pub async fn run(&self, stdin: Option<String>, options: RunOptions) -> Result<ExecutionResult> {
        let snapshot = self.snapshot().await?;
        let request = match stdin {
            Some(input) => snapshot.with_stdin(input),
            None => snapshot,
        };
        run_and_wait(self.api.as_ref(), &request, options).await
    }

    /// Run every test case against the current target.
    ///
    /// The target is read once up front, so later `set_target` calls do not
    /// affect the batch. If another batch starts meanwhile, this one still runs
    /// to completion but its report is returned as not current and is not
    /// stored as the session's last run.
    pub async fn run_all(
        &self,
        test_cases: &[TestCase],
        events: Option<&EventSink>,
    ) -> Result<SessionRun> {
        let snapshot = self.snapshot().await?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Session batch started");

        let report = executor::run_snapshot(
            self.api.as_ref(),
            &snapshot,
            test_cases,
            self.options,
            events,
        )
        .await?;

        let current = self.generation.load(Ordering::SeqCst) == generation;
        let run = SessionRun {
            generation,
            current,
            report,
        };

        if current {
            *self.last_run.lock().await = Some(run.clone());
        } else {
            info!(
                generation,
                batch_id = %run.report.batch_id,
                "Superseded batch finished, result ignored"
            );
        }
        Ok(run)
    }

    pub async fn last_run(&self) -> Option<SessionRun> {
        self.last_run.lock().await.clone()
    }
}
