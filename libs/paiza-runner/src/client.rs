//! Remote Execution Client
//!
//! **Core Responsibility:**
//! Drive one program run on the remote service: submit, poll until the run
//! settles, then fetch the terminal result.
//!
//! **Architectural Boundary:**
//! - The client knows HOW to talk to the runner service
//! - The client does NOT compare outputs or assign verdicts
//! - `RunnerApi` is the seam: the HTTP client in production, scripted fakes in tests
//!
//! **Failure Policy:**
//! No retries. The first transport or service error ends the run and is
//! returned to the caller unchanged.

use crate::error::{Result, RunnerError};
use async_trait::async_trait;
use paiza_common::config::{ClientConfig, RunOptions};
use paiza_common::paiza::{self, DetailsResponse, RunnerResponse};
use paiza_common::types::{ExecutionRequest, ExecutionResult, RunHandle, RunStatus};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// The three remote operations a run is built from
#[async_trait]
pub trait RunnerApi: Send + Sync {
    /// Create a run for `request` and return its handle
    async fn submit(&self, request: &ExecutionRequest) -> Result<RunHandle>;

    /// Current status of a run
    async fn poll(&self, handle: &RunHandle) -> Result<RunStatus>;

    /// Terminal details of a run; only meaningful once it has completed
    async fn fetch_result(&self, handle: &RunHandle) -> Result<ExecutionResult>;
}

/// Polling state machine for a single run.
///
/// Submitted -> Polling -> Completed | TimedOut | Failed
#[derive(Debug)]
enum PollPhase {
    Submitted(RunHandle),
    Polling { handle: RunHandle, polls: u32 },
    Completed(RunHandle),
    TimedOut { polls: u32 },
    Failed(RunnerError),
}

/// Submit `request` and wait for it to finish.
///
/// Polls every `options.poll_interval` until the run completes or
/// `options.max_wait` has elapsed since submission. On completion exactly one
/// details call is made. Each wait suspends for the full interval.
#[instrument(skip(api, request), fields(language = %request.language()))]
pub async fn run_and_wait<A>(
    api: &A,
    request: &ExecutionRequest,
    options: RunOptions,
) -> Result<ExecutionResult>
where
    A: RunnerApi + ?Sized,
{
    let handle = api.submit(request).await?;
    let deadline = Instant::now() + options.max_wait;
    debug!(run_id = %handle, "Run submitted");

    let mut phase = PollPhase::Submitted(handle);
    loop {
        phase = match phase {
            PollPhase::Submitted(handle) => PollPhase::Polling { handle, polls: 0 },

            PollPhase::Polling { handle, polls } => {
                if Instant::now() >= deadline {
                    PollPhase::TimedOut { polls }
                } else {
                    match api.poll(&handle).await {
                        Ok(RunStatus { error: Some(message), .. }) => {
                            PollPhase::Failed(RunnerError::remote("status check", message))
                        }
                        Ok(status) if status.is_completed() => PollPhase::Completed(handle),
                        Ok(_) => {
                            tokio::time::sleep(options.poll_interval).await;
                            PollPhase::Polling {
                                handle,
                                polls: polls + 1,
                            }
                        }
                        Err(e) => PollPhase::Failed(e),
                    }
                }
            }

            PollPhase::Completed(handle) => {
                debug!(run_id = %handle, "Run completed, fetching details");
                return api.fetch_result(&handle).await;
            }

            PollPhase::TimedOut { polls } => {
                warn!(
                    polls,
                    max_wait_ms = options.max_wait.as_millis() as u64,
                    "Run did not complete before deadline"
                );
                return Err(RunnerError::Timeout {
                    waited: options.max_wait,
                    polls,
                });
            }

            PollPhase::Failed(err) => return Err(err),
        };
    }
}

/// HTTP client for the public runner API
#[derive(Debug, Clone)]
pub struct PaizaClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl PaizaClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("paiza-runner/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Default run timing from the client configuration
    pub fn run_options(&self) -> RunOptions {
        self.config.run
    }

    fn url(&self, path: &str) -> String {
        paiza::endpoint(&self.config.api_base, path)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(RunnerError::transport(
                Some(status.as_u16()),
                format!(
                    "{} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
                .trim_end()
                .to_string(),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            RunnerError::transport(Some(status.as_u16()), format!("invalid response body: {}", e))
        })
    }
}

#[async_trait]
impl RunnerApi for PaizaClient {
    async fn submit(&self, request: &ExecutionRequest) -> Result<RunHandle> {
        let response = self
            .http
            .post(self.url(paiza::CREATE_PATH))
            .form(&paiza::create_form(&self.config.api_key, request))
            .send()
            .await?;
        let body: RunnerResponse = Self::read_json(response).await?;

        if let Some(message) = body.remote_error() {
            return Err(RunnerError::remote("create", message));
        }
        if body.id.is_empty() {
            return Err(RunnerError::remote("create", "response carried no run id"));
        }
        Ok(RunHandle::new(body.id))
    }

    async fn poll(&self, handle: &RunHandle) -> Result<RunStatus> {
        let response = self
            .http
            .get(self.url(paiza::STATUS_PATH))
            .query(&paiza::handle_query(&self.config.api_key, handle))
            .send()
            .await?;
        let body: RunnerResponse = Self::read_json(response).await?;

        if let Some(message) = body.remote_error() {
            return Err(RunnerError::remote("status check", message));
        }
        Ok(body.into_status())
    }

    async fn fetch_result(&self, handle: &RunHandle) -> Result<ExecutionResult> {
        let response = self
            .http
            .get(self.url(paiza::DETAILS_PATH))
            .query(&paiza::handle_query(&self.config.api_key, handle))
            .send()
            .await?;
        let body: DetailsResponse = Self::read_json(response).await?;

        if let Some(message) = body.remote_error() {
            return Err(RunnerError::remote("details", message));
        }
        Ok(body.into_result(handle))
    }
}
