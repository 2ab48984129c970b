// HTTP route handlers for the Paiza API bridge

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use paiza_common::types::{ExecutionRequest, Language, TestCase, ValidationError};
use paiza_runner::{run_and_wait, RunnerError, Target};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::AppState;

/// Runner errors mapped onto HTTP status codes
pub struct ApiError(RunnerError);

impl From<RunnerError> for ApiError {
    fn from(err: RunnerError) -> Self {
        ApiError(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RunnerError::Validation(_) => StatusCode::BAD_REQUEST,
            RunnerError::Transport { .. } | RunnerError::Remote { .. } => StatusCode::BAD_GATEWAY,
            RunnerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(error = %self.0, "Request rejected");
        }
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub source_code: String,
    pub language: String,
    #[serde(default)]
    pub stdin: Option<String>,
    #[serde(default)]
    pub max_wait_ms: Option<u64>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub source_code: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct RunAllRequest {
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub id: &'static str,
    pub label: &'static str,
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /languages - Supported runner languages
pub async fn list_languages() -> Json<Vec<LanguageInfo>> {
    Json(
        Language::ALL
            .iter()
            .map(|lang| LanguageInfo {
                id: lang.id(),
                label: lang.label(),
            })
            .collect(),
    )
}

/// POST /run - Run one program and wait for its result
pub async fn run_once(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunRequest>,
) -> Result<Response, ApiError> {
    let language: Language = payload.language.parse()?;
    let request = ExecutionRequest::new(payload.source_code, language, payload.stdin)?;
    let options = state
        .options
        .with_overrides(payload.max_wait_ms, payload.poll_interval_ms);

    let result = run_and_wait(state.api.as_ref(), &request, options).await?;
    info!(run_id = %result.run_id, language = %language, "Run finished");

    Ok((StatusCode::OK, Json(result)).into_response())
}

/// POST /sessions/target - Point the session at a new source snapshot
pub async fn set_target(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TargetRequest>,
) -> Result<StatusCode, ApiError> {
    let language: Language = payload.language.parse()?;
    state
        .session
        .set_target(Target {
            name: payload.name,
            source_code: payload.source_code,
            language,
        })
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /sessions/run-all - Run every test case against the session target
pub async fn run_all(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunAllRequest>,
) -> Result<Response, ApiError> {
    let run = state.session.run_all(&payload.test_cases, None).await?;
    info!(
        generation = run.generation,
        batch_id = %run.report.batch_id,
        current = run.current,
        "Session batch finished"
    );
    Ok((StatusCode::OK, Json(run)).into_response())
}

/// GET /sessions/last - Latest current batch of the session
pub async fn last_run(State(state): State<Arc<AppState>>) -> Response {
    match state.session.last_run().await {
        Some(run) => (StatusCode::OK, Json(run)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "No batch has run yet" })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::{app, AppState};
    use async_trait::async_trait;
    use paiza_common::config::RunOptions;
    use paiza_common::types::{
        ExecutionRequest, ExecutionResult, PhaseOutcome, PhaseResult, RunHandle, RunState,
        RunStatus,
    };
    use paiza_runner::{Result, RunnerApi, RunnerError};
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Echoes stdin back as stdout. Sources named "hang" never complete and
    /// "reject" fails at create.
    #[derive(Default)]
    struct EchoRunner {
        runs: Mutex<HashMap<String, (String, String)>>,
        submits: AtomicUsize,
    }

    #[async_trait]
    impl RunnerApi for EchoRunner {
        async fn submit(&self, request: &ExecutionRequest) -> Result<RunHandle> {
            if request.source_code() == "reject" {
                return Err(RunnerError::remote("create", "Invalid API key"));
            }
            let id = format!("run-{}", self.submits.fetch_add(1, Ordering::SeqCst));
            self.runs.lock().unwrap().insert(
                id.clone(),
                (
                    request.source_code().to_string(),
                    request.stdin().unwrap_or_default().to_string(),
                ),
            );
            Ok(RunHandle::new(id))
        }

        async fn poll(&self, handle: &RunHandle) -> Result<RunStatus> {
            let runs = self.runs.lock().unwrap();
            let state = match runs.get(handle.as_str()) {
                Some((source, _)) if source == "hang" => RunState::Running,
                _ => RunState::Completed,
            };
            Ok(RunStatus { state, error: None })
        }

        async fn fetch_result(&self, handle: &RunHandle) -> Result<ExecutionResult> {
            let runs = self.runs.lock().unwrap();
            let stdin = runs
                .get(handle.as_str())
                .map(|(_, stdin)| stdin.clone())
                .unwrap_or_default();
            Ok(ExecutionResult {
                run_id: handle.clone(),
                build: PhaseResult::default(),
                run: PhaseResult {
                    stdout: stdin,
                    exit_code: Some(0),
                    outcome: Some(PhaseOutcome::Success),
                    ..PhaseResult::default()
                },
            })
        }
    }

    async fn spawn_app() -> String {
        let state = Arc::new(AppState::new(
            Arc::new(EchoRunner::default()),
            RunOptions::from_millis(200, 10),
        ));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_status_and_languages() {
        let base = spawn_app().await;
        let http = reqwest::Client::new();

        let status = http.get(format!("{}/status", base)).send().await.unwrap();
        assert_eq!(status.status(), StatusCode::OK);

        let languages: Vec<Value> = http
            .get(format!("{}/languages", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(languages.len(), 34);
        assert_eq!(languages[0]["id"], "python3");
    }

    #[tokio::test]
    async fn test_run_returns_result() {
        let base = spawn_app().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/run", base))
            .json(&json!({ "source_code": "echo", "language": "python3", "stdin": "hello" }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["run"]["stdout"], "hello");
        assert_eq!(body["run"]["outcome"], "success");
    }

    #[tokio::test]
    async fn test_run_maps_errors_to_status_codes() {
        let base = spawn_app().await;
        let http = reqwest::Client::new();
        let cases = [
            (json!({ "source_code": "  ", "language": "python3" }), 400),
            (json!({ "source_code": "x", "language": "fortran" }), 400),
            (json!({ "source_code": "reject", "language": "python3" }), 502),
            (json!({ "source_code": "hang", "language": "python3" }), 504),
        ];

        for (body, expected) in cases {
            let resp = http
                .post(format!("{}/run", base))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status().as_u16(), expected, "body: {}", body);
            let error: Value = resp.json().await.unwrap();
            assert!(error["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_session_flow() {
        let base = spawn_app().await;
        let http = reqwest::Client::new();

        let resp = http
            .get(format!("{}/sessions/last", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = http
            .post(format!("{}/sessions/run-all", base))
            .json(&json!({ "test_cases": [{ "input": "1", "expected_output": "1" }] }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = http
            .post(format!("{}/sessions/target", base))
            .json(&json!({ "name": "main.py", "source_code": "echo", "language": "python3" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = http
            .post(format!("{}/sessions/run-all", base))
            .json(&json!({ "test_cases": [
                { "input": "1", "expected_output": "1" },
                { "input": "2", "expectedOutput": "3" },
                { "input": "4" }
            ] }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let run: Value = resp.json().await.unwrap();
        assert_eq!(run["generation"], 1);
        assert_eq!(run["current"], true);
        let outcomes = run["report"]["outcomes"].as_array().unwrap();
        assert_eq!(outcomes[0]["verdict"], "AC");
        assert_eq!(outcomes[1]["verdict"], "WA");
        assert!(outcomes[2]["verdict"].is_null());
        assert_eq!(run["report"]["summary"]["accepted"], 1);
        assert_eq!(run["report"]["summary"]["all_passed"], false);

        let last: Value = http
            .get(format!("{}/sessions/last", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(last["generation"], 1);
    }
}
