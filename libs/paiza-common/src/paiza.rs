use crate::types::{
    ExecutionRequest, ExecutionResult, PhaseOutcome, PhaseResult, RunHandle, RunState, RunStatus,
};
use serde::{Deserialize, Deserializer};

// Remote runner wire format - endpoints and response shapes only.
// Keeps the client and any fake of the service in agreement on paths and fields.

pub const DEFAULT_API_BASE: &str = "https://api.paiza.io";
pub const DEFAULT_API_KEY: &str = "guest";

pub const CREATE_PATH: &str = "/runners/create.json";
pub const STATUS_PATH: &str = "/runners/get_status.json";
pub const DETAILS_PATH: &str = "/runners/get_details.json";

/// Join the API base and an endpoint path without doubling slashes
pub fn endpoint(api_base: &str, path: &str) -> String {
    format!("{}{}", api_base.trim_end_matches('/'), path)
}

/// Form fields for `POST /runners/create.json`.
/// `input` is only sent when there is something to feed the program.
pub fn create_form(api_key: &str, request: &ExecutionRequest) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("api_key", api_key.to_string()),
        ("source_code", request.source_code().to_string()),
        ("language", request.language().id().to_string()),
    ];
    if let Some(input) = request.stdin().filter(|s| !s.is_empty()) {
        form.push(("input", input.to_string()));
    }
    form
}

/// Query string for the status and details endpoints
pub fn handle_query<'a>(api_key: &'a str, handle: &'a RunHandle) -> [(&'static str, &'a str); 2] {
    [("api_key", api_key), ("id", handle.as_str())]
}

/// Body returned by both `create.json` and `get_status.json`
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerResponse {
    #[serde(default)]
    pub id: String,
    pub status: Option<RunState>,
    pub error: Option<String>,
}

impl RunnerResponse {
    /// Service-reported logical error, if any
    pub fn remote_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn into_status(self) -> RunStatus {
        RunStatus {
            state: self.status.unwrap_or(RunState::Running),
            error: self.error.filter(|e| !e.trim().is_empty()),
        }
    }
}

/// Body returned by `get_details.json`
#[derive(Debug, Clone, Deserialize)]
pub struct DetailsResponse {
    #[serde(default)]
    pub id: String,
    pub error: Option<String>,
    #[serde(default)]
    pub build_stdout: Option<String>,
    #[serde(default)]
    pub build_stderr: Option<String>,
    #[serde(default)]
    pub build_exit_code: Option<i32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub build_time: Option<f64>,
    #[serde(default)]
    pub build_memory: Option<u64>,
    #[serde(default)]
    pub build_result: Option<PhaseOutcome>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub time: Option<f64>,
    #[serde(default)]
    pub memory: Option<u64>,
    #[serde(default)]
    pub result: Option<PhaseOutcome>,
}

impl DetailsResponse {
    pub fn remote_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }

    /// Convert the wire shape into the domain result.
    /// Falls back to `handle` when the body omits its own id.
    pub fn into_result(self, handle: &RunHandle) -> ExecutionResult {
        let run_id = if self.id.is_empty() {
            handle.clone()
        } else {
            RunHandle::new(self.id)
        };

        ExecutionResult {
            run_id,
            build: PhaseResult {
                stdout: self.build_stdout.unwrap_or_default(),
                stderr: self.build_stderr.unwrap_or_default(),
                exit_code: self.build_exit_code,
                time_secs: self.build_time,
                memory_bytes: self.build_memory,
                outcome: self.build_result,
            },
            run: PhaseResult {
                stdout: self.stdout.unwrap_or_default(),
                stderr: self.stderr.unwrap_or_default(),
                exit_code: self.exit_code,
                time_secs: self.time,
                memory_bytes: self.memory,
                outcome: self.result,
            },
        }
    }
}

/// The service reports elapsed time as either a JSON number or a numeric string
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
