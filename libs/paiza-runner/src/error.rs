use paiza_common::types::ValidationError;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, RunnerError>;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Bad input at the batch or request boundary; nothing was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Non-success HTTP response, unreachable service or unreadable body
    #[error("API error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Error reported by the service inside a successful response
    #[error("{operation} failed: {message}")]
    Remote {
        operation: &'static str,
        message: String,
    },

    #[error("execution timed out after {}ms ({polls} status checks)", .waited.as_millis())]
    Timeout { waited: Duration, polls: u32 },
}

impl RunnerError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        RunnerError::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn remote(operation: &'static str, message: impl Into<String>) -> Self {
        RunnerError::Remote {
            operation,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RunnerError {
    fn from(err: reqwest::Error) -> Self {
        RunnerError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
