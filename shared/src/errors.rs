/// Unified error types for Chanrip.
use thiserror::Error;

/// Top-level error type for a channel rip.
#[derive(Debug, Error)]
pub enum RipError {
    #[error("Invalid channel URL {url:?}: must start with {expected_prefix}")]
    InvalidChannelUrl {
        url: String,
        expected_prefix: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dispatched {dispatched} videos but received {received} outcomes")]
    OutcomeMismatch { dispatched: usize, received: usize },
}

/// Errors raised while driving an external listing or acquisition tool.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {message}")]
    Exited {
        program: String,
        status: String,
        message: String,
    },

    #[error("Listing provider returned invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker crashed: {0}")]
    WorkerCrashed(String),
}

impl ProviderError {
    /// Build an exit error from the stderr a tool left behind.
    ///
    /// Prefers the last `ERROR:` line, falling back to the last non-empty line.
    pub fn from_exit(program: &str, status: std::process::ExitStatus, stderr: &str) -> Self {
        let lines: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let message = lines
            .iter()
            .rev()
            .find(|l| l.starts_with("ERROR:"))
            .or_else(|| lines.last())
            .map(|l| l.to_string())
            .unwrap_or_else(|| "no error output".to_string());

        ProviderError::Exited {
            program: program.to_string(),
            status: status.to_string(),
            message,
        }
    }
}

/// Result type alias for Chanrip operations.
pub type RipResult<T> = Result<T, RipError>;
