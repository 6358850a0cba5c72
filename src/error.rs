//! Unified error types for the agent.
//!
//! Only [`AgentError`] ever escapes a turn. Tool failures, unknown tools and
//! limit hits are folded back into the conversation as observations.

// ---------------------------------------------------------------------------
// ToolError
// ---------------------------------------------------------------------------

/// Errors arising from tool execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The model supplied arguments the tool couldn't parse.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// The tool ran but encountered a failure.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// No tool with this name is registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from the model HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network / reqwest-level error.
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx status from the API.
    #[error("status {code}: {body}")]
    Status { code: u16, body: String },
    /// The provider answered with something we could not decode.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status code when this error came from a non-2xx response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::Http(err) => err.status().map(|status| status.as_u16()),
            Self::InvalidResponse(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AgentError
// ---------------------------------------------------------------------------

/// Hard failures that terminate a turn.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The model call failed at the transport level.
    #[error("api: {0}")]
    Api(#[from] ApiError),
    /// The caller cancelled the turn.
    #[error("operation cancelled by user")]
    Cancelled,
}
