//! Configuration data model.
//!
//! Every section deserializes with `#[serde(default)]`, so a partial (or
//! empty) file yields built-in defaults for whatever it leaves out.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::defaults::{
    DEFAULT_API_BASE_URL, DEFAULT_API_MAX_RETRIES, DEFAULT_API_TIMEOUT_SECS,
    DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_HISTORY,
    DEFAULT_MODEL_ID,
};
use crate::tools::accounting::{CallLimits, DEFAULT_TOOL_CALL_LIMIT, DEFAULT_TOTAL_CALL_LIMIT};

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub agent: AgentConfig,
    pub limits: LimitsConfig,
    pub confirmation: ConfirmationConfig,
    pub tools: ToolsConfig,
    pub display: DisplayConfig,
}

/// API connection settings used by the HTTP model client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    /// Name of an environment variable holding the key, used when `api_key`
    /// is empty.
    pub api_key_env: Option<String>,
    pub model: String,
    pub temperature: Option<f64>,
    pub timeout_secs: u64,
    /// Extra attempts for a model request that fails transiently.
    pub max_retries: u32,
    /// Stream model output token by token.
    pub streaming: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            api_key: String::new(),
            api_key_env: None,
            model: DEFAULT_MODEL_ID.into(),
            temperature: None,
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            max_retries: DEFAULT_API_MAX_RETRIES,
            streaming: true,
        }
    }
}

/// Agent behavior settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Extra instructions appended to the system prompt.
    pub instructions: Option<String>,
    /// Maximum retained history messages; 0 keeps everything.
    pub max_history: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instructions: None,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Tool call limits applied per user turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub default_tool_limit: u32,
    pub total_limit: u32,
    /// Per-tool overrides keyed by tool name (`[limits.tools]`).
    pub tools: HashMap<String, u32>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_tool_limit: DEFAULT_TOOL_CALL_LIMIT,
            total_limit: DEFAULT_TOTAL_CALL_LIMIT,
            tools: HashMap::new(),
        }
    }
}

impl LimitsConfig {
    pub fn call_limits(&self) -> CallLimits {
        CallLimits {
            default_tool_limit: self.default_tool_limit,
            total_limit: self.total_limit,
            overrides: self.tools.clone(),
        }
    }
}

/// Human approval settings for destructive tools.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    pub timeout_secs: u64,
    /// Require approval before `write_file` touches disk.
    pub confirm_writes: bool,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            confirm_writes: true,
        }
    }
}

impl ConfirmationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which built-in tools are registered.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub http_enabled: bool,
    pub files_enabled: bool,
    pub retry_enabled: bool,
    pub http_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            http_enabled: true,
            files_enabled: true,
            retry_enabled: true,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Terminal output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: bool,
    pub show_tool_calls: bool,
    pub show_streaming: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_tool_calls: true,
            show_streaming: true,
        }
    }
}
