//! Retry wrapper around another registered tool.
//!
//! Useful for polling an endpoint until it reports ready, or riding out a
//! flaky dependency. Backoff doubles after each failed attempt.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{schema_text, Tool, ToolExecutor};
use crate::error::ToolError;

const RETRY_TOOL_NAME: &str = "retry_request";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const MAX_ATTEMPTS_CAP: u32 = 10;
const DEFAULT_INITIAL_DELAY_MS: u64 = 500;
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Tool that re-runs another tool until it succeeds.
pub struct RetryTool {
    executor: ToolExecutor,
}

#[derive(Deserialize)]
struct Args {
    tool: String,
    /// Arguments for the wrapped tool: a JSON object or a raw string.
    #[serde(default)]
    args: Value,
    max_attempts: Option<u32>,
    initial_delay_ms: Option<u64>,
    /// Output substrings that count as failure even on success, such as
    /// `"Status: 503"`.
    #[serde(default)]
    retry_on: Vec<String>,
}

impl RetryTool {
    pub fn new(executor: ToolExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for RetryTool {
    fn name(&self) -> &str {
        RETRY_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Run another tool repeatedly with exponential backoff until it succeeds or attempts run out."
    }

    fn parameter_schema(&self) -> String {
        schema_text(serde_json::json!({
            "type": "object",
            "properties": {
                "tool": { "type": "string", "description": "Name of the tool to run" },
                "args": { "description": "Arguments for that tool" },
                "max_attempts": { "type": "integer", "description": "Default 3, at most 10" },
                "initial_delay_ms": { "type": "integer", "description": "Delay before the second attempt, default 500" },
                "retry_on": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Output substrings that should trigger another attempt"
                }
            },
            "required": ["tool"]
        }))
    }

    async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
        let args: Args = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if args.tool == RETRY_TOOL_NAME {
            return Err(ToolError::InvalidArguments(
                "retry_request cannot retry itself".to_string(),
            ));
        }

        let inner_args = match &args.args {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let max_attempts = args
            .max_attempts
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
            .clamp(1, MAX_ATTEMPTS_CAP);
        let mut delay = Duration::from_millis(
            args.initial_delay_ms.unwrap_or(DEFAULT_INITIAL_DELAY_MS),
        )
        .min(MAX_DELAY);

        let mut last_failure = String::new();
        for attempt in 1..=max_attempts {
            match self.executor.execute(&args.tool, &inner_args).await {
                Ok(output) => match args.retry_on.iter().find(|p| output.contains(p.as_str())) {
                    None => {
                        return Ok(format!(
                            "Succeeded on attempt {attempt}/{max_attempts}.\n{output}"
                        ))
                    }
                    Some(pattern) => {
                        last_failure = format!("output matched `{pattern}`:\n{output}");
                    }
                },
                Err(ToolError::UnknownTool(name)) => return Err(ToolError::UnknownTool(name)),
                Err(e) => last_failure = e.to_string(),
            }
            tracing::debug!(tool = %args.tool, attempt, max_attempts, "retry attempt failed");
            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }

        Ok(format!(
            "All {max_attempts} attempts of {} failed. Last failure: {last_failure}",
            args.tool
        ))
    }
}
