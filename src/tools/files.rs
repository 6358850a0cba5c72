//! File read/write tools.
//!
//! - `read_file`: reads a file's contents (truncated if large).
//! - `write_file`: writes content to a file after showing a diff and waiting
//!   on the [`ConfirmationGate`].

use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use super::confirmation::ConfirmationGate;
use super::{schema_text, Confirmable, Tool};
use crate::agent::{AgentEvent, EventCallback, FileConfirmation};
use crate::error::ToolError;
use crate::textutil::truncate_with_suffix_by_bytes;

/// Maximum bytes to return when reading a file.
const MAX_READ_LEN: usize = 8000;

// ---------------------------------------------------------------------------
// ReadFile
// ---------------------------------------------------------------------------

/// Tool that reads the contents of a file, such as a request fixture or an
/// OpenAPI document.
#[derive(Debug, Default)]
pub struct ReadFileTool;

#[derive(Deserialize)]
struct ReadArgs {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at the given path."
    }

    fn parameter_schema(&self) -> String {
        schema_text(serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path to the file to read" }
            },
            "required": ["path"]
        }))
    }

    async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
        let args: ReadArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let content = tokio::fs::read_to_string(&args.path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("{}: {e}", args.path)))?;

        Ok(truncate_with_suffix_by_bytes(
            &content,
            MAX_READ_LEN,
            "...[truncated]",
        ))
    }
}

// ---------------------------------------------------------------------------
// WriteFile
// ---------------------------------------------------------------------------

/// Tool that writes content to a file, gated on human approval.
pub struct WriteFileTool {
    gate: Arc<ConfirmationGate>,
    require_confirmation: bool,
    callback: Mutex<Option<EventCallback>>,
}

#[derive(Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
}

impl WriteFileTool {
    pub fn new(gate: Arc<ConfirmationGate>, require_confirmation: bool) -> Self {
        Self {
            gate,
            require_confirmation,
            callback: Mutex::new(None),
        }
    }

    fn current_callback(&self) -> Option<EventCallback> {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Confirmable for WriteFileTool {
    fn set_event_callback(&self, callback: Option<EventCallback>) {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = callback;
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file at the given path. Creates the file if it doesn't exist, overwrites if it does. The user is shown a diff and must approve the write."
    }

    fn parameter_schema(&self) -> String {
        schema_text(serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path to the file to write" },
                "content": { "type": "string", "description": "Content to write to the file" }
            },
            "required": ["path", "content"]
        }))
    }

    async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
        let args: WriteArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let existing = match tokio::fs::read_to_string(&args.path).await {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(ToolError::ExecutionFailed(format!("{}: {e}", args.path))),
        };

        if self.require_confirmation {
            let Some(callback) = self.current_callback() else {
                return Err(ToolError::ExecutionFailed(
                    "write requires confirmation but no confirmation handler is attached"
                        .to_string(),
                ));
            };
            let confirmation = FileConfirmation {
                path: args.path.clone(),
                is_new_file: existing.is_none(),
                diff: unified_diff(&args.path, existing.as_deref(), &args.content),
            };
            let approved = self
                .gate
                .request_confirmation_then(|| {
                    callback(AgentEvent::ConfirmationRequired(confirmation));
                })
                .await;
            if !approved {
                tracing::info!(path = %args.path, "file write rejected");
                return Ok(format!("Write to {} was rejected by the user.", args.path));
            }
        }

        if let Some(parent) = Path::new(&args.path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ToolError::ExecutionFailed(format!("{}: {e}", args.path)))?;
            }
        }
        tokio::fs::write(&args.path, &args.content)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("{}: {e}", args.path)))?;

        Ok(format!(
            "Wrote {} bytes to {}",
            args.content.len(),
            args.path
        ))
    }

    fn as_confirmable(&self) -> Option<&dyn Confirmable> {
        Some(self)
    }
}

/// Unified diff from `old` (absent for a new file) to `new`.
fn unified_diff(path: &str, old: Option<&str>, new: &str) -> String {
    let old_header = match old {
        Some(_) => format!("a/{path}"),
        None => "/dev/null".to_string(),
    };
    similar::TextDiff::from_lines(old.unwrap_or(""), new)
        .unified_diff()
        .context_radius(3)
        .header(&old_header, &format!("b/{path}"))
        .to_string()
}
