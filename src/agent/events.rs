//! Agent progress events.
//!
//! Events are handed to an [`EventCallback`] on the worker that runs the turn.
//! Receivers living on a UI thread must enqueue them (for example into a
//! channel) and return quickly instead of touching UI state from inside the
//! callback.

use std::sync::Arc;

/// Pending file write awaiting human approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfirmation {
    pub path: String,
    pub is_new_file: bool,
    /// Unified diff from the current contents to the proposed contents.
    pub diff: String,
}

/// Call counters reported after each dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolUsage {
    pub count: u32,
    pub limit: u32,
    pub total: u32,
    pub total_limit: u32,
}

/// One step of progress within a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// About to call the model, or the model's parsed reasoning.
    Thinking(String),
    /// A tool is about to run.
    ToolCall { name: String, args: String },
    /// Text fed back to the model after a dispatch attempt.
    Observation(String),
    /// Terminal answer for the turn.
    Answer(String),
    /// Terminal failure for the turn.
    Error(String),
    /// Incremental model output.
    Streaming(String),
    /// Counters after a successful dispatch.
    ToolUsage { name: String, usage: ToolUsage },
    /// A tool is blocked on the confirmation gate.
    ConfirmationRequired(FileConfirmation),
}

impl AgentEvent {
    /// Short tag used for logs and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Thinking(_) => "thinking",
            Self::ToolCall { .. } => "tool_call",
            Self::Observation(_) => "observation",
            Self::Answer(_) => "answer",
            Self::Error(_) => "error",
            Self::Streaming(_) => "streaming",
            Self::ToolUsage { .. } => "tool_usage",
            Self::ConfirmationRequired(_) => "confirmation_required",
        }
    }
}

/// Observer invoked from the worker for every event.
pub type EventCallback = Arc<dyn Fn(AgentEvent) + Send + Sync>;
