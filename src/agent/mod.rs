//! Core ReAct loop.
//!
//! The [`Agent`] drives one user turn: it prompts the model, parses the reply
//! into a thought, a tool call or a final answer, dispatches tool calls
//! through the call accountant, and feeds each observation back until the
//! model answers, the turn's call budget runs out, the caller cancels, or the
//! model call fails.
//!
//! All methods take `&self`. One worker task runs a turn while the UI holds
//! the same `Arc<Agent>` to reconfigure limits, read counters or answer a
//! confirmation.

use crate::api::LlmClient;
use crate::config::Config;
use crate::error::{AgentError, ApiError, ToolError};
use crate::prompt::{render_system_prompt, SystemPromptParams};
use crate::tools::accounting::{CallAccountant, UsageSnapshot};
use crate::tools::confirmation::ConfirmationGate;
use crate::tools::ToolRegistry;
use crate::types::Message;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

mod events;
mod history;
pub mod parser;

pub use events::{AgentEvent, EventCallback, FileConfirmation, ToolUsage};
pub use history::History;
use parser::parse_response;

/// Final answer used when the model returns nothing at all.
const EMPTY_REPLY_ANSWER: &str =
    "The model returned an empty response. Try rephrasing the request or asking again.";
/// Progress text emitted before every model call.
const THINKING_TEXT: &str = "Thinking...";

/// The core agent that orchestrates the conversation and tool-use loop.
pub struct Agent {
    /// Model client implementation (HTTP client in prod, scripted in tests).
    client: Arc<dyn LlmClient>,
    /// Registered tools; shared with tools that re-enter execution.
    tools: Arc<ToolRegistry>,
    accountant: Arc<CallAccountant>,
    history: History,
    gate: Arc<ConfirmationGate>,
    custom_instructions: Mutex<Option<String>>,
    /// Use the client's streaming path for the event-emitting entry point.
    streaming: AtomicBool,
}

impl Agent {
    /// Build an agent with default limits, unlimited history and a
    /// five-minute confirmation timeout.
    pub fn new(client: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            client,
            tools,
            accountant: Arc::new(CallAccountant::default()),
            history: History::new(0),
            gate: Arc::new(ConfirmationGate::default()),
            custom_instructions: Mutex::new(None),
            streaming: AtomicBool::new(true),
        }
    }

    /// Apply the agent-facing parts of a loaded configuration.
    pub fn apply_config(&self, config: &Config) {
        let limits = &config.limits;
        self.set_default_tool_limit(limits.default_tool_limit);
        self.set_total_limit(limits.total_limit);
        self.set_tool_limits(limits.tools.clone());
        self.set_max_history(config.agent.max_history);
        self.set_confirmation_timeout(config.confirmation.timeout());
        self.set_custom_instructions(config.agent.instructions.clone());
        self.set_streaming(config.api.streaming);
    }

    // -- configuration surface ------------------------------------------------

    pub fn set_default_tool_limit(&self, limit: u32) {
        self.accountant.set_default_tool_limit(limit);
    }

    pub fn set_total_limit(&self, limit: u32) {
        self.accountant.set_total_limit(limit);
    }

    pub fn set_tool_limit(&self, tool: &str, limit: u32) {
        self.accountant.set_tool_limit(tool, limit);
    }

    /// Replace every per-tool override.
    pub fn set_tool_limits(&self, overrides: HashMap<String, u32>) {
        self.accountant.set_tool_limits(overrides);
    }

    /// Cap retained history; 0 keeps everything. Applies immediately.
    pub fn set_max_history(&self, max_len: usize) {
        self.history.set_max_len(max_len);
    }

    pub fn set_confirmation_timeout(&self, timeout: Duration) {
        self.gate.set_timeout(timeout);
    }

    pub fn set_custom_instructions(&self, instructions: Option<String>) {
        *self
            .custom_instructions
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = instructions;
    }

    pub fn set_streaming(&self, enabled: bool) {
        self.streaming.store(enabled, Ordering::Relaxed);
    }

    // -- accessors --------------------------------------------------------------

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Gate shared with confirmable tools and answered by the UI.
    pub fn confirmation_gate(&self) -> &Arc<ConfirmationGate> {
        &self.gate
    }

    /// Counters for the current (or most recent) turn.
    pub fn usage(&self) -> UsageSnapshot {
        self.accountant.snapshot()
    }

    pub fn history(&self) -> Vec<Message> {
        self.history.snapshot()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    // -- entry points -----------------------------------------------------------

    /// Run one turn without emitting events and return the final text.
    ///
    /// Confirmable tools get no event callback on this path, so a write that
    /// requires approval is refused.
    pub async fn process_message(&self, input: &str) -> Result<String, AgentError> {
        self.run_turn(input, None, None).await
    }

    /// Run one turn, reporting progress through `on_event`.
    ///
    /// `cancel` is checked at the top of every iteration; sending `true`
    /// ends the turn with [`AgentError::Cancelled`] once the current model
    /// call or tool finishes.
    pub async fn process_message_with_events(
        &self,
        input: &str,
        cancel: watch::Receiver<bool>,
        on_event: EventCallback,
    ) -> Result<String, AgentError> {
        self.run_turn(input, Some(&cancel), Some(&on_event)).await
    }

    /// Execute a tool directly, outside any turn's accounting.
    pub async fn execute_tool(&self, name: &str, arguments: &str) -> Result<String, ToolError> {
        self.tools.execute(name, arguments).await
    }

    // -- loop ---------------------------------------------------------------------

    async fn run_turn(
        &self,
        input: &str,
        cancel: Option<&watch::Receiver<bool>>,
        on_event: Option<&EventCallback>,
    ) -> Result<String, AgentError> {
        let emit = |event: AgentEvent| {
            if let Some(callback) = on_event {
                callback(event);
            }
        };

        self.accountant.reset();
        self.history.push(Message::user(input));

        let mut iteration: u32 = 0;
        loop {
            iteration = iteration.saturating_add(1);

            if cancel.is_some_and(|rx| *rx.borrow()) {
                tracing::info!(iteration, "turn cancelled");
                return Err(AgentError::Cancelled);
            }

            if self.accountant.is_total_limit_reached() {
                let answer =
                    total_limit_message(self.accountant.total(), self.accountant.total_limit());
                tracing::info!(iteration, "total tool call limit reached; ending turn");
                emit(AgentEvent::Answer(answer.clone()));
                return Ok(answer);
            }

            tracing::debug!(iteration, history = self.history.len(), "calling model");
            emit(AgentEvent::Thinking(THINKING_TEXT.to_string()));
            let messages = self.compose_messages();
            let reply = match self.call_model(&messages, on_event).await {
                Ok(reply) => reply,
                Err(err) => {
                    tracing::warn!(iteration, error = %err, "model call failed");
                    emit(AgentEvent::Error(err.to_string()));
                    return Err(err.into());
                }
            };

            if reply.trim().is_empty() {
                tracing::warn!(iteration, "model returned an empty reply");
                let answer = EMPTY_REPLY_ANSWER.to_string();
                self.history.push(Message::assistant(answer.clone()));
                emit(AgentEvent::Answer(answer.clone()));
                return Ok(answer);
            }

            let parsed = parse_response(&reply, &self.tools.names());
            if !parsed.thought.is_empty() {
                emit(AgentEvent::Thinking(parsed.thought.clone()));
            }

            if !parsed.is_tool_call() {
                let answer = if parsed.final_answer.trim().is_empty() {
                    reply.trim().to_string()
                } else {
                    parsed.final_answer
                };
                self.history.push(Message::assistant(reply));
                emit(AgentEvent::Answer(answer.clone()));
                return Ok(answer);
            }

            let observation = self
                .dispatch(&parsed.tool_name, &parsed.tool_args, on_event)
                .await;
            emit(AgentEvent::Observation(observation.clone()));
            self.history.push_pair(
                Message::assistant(reply),
                Message::user(format!("Observation: {observation}")),
            );
        }
    }

    /// System prompt followed by the full history.
    fn compose_messages(&self) -> Vec<Message> {
        let specs = self.tools.specs();
        let instructions = self
            .custom_instructions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let system = render_system_prompt(SystemPromptParams {
            tools: &specs,
            custom_instructions: instructions.as_deref(),
        });

        let history = self.history.snapshot();
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(system));
        messages.extend(history);
        messages
    }

    async fn call_model(
        &self,
        messages: &[Message],
        on_event: Option<&EventCallback>,
    ) -> Result<String, ApiError> {
        match on_event {
            Some(callback) if self.streaming.load(Ordering::Relaxed) => {
                let mut forward =
                    |chunk: &str| callback(AgentEvent::Streaming(chunk.to_string()));
                self.client.chat_stream(messages, &mut forward).await
            }
            _ => self.client.chat(messages).await,
        }
    }

    /// Run one requested tool and return the observation text.
    ///
    /// Unknown tools, exhausted limits and tool failures all become
    /// observations so the model can correct itself. Refused requests still
    /// cost one unit of the turn's total budget.
    async fn dispatch(&self, name: &str, args: &str, on_event: Option<&EventCallback>) -> String {
        if let Some(callback) = on_event {
            callback(AgentEvent::ToolCall {
                name: name.to_string(),
                args: args.to_string(),
            });
        }

        let Some(tool) = self.tools.get(name) else {
            let total = self.accountant.charge_refused();
            tracing::info!(tool = %name, total, "model requested an unknown tool");
            return format!(
                "Error: unknown tool '{name}'. Available tools: {}.",
                self.tools.names().join(", ")
            );
        };

        if self.accountant.is_tool_limit_reached(name) {
            let limit = self.accountant.limit_for(name);
            let total = self.accountant.charge_refused();
            tracing::info!(tool = %name, limit, total, "per-tool call limit reached");
            return format!(
                "Tool '{name}' has reached its call limit ({limit}) for this turn. \
                 Use a different tool or give your Final Answer with what you have."
            );
        }

        let usage = self.accountant.record(name);
        tracing::debug!(tool = %name, count = usage.count, total = usage.total, "dispatching tool");
        if let Some(callback) = on_event {
            callback(AgentEvent::ToolUsage {
                name: name.to_string(),
                usage,
            });
        }

        let confirmable = tool.as_confirmable();
        if let Some(confirmable) = confirmable {
            confirmable.set_event_callback(on_event.cloned());
        }
        let result = tool.execute(args).await;
        if let Some(confirmable) = confirmable {
            confirmable.set_event_callback(None);
        }

        match result {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(tool = %name, error = %err, "tool failed");
                format!("Tool Execution Error: {err}")
            }
        }
    }
}

fn total_limit_message(total: u32, limit: u32) -> String {
    format!(
        "Stopped after {total} tool calls: the limit of {limit} tool calls per request was reached. \
         Ask again to continue from here."
    )
}
