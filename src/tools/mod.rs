//! Pluggable tool system.
//!
//! Tools are async trait objects the model invokes by name with raw argument
//! text. They are registered into a [`ToolRegistry`] that may be shared
//! between the UI (reconfiguration) and the worker running a turn (lookup).

pub mod accounting;
pub mod confirmation;
pub mod files;
pub mod http;
pub mod retry;

use crate::agent::EventCallback;
use crate::error::ToolError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

// ---------------------------------------------------------------------------
// Tool trait
// ---------------------------------------------------------------------------

/// A tool that can be invoked by the model.
///
/// Implement this trait to add custom tools and register instances with
/// [`ToolRegistry`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name matching what the model will call.
    fn name(&self) -> &str;

    /// One-line summary shown in the tool catalog.
    fn description(&self) -> &str;

    /// Human/LLM-readable parameter description. Not validated by the agent.
    fn parameter_schema(&self) -> String;

    /// Execute the tool with the given argument text.
    /// Returns a text result to send back to the model.
    async fn execute(&self, arguments: &str) -> Result<String, ToolError>;

    /// Tools that pause for human approval expose it here.
    fn as_confirmable(&self) -> Option<&dyn Confirmable> {
        None
    }
}

/// Optional capability for tools that request confirmation mid-execution.
pub trait Confirmable: Send + Sync {
    /// Wire (or clear) the sink used to emit `confirmation_required` events.
    fn set_event_callback(&self, callback: Option<EventCallback>);
}

/// Catalog entry used to describe a tool to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: String,
}

/// Render a JSON schema value as indented text for the catalog.
pub(crate) fn schema_text(schema: serde_json::Value) -> String {
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| schema.to_string())
}

// ---------------------------------------------------------------------------
// Tool registry
// ---------------------------------------------------------------------------

/// Name-keyed map of tools behind a reader/writer lock.
///
/// Registering a name twice replaces the earlier tool.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, returning the one it replaced.
    pub fn register(&self, tool: impl Tool + 'static) -> Option<Arc<dyn Tool>> {
        self.register_shared(Arc::new(tool))
    }

    /// Register an already shared tool, returning the one it replaced.
    pub fn register_shared(&self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        let name = tool.name().to_string();
        let previous = self
            .tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), tool);
        if previous.is_some() {
            tracing::debug!(tool = %name, "replaced registered tool");
        }
        previous
    }

    /// Look up a tool by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Catalog of all tools, sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let tools: Vec<Arc<dyn Tool>> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut specs: Vec<ToolSpec> = tools
            .iter()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameter_schema(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find a tool by name and execute it.
    ///
    /// The lock is released before the tool runs.
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(arguments).await
    }

    /// Handle for tools that need to call back into other tools.
    pub fn executor(self: &Arc<Self>) -> ToolExecutor {
        ToolExecutor {
            registry: Arc::downgrade(self),
        }
    }
}

// ---------------------------------------------------------------------------
// Re-entrant execution handle
// ---------------------------------------------------------------------------

/// Narrow `execute(name, args)` entry point held by tools such as
/// `retry_request`.
///
/// Holds a weak reference so a tool stored inside the registry does not keep
/// the registry alive. Calls made through it are not counted against the
/// turn's limits.
#[derive(Clone, Debug)]
pub struct ToolExecutor {
    registry: Weak<ToolRegistry>,
}

impl ToolExecutor {
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<String, ToolError> {
        let registry = self.registry.upgrade().ok_or_else(|| {
            ToolError::ExecutionFailed("tool registry is no longer available".to_string())
        })?;
        registry.execute(name, arguments).await
    }
}
