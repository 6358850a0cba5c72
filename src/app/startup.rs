//! Process setup: logging and tool registration.

use apiprobe::agent::Agent;
use apiprobe::config::Config;
use apiprobe::tools::files::{ReadFileTool, WriteFileTool};
use apiprobe::tools::http::HttpRequestTool;
use apiprobe::tools::retry::RetryTool;
use apiprobe::tools::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a full `tracing` filter directive.
pub(crate) const LOG_ENV: &str = "APIPROBE_LOG";

/// Filter directive from the environment, else from the `-v` count.
pub(crate) fn log_filter(verbose: u8, env_filter: Option<String>) -> String {
    if let Some(filter) = env_filter.filter(|value| !value.trim().is_empty()) {
        return filter;
    }
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
    .to_string()
}

/// Install the stderr subscriber. A malformed filter falls back to `warn`.
pub(crate) fn init_logging(verbose: u8) {
    let directive = log_filter(verbose, std::env::var(LOG_ENV).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Register the tools enabled in `[tools]` and return their names.
pub(crate) fn register_tools(
    registry: &Arc<ToolRegistry>,
    agent: &Agent,
    config: &Config,
) -> Vec<String> {
    let tools = &config.tools;
    if tools.http_enabled {
        registry.register(HttpRequestTool::new(Duration::from_secs(
            tools.http_timeout_secs.max(1),
        )));
    }
    if tools.files_enabled {
        registry.register(ReadFileTool);
        registry.register(WriteFileTool::new(
            agent.confirmation_gate().clone(),
            config.confirmation.confirm_writes,
        ));
    }
    if tools.retry_enabled {
        registry.register(RetryTool::new(registry.executor()));
    }
    let names = registry.names();
    tracing::debug!(tools = ?names, "tools registered");
    names
}
