//! apiprobe: a ReAct agent for exploring and testing HTTP APIs from the
//! terminal.
//!
//! The agent talks to any OpenAI-compatible chat endpoint, parses each reply
//! into a thought, a tool call or a final answer, and runs tools under
//! per-turn call limits. File writes pause on a confirmation gate until a
//! human approves them.
//!
//! # Quick start
//!
//! ```no_run
//! use apiprobe::agent::Agent;
//! use apiprobe::api::ApiClient;
//! use apiprobe::config::load_config;
//! use apiprobe::tools::http::HttpRequestTool;
//! use apiprobe::tools::ToolRegistry;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let (config, _source) = load_config(None).unwrap();
//! let tools = Arc::new(ToolRegistry::new());
//! tools.register(HttpRequestTool::new(Duration::from_secs(30)));
//! let agent = Agent::new(Arc::new(ApiClient::new(&config.api)), tools);
//! agent.apply_config(&config);
//! let answer = agent.process_message("Is https://example.com up?").await.unwrap();
//! println!("{answer}");
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod prompt;
#[cfg(test)]
pub mod testsupport;
pub mod textutil;
pub mod tools;
pub mod types;
pub mod ui;
