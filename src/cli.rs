//! CLI argument parsing via clap.

use clap::{ArgAction, Parser};

/// A terminal assistant for exploring and testing HTTP APIs. Works with any
/// OpenAI-compatible chat endpoint.
#[derive(Debug, Parser)]
#[command(name = "apiprobe", version)]
pub struct Args {
    /// Prompt to send. If provided, runs one turn and exits.
    pub prompt: Option<String>,

    /// Path to config file (default: ./apiprobe.toml or <config dir>/apiprobe/apiprobe.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Override model name.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Override API base URL.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Disable color output.
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Increase log verbosity (-v debug, -vv trace). APIPROBE_LOG wins when set.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}
