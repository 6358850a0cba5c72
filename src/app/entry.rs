//! Application entry orchestration for the apiprobe CLI.

use crate::app::{exec_mode, repl_loop, startup};
use crate::cli;
use apiprobe::agent::Agent;
use apiprobe::api::ApiClient;
use apiprobe::config::{load_config, Config};
use apiprobe::tools::ToolRegistry;
use apiprobe::ui::Renderer;
use std::sync::Arc;

/// Run the CLI and return the process exit code.
pub(crate) async fn run(args: cli::Args) -> i32 {
    startup::init_logging(args.verbose);

    let (mut config, source) = match load_config(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };
    apply_cli_overrides(&mut config, &args);
    tracing::info!(?source, model = %config.api.model, base_url = %config.api.base_url, "configuration loaded");

    let renderer = Renderer::new(&config.display);
    if config.api.base_url.trim().is_empty() || config.api.model.trim().is_empty() {
        renderer.error("No API base URL or model configured. Set [api] in apiprobe.toml or APIPROBE_BASE_URL / APIPROBE_MODEL.");
        return 1;
    }
    if config.api.api_key.is_empty() {
        tracing::warn!("no API key configured; requests are sent without authorization");
    }

    let tools = Arc::new(ToolRegistry::new());
    let agent = Arc::new(Agent::new(
        Arc::new(ApiClient::new(&config.api)),
        tools.clone(),
    ));
    agent.apply_config(&config);
    startup::register_tools(&tools, &agent, &config);

    match args.prompt {
        Some(prompt) => exec_mode::run_exec_mode(&renderer, &agent, prompt).await,
        None => {
            renderer.header(&config.api.model, &config.api.base_url);
            renderer.notice("type /help for commands, /quit to exit");
            repl_loop::run_repl(&renderer, &agent).await
        }
    }
}

/// Flags win over file and environment values.
fn apply_cli_overrides(config: &mut Config, args: &cli::Args) {
    if let Some(model) = &args.model {
        config.api.model = model.clone();
    }
    if let Some(url) = &args.base_url {
        config.api.base_url = url.clone();
    }
    if args.no_color {
        config.display.color = false;
    }
}
