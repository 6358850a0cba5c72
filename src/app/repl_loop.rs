//! Interactive read-eval-print loop.

use crate::app::commands::{handle_command, parse_command, ReplCommand};
use crate::app::tasks::drive_turn;
use apiprobe::agent::Agent;
use apiprobe::ui::Renderer;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Read prompts until `/quit`, end of input or Ctrl-C at the idle prompt.
pub(crate) async fn run_repl(renderer: &Renderer, agent: &Arc<Agent>) -> i32 {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        renderer.prompt(false);
        let line = tokio::select! {
            line = input.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                return 0;
            }
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                eprintln!();
                return 0;
            }
            Err(err) => {
                renderer.error(&format!("failed to read input: {err}"));
                return 1;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = parse_command(line) {
            if command == ReplCommand::Quit {
                return 0;
            }
            handle_command(renderer, agent, &command);
            continue;
        }

        drive_turn(renderer, agent, line.to_string(), &mut input).await;
        eprintln!();
    }
}
