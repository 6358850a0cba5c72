//! Slash commands available at the idle REPL prompt.

use apiprobe::agent::Agent;
use apiprobe::ui::Renderer;

/// Parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplCommand {
    /// Show the call counters of the last turn.
    Usage,
    /// Show how many messages the conversation holds.
    History,
    /// Forget the conversation.
    Clear,
    Help,
    Quit,
    Unknown(String),
}

/// Parse a slash command; `None` for ordinary prompts.
pub(crate) fn parse_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    let name = line.strip_prefix('/')?.split_whitespace().next().unwrap_or("");
    let command = match name {
        "usage" => ReplCommand::Usage,
        "history" => ReplCommand::History,
        "clear" => ReplCommand::Clear,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        _ => ReplCommand::Unknown(line.to_string()),
    };
    Some(command)
}

/// Run every command except `/quit`, which the loop handles itself.
pub(crate) fn handle_command(renderer: &Renderer, agent: &Agent, command: &ReplCommand) {
    match command {
        ReplCommand::Usage => renderer.usage_table(&agent.usage()),
        ReplCommand::History => {
            renderer.notice(&format!("{} messages in history", agent.history_len()));
        }
        ReplCommand::Clear => {
            agent.clear_history();
            renderer.notice("history cleared");
        }
        ReplCommand::Help => {
            for line in HELP_LINES {
                renderer.notice(line);
            }
        }
        ReplCommand::Quit => {}
        ReplCommand::Unknown(text) => {
            renderer.warn(&format!("unknown command `{text}`; try /help"));
        }
    }
}

const HELP_LINES: &[&str] = &[
    "/usage    tool call counters for the last request",
    "/history  number of messages in the conversation",
    "/clear    forget the conversation",
    "/quit     exit (Ctrl-D also works)",
];
