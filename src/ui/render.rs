//! Terminal renderer for agent events.
//!
//! Status and trace output goes to stderr; final answers go to stdout so
//! one-shot runs can be piped.

use crate::agent::{AgentEvent, FileConfirmation, ToolUsage};
use crate::config::DisplayConfig;
use crate::textutil::{single_line, truncate_with_suffix_by_chars};
use crate::tools::accounting::UsageSnapshot;
use crate::ui::settings;
use crossterm::style::{Color, Stylize};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Renders [`AgentEvent`]s and REPL chrome to the terminal.
#[derive(Debug)]
pub struct Renderer {
    color: bool,
    show_tool_calls: bool,
    show_streaming: bool,
    /// True while streamed model text is on screen without a trailing newline.
    mid_stream: AtomicBool,
}

impl Renderer {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            color: display.color,
            show_tool_calls: display.show_tool_calls,
            show_streaming: display.show_streaming,
            mid_stream: AtomicBool::new(false),
        }
    }

    /// Render one event.
    pub fn render_event(&self, event: &AgentEvent) {
        if let AgentEvent::Streaming(chunk) = event {
            if self.show_streaming {
                self.stream_chunk(chunk);
            }
            return;
        }
        self.end_stream();
        match event {
            AgentEvent::Thinking(text) => self.thinking(text),
            AgentEvent::ToolCall { name, args } => {
                if self.show_tool_calls {
                    self.tool_call(name, args);
                }
            }
            AgentEvent::ToolUsage { name, usage } => {
                if self.show_tool_calls {
                    self.tool_usage(name, usage);
                }
            }
            AgentEvent::Observation(text) => {
                if self.show_tool_calls {
                    self.observation(text);
                }
            }
            AgentEvent::Answer(text) => self.answer(text),
            AgentEvent::Error(text) => self.error(text),
            AgentEvent::ConfirmationRequired(request) => self.confirmation(request),
            AgentEvent::Streaming(_) => {}
        }
    }

    /// Session banner.
    pub fn header(&self, model: &str, base_url: &str) {
        if self.color {
            eprintln!(
                "{} {}",
                settings::LABEL_AGENT.with(settings::COLOR_HEADER).bold(),
                format!("model {model} @ {base_url}").with(settings::COLOR_THINKING)
            );
        } else {
            eprintln!("{} model {model} @ {base_url}", settings::LABEL_AGENT);
        }
    }

    /// Input prompt; the approval variant is shown while a write awaits y/n.
    pub fn prompt(&self, awaiting_approval: bool) {
        let text = if awaiting_approval {
            settings::PROMPT_APPROVAL
        } else {
            settings::PROMPT_PRIMARY
        };
        if self.color && awaiting_approval {
            eprint!("{}", text.with(settings::COLOR_APPROVAL).bold());
        } else {
            eprint!("{text}");
        }
        let _ = io::stderr().flush();
    }

    pub fn thinking(&self, text: &str) {
        let line = truncate_with_suffix_by_chars(first_line(text), 160, "...");
        if self.color {
            eprintln!(
                "{}{}",
                settings::INDENT_1,
                format!("{}: {line}", settings::LABEL_THINKING).with(settings::COLOR_THINKING)
            );
        } else {
            eprintln!("{}{}: {line}", settings::INDENT_1, settings::LABEL_THINKING);
        }
    }

    pub fn tool_call(&self, name: &str, args: &str) {
        let preview = truncate_with_suffix_by_chars(
            &single_line(args),
            settings::TOOL_ARGS_PREVIEW_CHARS,
            "...",
        );
        if self.color {
            eprintln!(
                "{}{} {}({})",
                settings::INDENT_1,
                settings::GLYPH_TOOL_CALL.with(settings::COLOR_TOOL_CALL_GLYPH),
                name.with(settings::COLOR_TOOL_CALL_NAME).bold(),
                preview.with(settings::COLOR_TOOL_CALL_ARGS),
            );
        } else {
            eprintln!(
                "{}{} {name}({preview})",
                settings::INDENT_1,
                settings::GLYPH_TOOL_CALL_PLAIN
            );
        }
    }

    pub fn tool_usage(&self, name: &str, usage: &ToolUsage) {
        let line = format_tool_usage(name, usage);
        if self.color {
            eprintln!("{}{}", settings::INDENT_2, line.with(settings::COLOR_USAGE));
        } else {
            eprintln!("{}{line}", settings::INDENT_2);
        }
    }

    pub fn observation(&self, text: &str) {
        let glyph = if self.color {
            settings::GLYPH_TOOL_RESULT
        } else {
            settings::GLYPH_TOOL_RESULT_PLAIN
        };
        for (idx, line) in preview_lines(text, settings::OBSERVATION_PREVIEW_LINES)
            .iter()
            .enumerate()
        {
            let lead = if idx == 0 { glyph } else { " " };
            if self.color {
                eprintln!(
                    "{}{lead} {}",
                    settings::INDENT_1,
                    line.as_str().with(settings::COLOR_TOOL_RESULT)
                );
            } else {
                eprintln!("{}{lead} {line}", settings::INDENT_1);
            }
        }
    }

    /// Final answer, on stdout.
    pub fn answer(&self, text: &str) {
        println!("{text}");
        let _ = io::stdout().flush();
    }

    /// Diff and summary for a pending file write.
    pub fn confirmation(&self, request: &FileConfirmation) {
        let verb = if request.is_new_file { "create" } else { "overwrite" };
        let title = format!("The agent wants to {verb} {}", request.path);
        if self.color {
            eprintln!("{}", title.with(settings::COLOR_APPROVAL).bold());
        } else {
            eprintln!("{title}");
        }
        for line in request.diff.lines() {
            match diff_line_color(line).filter(|_| self.color) {
                Some(color) => eprintln!("{}{}", settings::INDENT_1, line.with(color)),
                None => eprintln!("{}{line}", settings::INDENT_1),
            }
        }
    }

    /// Per-tool counters for the `/usage` command.
    pub fn usage_table(&self, snapshot: &UsageSnapshot) {
        if snapshot.tools.is_empty() {
            self.notice("no tool calls this turn");
        }
        for (name, count, limit) in &snapshot.tools {
            eprintln!("{}{name}: {count}/{limit}", settings::INDENT_1);
        }
        eprintln!(
            "{}total: {}/{}",
            settings::INDENT_1,
            snapshot.total,
            snapshot.total_limit
        );
    }

    pub fn notice(&self, msg: &str) {
        if self.color {
            eprintln!("{}", msg.with(settings::COLOR_THINKING));
        } else {
            eprintln!("{msg}");
        }
    }

    pub fn warn(&self, msg: &str) {
        self.end_stream();
        if self.color {
            eprintln!(
                "{} {msg}",
                settings::LABEL_WARNING.with(settings::COLOR_WARNING).bold()
            );
        } else {
            eprintln!("{} {msg}", settings::LABEL_WARNING);
        }
    }

    pub fn error(&self, msg: &str) {
        self.end_stream();
        if self.color {
            eprintln!(
                "{} {msg}",
                settings::LABEL_ERROR.with(settings::COLOR_ERROR).bold()
            );
        } else {
            eprintln!("{} {msg}", settings::LABEL_ERROR);
        }
    }

    fn stream_chunk(&self, chunk: &str) {
        if !self.mid_stream.swap(true, Ordering::Relaxed) {
            eprint!("{}", settings::INDENT_1);
        }
        let chunk = chunk.replace('\n', &format!("\n{}", settings::INDENT_1));
        if self.color {
            eprint!("{}", chunk.with(settings::COLOR_STREAMING));
        } else {
            eprint!("{chunk}");
        }
        let _ = io::stderr().flush();
    }

    /// Terminate an open streaming line before other output.
    fn end_stream(&self) {
        if self.mid_stream.swap(false, Ordering::Relaxed) {
            eprintln!();
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// One-line counter summary after a dispatch.
fn format_tool_usage(name: &str, usage: &ToolUsage) -> String {
    format!(
        "{}: {name} {}/{}, total {}/{}",
        settings::LABEL_USAGE,
        usage.count,
        usage.limit,
        usage.total,
        usage.total_limit
    )
}

/// First `max_lines` lines of `text`, plus a marker for the rest.
fn preview_lines(text: &str, max_lines: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = lines
        .iter()
        .take(max_lines)
        .map(|line| line.to_string())
        .collect();
    if lines.len() > max_lines {
        out.push(format!("... ({} more lines)", lines.len() - max_lines));
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Color for one unified diff line; context lines stay unstyled.
fn diff_line_color(line: &str) -> Option<Color> {
    if line.starts_with("+++") || line.starts_with("---") {
        None
    } else if line.starts_with('+') {
        Some(settings::COLOR_DIFF_ADDED)
    } else if line.starts_with('-') {
        Some(settings::COLOR_DIFF_REMOVED)
    } else if line.starts_with("@@") {
        Some(settings::COLOR_DIFF_HUNK)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_lines_are_colored_by_prefix() {
        assert_eq!(diff_line_color("+added"), Some(settings::COLOR_DIFF_ADDED));
        assert_eq!(diff_line_color("-removed"), Some(settings::COLOR_DIFF_REMOVED));
        assert_eq!(diff_line_color("@@ -1 +1 @@"), Some(settings::COLOR_DIFF_HUNK));
        assert_eq!(diff_line_color("--- a/file"), None);
        assert_eq!(diff_line_color("+++ b/file"), None);
        assert_eq!(diff_line_color(" context"), None);
    }

    #[test]
    fn preview_lines_elides_the_tail() {
        let text = (1..=5).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        assert_eq!(preview_lines(&text, 3), vec!["1", "2", "3", "... (2 more lines)"]);
        assert_eq!(preview_lines("only", 3), vec!["only"]);
        assert_eq!(preview_lines("", 3), vec![""]);
    }

    #[test]
    fn tool_usage_line_shows_both_counters() {
        let usage = ToolUsage {
            count: 2,
            limit: 10,
            total: 5,
            total_limit: 50,
        };
        assert_eq!(
            format_tool_usage("http_request", &usage),
            "calls: http_request 2/10, total 5/50"
        );
    }

    #[test]
    fn streaming_state_closes_before_other_output() {
        let renderer = Renderer::new(&DisplayConfig {
            color: false,
            ..DisplayConfig::default()
        });
        renderer.render_event(&AgentEvent::Streaming("partial".into()));
        assert!(renderer.mid_stream.load(Ordering::Relaxed));
        renderer.render_event(&AgentEvent::Thinking("next".into()));
        assert!(!renderer.mid_stream.load(Ordering::Relaxed));
    }

    #[test]
    fn hidden_streaming_never_opens_a_line() {
        let renderer = Renderer::new(&DisplayConfig {
            color: false,
            show_streaming: false,
            ..DisplayConfig::default()
        });
        renderer.render_event(&AgentEvent::Streaming("partial".into()));
        assert!(!renderer.mid_stream.load(Ordering::Relaxed));
    }
}
