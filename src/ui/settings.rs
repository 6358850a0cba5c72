//! Centralized UI settings for the terminal interface.
//!
//! The single place to tweak prompt strings, glyphs, colors and indentation.

use crossterm::style::Color;

// ---------------------------------------------------------------------------
// Layout / indentation
// ---------------------------------------------------------------------------

pub const INDENT_1: &str = "  ";
pub const INDENT_2: &str = "    ";
/// Observation lines shown before the rest is elided.
pub const OBSERVATION_PREVIEW_LINES: usize = 12;
/// Characters of tool arguments shown on the call line.
pub const TOOL_ARGS_PREVIEW_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Prompt strings
// ---------------------------------------------------------------------------

pub const PROMPT_PRIMARY: &str = "> ";
pub const PROMPT_APPROVAL: &str = "approve write? [y/n] ";

// ---------------------------------------------------------------------------
// Labels / glyphs
// ---------------------------------------------------------------------------

pub const LABEL_AGENT: &str = "apiprobe";
pub const LABEL_WARNING: &str = "warning:";
pub const LABEL_ERROR: &str = "error:";
pub const LABEL_THINKING: &str = "thinking";
pub const LABEL_USAGE: &str = "calls";

pub const GLYPH_TOOL_CALL: &str = "▶";
pub const GLYPH_TOOL_RESULT: &str = "\u{2190}";
pub const GLYPH_TOOL_CALL_PLAIN: &str = ">";
pub const GLYPH_TOOL_RESULT_PLAIN: &str = "<-";

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

pub const COLOR_HEADER: Color = Color::Cyan;
pub const COLOR_THINKING: Color = Color::DarkGrey;
pub const COLOR_STREAMING: Color = Color::DarkGrey;
pub const COLOR_TOOL_CALL_GLYPH: Color = Color::Green;
pub const COLOR_TOOL_CALL_NAME: Color = Color::White;
pub const COLOR_TOOL_CALL_ARGS: Color = Color::Grey;
pub const COLOR_TOOL_RESULT: Color = Color::Grey;
pub const COLOR_USAGE: Color = Color::DarkGrey;
pub const COLOR_APPROVAL: Color = Color::Yellow;
pub const COLOR_DIFF_ADDED: Color = Color::Green;
pub const COLOR_DIFF_REMOVED: Color = Color::Red;
pub const COLOR_DIFF_HUNK: Color = Color::Cyan;
pub const COLOR_WARNING: Color = Color::Yellow;
pub const COLOR_ERROR: Color = Color::Red;
