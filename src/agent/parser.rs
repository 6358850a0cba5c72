//! Free-text ReAct reply parser.
//!
//! Models are asked to answer in a `Thought: / ACTION: tool({...}) /
//! Final Answer:` layout, but real replies drift: markers change case, gain
//! stray spaces, or vanish entirely. [`parse_response`] never fails. When it
//! recognizes nothing it hands back the whole reply as the final answer so no
//! model output is silently dropped.
//!
//! Argument extraction is a small cursor scanner rather than a regex because
//! it has to respect nested braces and quoted strings containing `)`.

const THOUGHT_MARKER: &str = "thought:";
/// Ordered most specific first.
const ACTION_MARKERS: [&str; 3] = ["action:", "action :", "action"];
const FINAL_ANSWER_MARKERS: [&str; 3] = ["final answer:", "final answer :", "final answer"];
/// Markers that end a thought span.
const THOUGHT_TERMINATORS: [&str; 2] = ["action", "final answer"];

/// Structured view of one model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Reasoning text following `Thought:`, if any.
    pub thought: String,
    /// Requested tool; empty when the reply is an answer.
    pub tool_name: String,
    /// Raw argument text, usually a JSON object copied verbatim.
    pub tool_args: String,
    /// Answer text; always empty when a tool call was found.
    pub final_answer: String,
}

impl ParsedResponse {
    /// True when the model asked for a tool.
    pub fn is_tool_call(&self) -> bool {
        !self.tool_name.is_empty()
    }
}

/// Parse one raw model reply.
///
/// `tool_names` is only consulted when no action marker is present, to catch
/// replies that contain a bare `tool_name(...)` call.
pub fn parse_response<S: AsRef<str>>(raw: &str, tool_names: &[S]) -> ParsedResponse {
    // ASCII lowercasing keeps byte offsets identical, so indices found in
    // `lower` slice `raw` on the same boundaries.
    let lower = raw.to_ascii_lowercase();

    let thought = extract_thought(raw, &lower);
    let (tool_name, tool_args) = extract_action(raw, &lower)
        .or_else(|| find_raw_tool_call(raw, tool_names))
        .unwrap_or_default();

    let final_answer = if !tool_name.is_empty() {
        String::new()
    } else {
        extract_final_answer(raw, &lower).unwrap_or_else(|| raw.to_string())
    };

    ParsedResponse {
        thought,
        tool_name,
        tool_args,
        final_answer,
    }
}

fn extract_thought(raw: &str, lower: &str) -> String {
    let Some(pos) = lower.find(THOUGHT_MARKER) else {
        return String::new();
    };
    let start = pos + THOUGHT_MARKER.len();
    let end = THOUGHT_TERMINATORS
        .iter()
        .filter_map(|marker| find_marker(lower, marker, start))
        .min()
        .unwrap_or(raw.len());
    raw[start..end].trim().to_string()
}

fn extract_action(raw: &str, lower: &str) -> Option<(String, String)> {
    for marker in ACTION_MARKERS {
        let mut from = 0;
        while let Some(pos) = find_marker(lower, marker, from) {
            let after = pos + marker.len();
            if let Some(call) = structured_call_at(raw, after) {
                return Some(call);
            }
            from = after;
        }
    }
    None
}

/// Find `marker` in `lower` at or after `from` where it stands as its own
/// word, so `transactions(2)` never reads as `action` plus `s(2)`.
fn find_marker(lower: &str, marker: &str, from: usize) -> Option<usize> {
    let mut from = from;
    while let Some(offset) = lower[from..].find(marker) {
        let pos = from + offset;
        let end = pos + marker.len();
        let open_before = lower[..pos]
            .chars()
            .next_back()
            .is_none_or(|prev| !is_identifier_char(prev));
        let open_after = !marker.ends_with(is_identifier_char)
            || lower[end..]
                .chars()
                .next()
                .is_none_or(|next| !is_identifier_char(next));
        if open_before && open_after {
            return Some(pos);
        }
        from = end;
    }
    None
}

/// Try to read `name(args)` starting at `start`, skipping leading whitespace.
fn structured_call_at(raw: &str, start: usize) -> Option<(String, String)> {
    let trimmed = raw[start..].trim_start();
    let paren = trimmed.find('(')?;
    let name = trimmed[..paren]
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '`' | ':'));
    if !is_tool_identifier(name) {
        return None;
    }
    let args = extract_arguments(&trimmed[paren..]);
    Some((name.to_string(), args))
}

fn is_tool_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_identifier_char)
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Extract the argument text of a call. `text` must start at `(`.
///
/// The first `{` or `[` outside a string starts a JSON value which is returned
/// verbatim once its matching close brings the depth back to zero. A `)` at
/// depth zero before any JSON start yields the trimmed literal between the
/// parentheses. Anything unterminated yields an empty string.
pub fn extract_arguments(text: &str) -> String {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, '(')) => {}
        _ => return String::new(),
    }

    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut json_start: Option<usize> = None;

    for (idx, c) in chars {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' | '[' => {
                if depth == 0 && json_start.is_none() {
                    json_start = Some(idx);
                }
                depth += 1;
            }
            '}' | ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = json_start {
                        return text[start..=idx].to_string();
                    }
                }
            }
            ')' if depth == 0 => return text[1..idx].trim().to_string(),
            _ => {}
        }
    }

    String::new()
}

/// Fallback for replies that call a tool without any action marker.
///
/// Names are tried longest first so `http_request(` is never claimed by a
/// shorter `request` tool, and a match must not sit inside a longer
/// identifier.
fn find_raw_tool_call<S: AsRef<str>>(raw: &str, tool_names: &[S]) -> Option<(String, String)> {
    let mut names: Vec<&str> = tool_names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !name.is_empty())
        .collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    for name in names {
        let needle = format!("{name}(");
        let mut from = 0;
        while let Some(offset) = raw[from..].find(&needle) {
            let pos = from + offset;
            let at_boundary = raw[..pos]
                .chars()
                .next_back()
                .is_none_or(|prev| !is_identifier_char(prev));
            if at_boundary {
                let args = extract_arguments(&raw[pos + name.len()..]);
                return Some((name.to_string(), args));
            }
            from = pos + needle.len();
        }
    }
    None
}

fn extract_final_answer(raw: &str, lower: &str) -> Option<String> {
    FINAL_ANSWER_MARKERS.iter().find_map(|marker| {
        lower
            .find(marker)
            .map(|pos| raw[pos + marker.len()..].trim().to_string())
    })
}
