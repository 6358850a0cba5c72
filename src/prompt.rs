//! System prompt templating helpers.
//!
//! The built-in prompt text lives in one template file and is rendered from a
//! single code path with runtime parameters (tool catalog and optional
//! operator instructions).

use crate::tools::ToolSpec;
use std::collections::BTreeMap;

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("templates/system_prompt.template");

/// Parameters used to compile the system prompt template.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SystemPromptParams<'a> {
    pub tools: &'a [ToolSpec],
    pub custom_instructions: Option<&'a str>,
}

/// Render the system prompt template using runtime parameters.
pub fn render_system_prompt(params: SystemPromptParams<'_>) -> String {
    let mut vars = BTreeMap::<&str, String>::new();
    vars.insert("TOOL_CATALOG", render_tool_catalog(params.tools));
    vars.insert(
        "CUSTOM_INSTRUCTIONS_BLOCK",
        render_custom_instructions(params.custom_instructions),
    );

    normalize_blank_lines(&render_template(SYSTEM_PROMPT_TEMPLATE, &vars))
}

fn render_template(template: &str, vars: &BTreeMap<&str, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("{{{{{key}}}}}");
        rendered = rendered.replace(&placeholder, value);
    }
    rendered
}

fn render_tool_catalog(tools: &[ToolSpec]) -> String {
    if tools.is_empty() {
        return "- none (answer directly with Final Answer)".to_string();
    }

    tools
        .iter()
        .map(|tool| {
            format!(
                "- `{}`: {}\n  Parameters:\n{}",
                tool.name,
                tool.description,
                indent(&tool.parameters, "    ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_custom_instructions(custom: Option<&str>) -> String {
    let Some(custom) = custom.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };
    format!("Additional operator instructions:\n{custom}")
}

/// Collapse runs of blank lines. Blank lines inside the tool catalog are
/// kept as single separators.
fn normalize_blank_lines(text: &str) -> String {
    let mut out = String::new();
    let mut previous_blank = false;

    for line in text.lines() {
        let is_blank = line.trim().is_empty();
        if is_blank && previous_blank {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line.trim_end());
        previous_blank = is_blank;
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            description: format!("{name} does things"),
            parameters: "{\n  \"type\": \"object\"\n}".to_string(),
        }
    }

    #[test]
    fn prompt_describes_the_reply_format() {
        let prompt = render_system_prompt(SystemPromptParams {
            tools: &[],
            custom_instructions: None,
        });
        assert!(prompt.contains("Thought:"));
        assert!(prompt.contains("ACTION: tool_name("));
        assert!(prompt.contains("Final Answer:"));
        assert!(prompt.contains("- none"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn prompt_lists_each_tool_with_indented_parameters() {
        let tools = [spec("http_request"), spec("read_file")];
        let prompt = render_system_prompt(SystemPromptParams {
            tools: &tools,
            custom_instructions: None,
        });
        assert!(prompt.contains("- `http_request`: http_request does things"));
        assert!(prompt.contains("    \"type\": \"object\""));
        assert!(prompt.contains("- `read_file`"));
    }

    #[test]
    fn custom_instructions_are_appended_when_present() {
        let with = render_system_prompt(SystemPromptParams {
            tools: &[],
            custom_instructions: Some("  Always use the staging host.  "),
        });
        assert!(with.ends_with("Additional operator instructions:\nAlways use the staging host."));

        let blank = render_system_prompt(SystemPromptParams {
            tools: &[],
            custom_instructions: Some("   "),
        });
        assert!(!blank.contains("Additional operator instructions"));
    }

    #[test]
    fn normalize_blank_lines_collapses_runs() {
        assert_eq!(normalize_blank_lines("a\n\n\n\nb  \n\n"), "a\n\nb");
    }
}
