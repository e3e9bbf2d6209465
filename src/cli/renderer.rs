//! Execution renderer
//!
//! Prints a finished run for a human: summary counters, the tool history, the
//! full message history (each message truncated) and the final answer. The
//! `format_*` functions build the plain text; [`ExecutionRenderer`] decides
//! which sections are shown and adds color.

use colored::*;

use super::console::{Console, LINE_WIDTH};
use crate::core::ConversationState;
use crate::llm::{Message, Role};

/// Default per-message truncation length, in characters
pub const DEFAULT_TRUNCATE: usize = 500;

/// First `limit` characters of `text`, or `None` if it already fits
pub fn truncate_chars(text: &str, limit: usize) -> Option<&str> {
    text.char_indices().nth(limit).map(|(idx, _)| &text[..idx])
}

pub fn format_summary(state: &ConversationState) -> String {
    format!(
        "Total Iterations: {}\nTotal Messages: {}\nTool Calls: {}",
        state.iteration_count(),
        state.messages().len(),
        state.tool_results().len()
    )
}

/// One block per executed tool, or `None` when no tool ran
pub fn format_tool_history(state: &ConversationState) -> Option<String> {
    if state.tool_results().is_empty() {
        return None;
    }

    let blocks: Vec<String> = state
        .tool_results()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "[Tool Call {}]\nTool: {}\n\nOutput:\n{}\n{}",
                i + 1,
                record.tool_name,
                record.output,
                "-".repeat(LINE_WIDTH)
            )
        })
        .collect();
    Some(blocks.join("\n\n"))
}

fn role_label(role: Role) -> (&'static str, &'static str) {
    match role {
        Role::System => ("⚙️", "SystemMessage"),
        Role::Human => ("👤", "HumanMessage"),
        Role::Ai => ("🤖", "AIMessage"),
        Role::Tool => ("🔧", "ToolMessage"),
    }
}

/// A single message; content longer than `truncate` characters is cut
pub fn format_message(message: &Message, index: usize, truncate: usize) -> String {
    let (icon, label) = role_label(message.role());
    let mut out = format!("{} [Message {}] {}\n", icon, index, label);

    let content = message.content();
    match truncate_chars(content, truncate) {
        Some(head) => {
            out.push_str(&format!(
                "{}...\n[truncated, {} chars total]\n",
                head,
                content.chars().count()
            ));
        }
        None => {
            out.push_str(content);
            out.push('\n');
        }
    }

    let calls = message.tool_calls();
    if !calls.is_empty() {
        out.push_str(&format!("\n🔧 Tool Calls Requested: {}\n", calls.len()));
        for call in calls {
            out.push_str(&format!("  • {}\n", call.name));
            if call.args.as_object().map_or(true, |args| !args.is_empty()) {
                out.push_str(&format!("    Args: {}\n", call.args));
            }
        }
    }

    out.push_str(&"-".repeat(LINE_WIDTH));
    out
}

/// Prints a finished run
pub struct ExecutionRenderer {
    console: Console,
    show_summary: bool,
    show_tools: bool,
    show_messages: bool,
    show_final: bool,
    truncate: usize,
}

impl ExecutionRenderer {
    /// Summary and final answer only
    pub fn compact() -> Self {
        Self {
            console: Console::new(),
            show_summary: true,
            show_tools: false,
            show_messages: false,
            show_final: true,
            truncate: DEFAULT_TRUNCATE,
        }
    }

    /// Every section
    pub fn full() -> Self {
        Self {
            show_tools: true,
            show_messages: true,
            ..Self::compact()
        }
    }

    pub fn show_tools(mut self, show: bool) -> Self {
        self.show_tools = show;
        self
    }

    pub fn show_messages(mut self, show: bool) -> Self {
        self.show_messages = show;
        self
    }

    pub fn with_truncate(mut self, truncate: usize) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn render(&self, state: &ConversationState) {
        if self.show_summary {
            self.console.print_section("EXECUTION SUMMARY");
            self.console.println(&format_summary(state));
        }

        if self.show_tools {
            match format_tool_history(state) {
                Some(history) => {
                    self.console.print_section("TOOL EXECUTION HISTORY");
                    self.console.println(&history);
                }
                None => self.console.println(&"\n(No tools were called)".bright_black().to_string()),
            }
        }

        if self.show_messages {
            self.console.print_section("MESSAGE HISTORY");
            for (i, message) in state.messages().iter().enumerate() {
                println!();
                self.console
                    .println(&format_message(message, i + 1, self.truncate));
            }
        }

        if self.show_final {
            self.console.print_section("FINAL AGENT RESPONSE");
            match state.last_message() {
                Some(message) => self.console.print_assistant(message.content()),
                None => self.console.println("(No response)"),
            }
            self.console.println(&"=".repeat(LINE_WIDTH));
        }
    }
}

impl Default for ExecutionRenderer {
    fn default() -> Self {
        Self::compact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolRecord;
    use crate::llm::ToolCall;
    use serde_json::json;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), None);
        assert_eq!(truncate_chars("exactly", 7), None);
        assert_eq!(truncate_chars("abcdef", 3), Some("abc"));
        assert_eq!(truncate_chars("ééééé", 2), Some("éé"));
    }

    #[test]
    fn test_format_message_truncates() {
        let message = Message::ai("x".repeat(600));
        let text = format_message(&message, 3, 500);

        assert!(text.starts_with("🤖 [Message 3] AIMessage\n"));
        assert!(text.contains(&format!("{}...\n", "x".repeat(500))));
        assert!(text.contains("[truncated, 600 chars total]"));
    }

    #[test]
    fn test_format_message_lists_tool_calls() {
        let message = Message::ai_with_tool_calls(
            "",
            vec![
                ToolCall::new("1", "verify_on_platform", json!({"claim": "5G"})),
                ToolCall::new("2", "noop", json!({})),
            ],
        );
        let text = format_message(&message, 1, 500);

        assert!(text.contains("Tool Calls Requested: 2"));
        assert!(text.contains("  • verify_on_platform\n    Args: {\"claim\":\"5G\"}"));
        assert!(text.contains("  • noop\n"));
        assert!(!text.contains("Args: {}"));
    }

    #[test]
    fn test_summary_and_tool_history() {
        let mut state = ConversationState::new("q");
        assert!(format_tool_history(&state).is_none());

        state.record_model_turn(Message::ai("done"));
        state.push_tool_result(ToolRecord::new("search_internet", "page text"));

        assert_eq!(
            format_summary(&state),
            "Total Iterations: 1\nTotal Messages: 2\nTool Calls: 1"
        );
        let history = format_tool_history(&state).unwrap();
        assert!(history.starts_with("[Tool Call 1]\nTool: search_internet\n\nOutput:\npage text"));
    }
}
