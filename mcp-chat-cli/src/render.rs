//! Plain-text rendering of sessions, messages and trace panels.

use mcp_chat_core::{
    summarize, Badge, Message, Role, Step, StepAction, StepStatus, ToolInvocation, ToolStatus,
    Trace,
};

// ============================================================================
// Glyphs
// ============================================================================

pub fn step_glyph(action: &StepAction) -> &'static str {
    match action {
        StepAction::MessageReceived => "✉",
        StepAction::AgentInvocation => "◆",
        StepAction::ToolExecution => "⚡",
        StepAction::ResponseGeneration => "⚙",
        StepAction::ResponseDelivery => "✔",
        StepAction::ErrorOccurred => "✖",
        StepAction::Other(_) => "◷",
    }
}

pub fn status_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Completed => "[ok]",
        StepStatus::Error => "[error]",
        StepStatus::Processing => "[...]",
        StepStatus::Pending => "[ ]",
    }
}

fn badge_glyph(badge: Badge) -> &'static str {
    match badge {
        Badge::Success => "✔",
        Badge::Error => "✖",
        Badge::InProgress => "…",
    }
}

// ============================================================================
// Screens
// ============================================================================

pub fn render_welcome() -> String {
    [
        "MCP Chat",
        "AI agent with Model Context Protocol",
        "",
        "Ask anything and see exactly how the agent processed it:",
        "every step, every tool, and how long it took.",
        "",
        "Press Enter (or type `start`) to begin, `quit` to exit.",
    ]
    .join("\n")
}

pub fn render_suggestions(suggestions: &[String]) -> String {
    let mut out = String::from("Ready to explore MCP? Try one of these (/suggest N):\n");
    for (i, question) in suggestions.iter().enumerate() {
        out.push_str(&format!("  {}. \"{}\"\n", i + 1, question));
    }
    out
}

pub fn render_help() -> String {
    [
        "Commands:",
        "  <text>        send a message",
        "  /suggest N    copy suggestion N into the draft",
        "  /send         send the draft",
        "  /details N    show or hide the processing details of reply N",
        "  /clear        clear the conversation",
        "  /back         return to the welcome screen",
        "  /quit         exit",
    ]
    .join("\n")
}

pub fn render_draft(draft: &str, input_limit: usize) -> String {
    format!("Draft: {}  ({}/{})", draft, draft.chars().count(), input_limit)
}

pub fn render_thinking() -> &'static str {
    "  agent is thinking..."
}

// ============================================================================
// Messages
// ============================================================================

/// Render one message. `reply_number` labels agent replies for `/details N`.
pub fn render_message(message: &Message, reply_number: Option<usize>, expanded: bool) -> String {
    let time = message.timestamp.format("%H:%M");
    let mut out = match message.role {
        Role::User => format!("[{}] You: {}", time, message.text),
        Role::Agent => {
            let label = reply_number.map(|n| format!(" #{}", n)).unwrap_or_default();
            let badge = message
                .trace
                .as_ref()
                .map(|t| if t.succeeded { " (Success)" } else { " (Error)" })
                .unwrap_or("");
            format!("[{}] Agent{}{}: {}", time, label, badge, message.text)
        }
    };

    if let Some(trace) = &message.trace {
        out.push('\n');
        out.push_str(&render_trace_header(trace, expanded));
        if expanded {
            out.push('\n');
            out.push_str(&render_trace_details(trace));
        }
    }
    out
}

pub fn render_trace_header(trace: &Trace, expanded: bool) -> String {
    let summary = summarize(trace);
    let mut parts = vec![summary.steps_label()];
    if let Some(tools) = summary.tools_label() {
        parts.push(format!("⚡ {}", tools));
    }
    parts.push(badge_glyph(summary.overall_badge).to_string());

    let toggle = if expanded { "[-]" } else { "[+]" };
    format!("  {} MCP Processing Details  {}", toggle, parts.join("  "))
}

pub fn render_trace_details(trace: &Trace) -> String {
    let mut meta = format!(
        "    Agent: {}  Model: {}  Time: {}",
        trace.agent_name, trace.model_name, trace.processing_time
    );
    if trace.tokens_used.is_available() {
        meta.push_str(&format!("  Tokens: {}", trace.tokens_used));
    }
    let mut lines = vec![meta];

    lines.extend(trace.steps.iter().map(render_step));

    if !trace.tools_used.is_empty() {
        lines.push("    Tools Used".to_string());
        lines.extend(trace.tools_used.iter().map(render_tool));
    }
    lines.join("\n")
}

fn render_step(step: &Step) -> String {
    let mut line = format!(
        "    {} {} {}",
        step_glyph(&step.action),
        status_marker(step.status),
        step.action
    );
    if let Some(description) = &step.description {
        line.push_str(&format!(" — {}", description));
    }
    line
}

fn render_tool(tool: &ToolInvocation) -> String {
    let dot = match tool.status {
        ToolStatus::Success => "●",
        ToolStatus::Failure => "○",
    };
    let mut line = format!("      {} {} ({})", dot, tool.name, tool.status);
    if let Some(description) = &tool.description {
        line.push_str(&format!(" — {}", description));
    }
    line
}

/// Render the whole conversation, numbering agent replies from 1.
pub fn render_conversation(
    messages: &[Message],
    is_expanded: impl Fn(&Message) -> bool,
) -> String {
    let mut reply_number = 0;
    messages
        .iter()
        .map(|message| {
            let number = if message.is_agent() {
                reply_number += 1;
                Some(reply_number)
            } else {
                None
            };
            render_message(message, number, is_expanded(message))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The `N`th agent reply (1-based), as numbered by [`render_conversation`].
pub fn nth_reply(messages: &[Message], n: usize) -> Option<&Message> {
    if n == 0 {
        return None;
    }
    messages.iter().filter(|m| m.is_agent()).nth(n - 1)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mcp_chat_core::ConversationStore;
    use serde_json::json;

    fn traced_message() -> Message {
        let trace = Trace::from_details(&json!({
            "success": true,
            "steps": [
                {"action": "Message Received", "status": "completed", "description": "Processing user query: '2+2'"},
                {"action": "Tool Execution", "status": "completed"},
                {"action": "Cache Lookup", "status": "pending"}
            ],
            "tools_used": [{"name": "mathematical_reasoning", "status": "success"}],
            "agent_name": "demo-agent",
            "model": "gpt-4o-mini",
            "processing_time": "< 1s"
        }));
        Message::agent("4", Some(trace), Utc::now())
    }

    #[test]
    fn test_collapsed_message_shows_header_only() {
        let rendered = render_message(&traced_message(), Some(1), false);

        assert!(rendered.contains("Agent #1 (Success): 4"));
        assert!(rendered.contains("[+] MCP Processing Details"));
        assert!(rendered.contains("2/3 steps"));
        assert!(rendered.contains("1 tool"));
        assert!(!rendered.contains("Agent: demo-agent"));
    }

    #[test]
    fn test_expanded_message_shows_details() {
        let rendered = render_message(&traced_message(), Some(1), true);

        assert!(rendered.contains("[-] MCP Processing Details"));
        assert!(rendered.contains("Agent: demo-agent  Model: gpt-4o-mini  Time: < 1s"));
        assert!(!rendered.contains("Tokens:"), "unreported token usage is hidden");
        assert!(rendered.contains("✉ [ok] Message Received — Processing user query: '2+2'"));
        assert!(rendered.contains("◷ [ ] Cache Lookup"), "unknown actions use the generic glyph");
        assert!(rendered.contains("● mathematical_reasoning (success)"));
    }

    #[test]
    fn test_reported_token_usage_is_shown() {
        let trace = Trace::from_details(&json!({
            "success": true,
            "steps": [],
            "tokens_used": "~50-100"
        }));
        let rendered = render_trace_details(&trace);

        assert!(rendered.contains("Time: N/A  Tokens: ~50-100"));
    }

    #[test]
    fn test_user_message_has_no_panel() {
        let rendered = render_message(&Message::user("2+2", Utc::now()), None, true);
        assert!(rendered.ends_with("You: 2+2"));
        assert!(!rendered.contains("MCP Processing Details"));
    }

    #[test]
    fn test_conversation_numbers_agent_replies() {
        let mut store = ConversationStore::new();
        store.append_user_message("a");
        store.on_reply_settled(Ok(mcp_chat_core::ChatReply::new("1", None)));
        store.append_user_message("b");
        store.on_reply_settled(Ok(mcp_chat_core::ChatReply::new("2", None)));

        let rendered = render_conversation(store.messages(), |_| false);
        assert!(rendered.contains("Agent #1: 1"));
        assert!(rendered.contains("Agent #2: 2"));

        assert_eq!(nth_reply(store.messages(), 2).map(|m| m.text.as_str()), Some("2"));
        assert!(nth_reply(store.messages(), 0).is_none());
        assert!(nth_reply(store.messages(), 3).is_none());
    }

    #[test]
    fn test_draft_counter() {
        assert_eq!(render_draft("hello", 500), "Draft: hello  (5/500)");
    }

    #[test]
    fn test_suggestions_are_numbered_from_one() {
        let rendered = render_suggestions(&["What is 2+2?".to_string()]);
        assert!(rendered.contains("1. \"What is 2+2?\""));
    }
}
