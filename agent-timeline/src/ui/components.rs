//! Shared icons, colors and text helpers

use agent_timeline_sdk::{ExecutionStatus, SubagentStatus, ToolCallStatus};
use ratatui::style::Color;
use ratatui::text::Text;

use crate::models::AgentStatus;

pub fn phase_icon(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Pending => "○",
        ExecutionStatus::Running => "▶",
        ExecutionStatus::Completed => "✓",
        ExecutionStatus::Failed => "✗",
        ExecutionStatus::Skipped => "⊘",
    }
}

pub(crate) fn phase_color(status: ExecutionStatus) -> Color {
    match status {
        ExecutionStatus::Pending | ExecutionStatus::Skipped => Color::Gray,
        ExecutionStatus::Running => Color::Yellow,
        ExecutionStatus::Completed => Color::White,
        ExecutionStatus::Failed => Color::Red,
    }
}

pub fn tool_call_icon(status: ToolCallStatus) -> &'static str {
    match status {
        ToolCallStatus::Pending => "○",
        ToolCallStatus::WaitingConfirmation => "?",
        ToolCallStatus::Executing => "⚙",
        ToolCallStatus::Completed => "✓",
        ToolCallStatus::Failed => "✗",
    }
}

pub(crate) fn tool_call_color(status: ToolCallStatus) -> Color {
    match status {
        ToolCallStatus::Pending => Color::Gray,
        ToolCallStatus::WaitingConfirmation => Color::Cyan,
        ToolCallStatus::Executing => Color::Yellow,
        ToolCallStatus::Completed => Color::Green,
        ToolCallStatus::Failed => Color::Red,
    }
}

pub(crate) fn subagent_icon(status: SubagentStatus) -> (&'static str, Color) {
    match status {
        SubagentStatus::Pending => ("○", Color::Gray),
        SubagentStatus::Running => ("▶", Color::Yellow),
        SubagentStatus::Completed => ("✓", Color::White),
        SubagentStatus::Failed => ("✗", Color::Red),
    }
}

pub fn agent_status_label(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Pending => "pending",
        AgentStatus::Running => "running",
        AgentStatus::Completed => "completed",
        AgentStatus::Failed => "failed",
    }
}

/// Flatten styled text into plain lines for non-terminal output
pub fn to_plain_lines(text: &Text<'_>) -> Vec<String> {
    text.lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect()
}
