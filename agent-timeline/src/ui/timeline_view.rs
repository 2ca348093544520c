//! Whole-message timeline rendering

use agent_timeline_sdk::{AgentType, ToolCallStatus};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};

use super::components::{agent_status_label, subagent_icon, tool_call_color, tool_call_icon};
use crate::models::{AgentExecutionState, ToolCall};
use crate::registry::RendererRegistry;

/// Deeper sub-agents render at this nesting level
pub const MAX_INDENT_DEPTH: u32 = 8;

/// Presentation switches for [`render_timeline`]
#[derive(Debug, Clone)]
pub struct TimelineOptions {
    pub show_subagents: bool,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            show_subagents: true,
        }
    }
}

/// Render one message's execution as styled text.
///
/// Phases appear in arrival order, each through the strategy its component
/// key selects. Only the most recently started running phase is active.
pub fn render_timeline(
    state: &AgentExecutionState,
    registry: &RendererRegistry,
    options: &TimelineOptions,
) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    let status = state.status();
    lines.push(Line::from(vec![
        Span::styled(
            format!("message {}", state.message_id),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" [{}]", agent_status_label(status)),
            Style::default().fg(Color::DarkGray),
        ),
    ]));

    if let Some(error) = &state.error {
        let mut text = format!("✗ {}: {}", error.error_type, error.message);
        if let Some(node_id) = &error.node_id {
            text.push_str(&format!(" (at {})", node_id));
        }
        lines.push(Line::from(Span::styled(
            text,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    if state.agent_type == AgentType::React && !state.content.is_empty() {
        for line in state.content.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    let active_id = state.active_phase().map(|p| p.id.as_str());
    for phase in &state.phases {
        let is_active = active_id == Some(phase.id.as_str());
        lines.extend(registry.render(phase, is_active).lines);
        for call in state.tool_calls_for(&phase.id) {
            lines.push(tool_call_pill(call));
        }
    }

    if options.show_subagents && !state.subagents.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Sub-agents:",
            Style::default().fg(Color::Cyan),
        )));
        for subagent in &state.subagents {
            let (icon, color) = subagent_icon(subagent.status);
            let indent = "  ".repeat(subagent.depth.min(MAX_INDENT_DEPTH) as usize + 1);
            let mut spans = vec![
                Span::raw(indent),
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::raw(subagent.name.clone()),
            ];
            if let Some(ms) = subagent.duration_ms {
                spans.push(Span::styled(
                    format!(" ({})", format_duration(ms)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            lines.push(Line::from(spans));
        }
    }

    Text::from(lines)
}

fn tool_call_pill(call: &ToolCall) -> Line<'static> {
    let color = tool_call_color(call.status);
    let mut spans = vec![
        Span::raw("    "),
        Span::styled(
            format!("[{} {}]", tool_call_icon(call.status), call.name),
            Style::default().fg(color),
        ),
    ];
    match call.status {
        ToolCallStatus::WaitingConfirmation => spans.push(Span::styled(
            " awaiting confirmation",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        ToolCallStatus::Failed if call.cancelled => spans.push(Span::styled(
            " cancelled",
            Style::default().fg(Color::DarkGray),
        )),
        ToolCallStatus::Failed => {
            if let Some(error) = &call.error {
                spans.push(Span::styled(
                    format!(" {}", error),
                    Style::default().fg(Color::Red),
                ));
            }
        }
        _ => {}
    }
    Line::from(spans)
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}
