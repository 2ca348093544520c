//! Built-in phase render strategies

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};

use super::components::{phase_color, phase_icon};
use crate::models::PhaseExecution;
use crate::registry::RenderStrategy;

/// Header line shared by every built-in strategy
fn header(phase: &PhaseExecution, is_active: bool) -> Line<'static> {
    let color = phase_color(phase.status);
    let mut name_style = Style::default().fg(color);
    if is_active {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }
    Line::from(vec![
        Span::styled(format!("{} ", phase_icon(phase.status)), Style::default().fg(color)),
        Span::styled(phase.name.clone(), name_style),
    ])
}

fn summary_line(summary: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(
            format!("→ {}", summary),
            Style::default().fg(Color::Green),
        ),
    ])
}

/// Fallback strategy: header, streamed content and summary
///
/// Inactive phases with more than `max_lines` lines of content are collapsed
/// to their first lines plus a marker.
#[derive(Debug, Clone, Default)]
pub struct DefaultPhaseRenderer {
    max_lines: Option<usize>,
}

impl DefaultPhaseRenderer {
    pub fn with_max_lines(max_lines: usize) -> Self {
        Self {
            max_lines: Some(max_lines),
        }
    }
}

impl RenderStrategy for DefaultPhaseRenderer {
    fn render(&self, phase: &PhaseExecution, is_active: bool) -> Text<'static> {
        let mut lines = vec![header(phase, is_active)];

        let content: Vec<&str> = phase.streamed_content.lines().collect();
        let limit = match self.max_lines {
            Some(max) if !is_active && content.len() > max => max,
            _ => content.len(),
        };
        for line in &content[..limit] {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(line.to_string(), Style::default().fg(Color::Gray)),
            ]));
        }
        if limit < content.len() {
            lines.push(Line::from(Span::styled(
                format!("  … ({} more lines)", content.len() - limit),
                Style::default().fg(Color::DarkGray),
            )));
        }

        if let Some(summary) = &phase.output_summary {
            lines.push(summary_line(summary));
        }
        Text::from(lines)
    }
}

/// Renders streamed content as a numbered step list, one step per line
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanRenderer;

impl RenderStrategy for PlanRenderer {
    fn render(&self, phase: &PhaseExecution, is_active: bool) -> Text<'static> {
        let mut lines = vec![header(phase, is_active)];
        let steps = phase
            .streamed_content
            .lines()
            .map(str::trim)
            .filter(|step| !step.is_empty());
        for (i, step) in steps.enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}. ", i + 1), Style::default().fg(Color::Cyan)),
                Span::raw(step.to_string()),
            ]));
        }
        Text::from(lines)
    }
}

/// Compact card: header plus the summary only
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryRenderer;

impl RenderStrategy for SummaryRenderer {
    fn render(&self, phase: &PhaseExecution, is_active: bool) -> Text<'static> {
        let mut lines = vec![header(phase, is_active)];
        match &phase.output_summary {
            Some(summary) => lines.push(summary_line(summary)),
            None if is_active => lines.push(Line::from(Span::styled(
                "  working…",
                Style::default().fg(Color::Yellow),
            ))),
            None => {}
        }
        Text::from(lines)
    }
}
