//! Presentation glue for reconciled executions
//!
//! Turns an [`AgentExecutionState`](crate::models::AgentExecutionState) into
//! ratatui text. Everything here is read-only over the state.

// Module declarations
mod components;
mod phase_views;
mod timeline_view;

// Re-export public functions
pub use components::{agent_status_label, phase_icon, to_plain_lines, tool_call_icon};
pub use phase_views::{DefaultPhaseRenderer, PlanRenderer, SummaryRenderer};
pub use timeline_view::{render_timeline, TimelineOptions, MAX_INDENT_DEPTH};
