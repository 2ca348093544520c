//! Phase view-state

use agent_timeline_sdk::ExecutionStatus;
use serde::{Deserialize, Serialize};

/// One named unit of agent work within a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseExecution {
    /// Unique within the owning message
    pub id: String,
    pub name: String,
    /// Selects a renderer; `None` renders with the default strategy
    pub component_key: Option<String>,
    pub status: ExecutionStatus,
    /// Append-only until the phase is terminal
    pub streamed_content: String,
    /// Set at most once, usually on completion
    pub output_summary: Option<String>,
    /// Ids of tool calls attributed to this phase, in arrival order
    pub tool_calls: Vec<String>,
}

impl PhaseExecution {
    pub fn new(id: impl Into<String>, name: impl Into<String>, component_key: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            component_key,
            status: ExecutionStatus::Pending,
            streamed_content: String::new(),
            output_summary: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `next` if the transition is legal; returns whether it moved.
    pub(crate) fn transition(&mut self, next: ExecutionStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}
