//! Per-message execution aggregate

use agent_timeline_sdk::{AgentType, ExecutionStatus, ToolCallStatus};
use serde::{Deserialize, Serialize};

use super::{PhaseExecution, Subagent, ToolCall};

/// Overall status of a message's execution, derived from its phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Terminal agent-level error shown as a banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub node_id: Option<String>,
}

/// Aggregate root holding everything reconciled for one message
///
/// Created when the first event for a message arrives and mutated in place
/// by every later event. Only the reconciler writes to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExecutionState {
    pub message_id: String,
    pub agent_type: AgentType,
    /// Directly streamed content of react agents
    pub content: String,
    /// Arrival order of the first event naming each phase; never re-sorted
    pub phases: Vec<PhaseExecution>,
    /// Every tool call of the message in arrival order
    pub tool_calls: Vec<ToolCall>,
    pub subagents: Vec<Subagent>,
    /// Set by the first phase failure and never cleared
    pub error: Option<ExecutionError>,
}

impl AgentExecutionState {
    pub fn new(message_id: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            message_id: message_id.into(),
            agent_type,
            content: String::new(),
            phases: Vec::new(),
            tool_calls: Vec::new(),
            subagents: Vec::new(),
            error: None,
        }
    }

    /// Overall status, recomputed on every read
    pub fn status(&self) -> AgentStatus {
        let any = |status: ExecutionStatus| self.phases.iter().any(|p| p.status == status);

        if any(ExecutionStatus::Running) {
            AgentStatus::Running
        } else if any(ExecutionStatus::Failed) {
            AgentStatus::Failed
        } else if !self.phases.is_empty() && self.phases.iter().all(PhaseExecution::is_terminal) {
            AgentStatus::Completed
        } else {
            AgentStatus::Pending
        }
    }

    pub fn phase(&self, phase_id: &str) -> Option<&PhaseExecution> {
        self.phases.iter().find(|p| p.id == phase_id)
    }

    pub(crate) fn phase_mut(&mut self, phase_id: &str) -> Option<&mut PhaseExecution> {
        self.phases.iter_mut().find(|p| p.id == phase_id)
    }

    pub fn tool_call(&self, tool_call_id: &str) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|t| t.id == tool_call_id)
    }

    pub(crate) fn tool_call_mut(&mut self, tool_call_id: &str) -> Option<&mut ToolCall> {
        self.tool_calls.iter_mut().find(|t| t.id == tool_call_id)
    }

    pub fn subagent(&self, id: &str) -> Option<&Subagent> {
        self.subagents.iter().find(|s| s.id == id)
    }

    pub(crate) fn subagent_mut(&mut self, id: &str) -> Option<&mut Subagent> {
        self.subagents.iter_mut().find(|s| s.id == id)
    }

    /// Tool calls of one phase in the order the phase recorded them
    pub fn tool_calls_for<'a>(&'a self, phase_id: &str) -> Vec<&'a ToolCall> {
        self.phase(phase_id)
            .map(|phase| {
                phase
                    .tool_calls
                    .iter()
                    .filter_map(|id| self.tool_call(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids of tool calls waiting for the user, in arrival order
    pub fn awaiting_confirmation(&self) -> Vec<&str> {
        self.tool_calls
            .iter()
            .filter(|t| t.status == ToolCallStatus::WaitingConfirmation)
            .map(|t| t.id.as_str())
            .collect()
    }

    /// The most recently arrived running phase
    pub fn active_phase(&self) -> Option<&PhaseExecution> {
        self.phases
            .iter()
            .rev()
            .find(|p| p.status == ExecutionStatus::Running)
    }
}
