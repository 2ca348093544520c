// Re-export async trait for transport implementations
pub use async_trait::async_trait;

// Re-export chrono so the emit macros can stamp tool calls
pub use chrono;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Prefix that marks a structured execution event on a producer's stderr
pub const EVENT_PREFIX: &str = "__AT_EVENT__:";

/// Generate a fresh message id for a producer run
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Kind of agent that produced a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Single-shot agent whose content streams directly into the message
    React,
    /// Agent whose content is distributed across phases
    #[default]
    MultiPhase,
}

/// Lifecycle status of a phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }

    /// Returns true when `self -> next` is a legal phase transition.
    ///
    /// A pending phase may fail without running, since failures can be
    /// reported for planned work; nothing leaves a terminal state.
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Skipped)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

/// Lifecycle status of a nested sub-agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubagentStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl SubagentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Lifecycle status of a tool invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    #[default]
    Pending,
    WaitingConfirmation,
    Executing,
    Completed,
    Failed,
}

impl ToolCallStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true when `self -> next` is a legal tool-call transition.
    ///
    /// `waiting_confirmation -> executing` and `waiting_confirmation -> failed`
    /// are only reachable through an explicit confirm or cancel action.
    pub fn can_transition_to(self, next: ToolCallStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::WaitingConfirmation)
                | (Self::Pending, Self::Executing)
                | (Self::WaitingConfirmation, Self::Executing)
                | (Self::WaitingConfirmation, Self::Failed)
                | (Self::Executing, Self::Completed)
                | (Self::Executing, Self::Failed)
        )
    }
}

/// Execution events delivered by the transport for a single message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// Phase announced ahead of time; stays pending until started
    PhasePlanned {
        phase_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        component_key: Option<String>,
    },
    PhaseStarted {
        phase_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        component_key: Option<String>,
    },
    /// Incremental phase output
    PhaseContentChunk { phase_id: String, chunk: String },
    PhaseCompleted {
        phase_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_summary: Option<String>,
    },
    PhaseFailed {
        phase_id: String,
        error_type: String,
        error_message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
    },
    PhaseSkipped { phase_id: String },
    /// Direct content of a react-style agent
    AgentContentChunk { chunk: String },
    SubagentSpawned { id: String, name: String, depth: u32 },
    SubagentFinished {
        id: String,
        duration_ms: u64,
        success: bool,
    },
    ToolCallRequested {
        phase_id: String,
        tool_call_id: String,
        name: String,
        #[serde(default)]
        arguments: Value,
        #[serde(default)]
        requires_confirmation: bool,
        timestamp: DateTime<Utc>,
    },
    /// Approval requested for a call that was registered as pending
    ToolCallConfirmationRequested { tool_call_id: String },
    ToolCallStarted { tool_call_id: String },
    ToolCallResult { tool_call_id: String, result: Value },
    ToolCallError { tool_call_id: String, error: String },
    /// User approved a call awaiting confirmation
    ToolCallConfirmed { tool_call_id: String },
    /// User rejected a call awaiting confirmation
    ToolCallCancelled { tool_call_id: String },
}

impl ExecutionEvent {
    /// Stable tag of this event, matching its serialized `type`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PhasePlanned { .. } => "phase_planned",
            Self::PhaseStarted { .. } => "phase_started",
            Self::PhaseContentChunk { .. } => "phase_content_chunk",
            Self::PhaseCompleted { .. } => "phase_completed",
            Self::PhaseFailed { .. } => "phase_failed",
            Self::PhaseSkipped { .. } => "phase_skipped",
            Self::AgentContentChunk { .. } => "agent_content_chunk",
            Self::SubagentSpawned { .. } => "subagent_spawned",
            Self::SubagentFinished { .. } => "subagent_finished",
            Self::ToolCallRequested { .. } => "tool_call_requested",
            Self::ToolCallConfirmationRequested { .. } => "tool_call_confirmation_requested",
            Self::ToolCallStarted { .. } => "tool_call_started",
            Self::ToolCallResult { .. } => "tool_call_result",
            Self::ToolCallError { .. } => "tool_call_error",
            Self::ToolCallConfirmed { .. } => "tool_call_confirmed",
            Self::ToolCallCancelled { .. } => "tool_call_cancelled",
        }
    }

    /// Phase this event targets, if any
    pub fn phase_id(&self) -> Option<&str> {
        match self {
            Self::PhasePlanned { phase_id, .. }
            | Self::PhaseStarted { phase_id, .. }
            | Self::PhaseContentChunk { phase_id, .. }
            | Self::PhaseCompleted { phase_id, .. }
            | Self::PhaseFailed { phase_id, .. }
            | Self::PhaseSkipped { phase_id }
            | Self::ToolCallRequested { phase_id, .. } => Some(phase_id),
            _ => None,
        }
    }

    /// Tool call this event targets, if any
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Self::ToolCallRequested { tool_call_id, .. }
            | Self::ToolCallConfirmationRequested { tool_call_id }
            | Self::ToolCallStarted { tool_call_id }
            | Self::ToolCallResult { tool_call_id, .. }
            | Self::ToolCallError { tool_call_id, .. }
            | Self::ToolCallConfirmed { tool_call_id }
            | Self::ToolCallCancelled { tool_call_id } => Some(tool_call_id),
            _ => None,
        }
    }
}

/// One event scoped to the chat message it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEnvelope {
    pub message_id: String,
    /// Only consulted when the first event for a message arrives
    #[serde(default)]
    pub agent_type: AgentType,
    pub event: ExecutionEvent,
}

impl ExecutionEnvelope {
    pub fn new(message_id: impl Into<String>, event: ExecutionEvent) -> Self {
        Self {
            message_id: message_id.into(),
            agent_type: AgentType::default(),
            event,
        }
    }

    pub fn with_agent_type(mut self, agent_type: AgentType) -> Self {
        self.agent_type = agent_type;
        self
    }

    /// Serialize as a prefixed line understood by the timeline ingest
    pub fn to_line(&self) -> serde_json::Result<String> {
        Ok(format!("{}{}", EVENT_PREFIX, serde_json::to_string(self)?))
    }

    /// Emit this event to stderr for the timeline to pick up
    pub fn emit(&self) {
        if let Ok(line) = self.to_line() {
            use std::io::Write;
            eprintln!("{}", line);
            // Force flush stderr in async/concurrent contexts
            let _ = std::io::stderr().flush();
        }
    }
}

/// Outbound request produced by a local confirm/cancel action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OutboundAction {
    Confirm {
        message_id: String,
        tool_call_id: String,
    },
    Cancel {
        message_id: String,
        tool_call_id: String,
    },
}

impl OutboundAction {
    pub fn message_id(&self) -> &str {
        match self {
            Self::Confirm { message_id, .. } | Self::Cancel { message_id, .. } => message_id,
        }
    }

    pub fn tool_call_id(&self) -> &str {
        match self {
            Self::Confirm { tool_call_id, .. } | Self::Cancel { tool_call_id, .. } => tool_call_id,
        }
    }
}

/// Errors reported by a transport while forwarding an outbound action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("transport disconnected")]
    Disconnected,
    #[error("remote runtime rejected {action}: {reason}")]
    Rejected { action: String, reason: String },
    #[error("transport error: {0}")]
    Other(String),
}

/// Transport collaborator that notifies the remote agent runtime
#[async_trait]
pub trait ActionTransport: Send + Sync {
    async fn send(&self, action: OutboundAction) -> Result<(), TransportError>;
}

/// Helper macros for producers
#[macro_export]
macro_rules! emit_phase_planned {
    ($message_id:expr, $phase_id:expr, $name:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::PhasePlanned {
                phase_id: $phase_id.to_string(),
                name: $name.to_string(),
                component_key: None,
            },
        )
        .emit();
    };
    ($message_id:expr, $phase_id:expr, $name:expr, $key:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::PhasePlanned {
                phase_id: $phase_id.to_string(),
                name: $name.to_string(),
                component_key: Some($key.to_string()),
            },
        )
        .emit();
    };
}

#[macro_export]
macro_rules! emit_phase_started {
    ($message_id:expr, $phase_id:expr, $name:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::PhaseStarted {
                phase_id: $phase_id.to_string(),
                name: $name.to_string(),
                component_key: None,
            },
        )
        .emit();
    };
    ($message_id:expr, $phase_id:expr, $name:expr, $key:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::PhaseStarted {
                phase_id: $phase_id.to_string(),
                name: $name.to_string(),
                component_key: Some($key.to_string()),
            },
        )
        .emit();
    };
}

#[macro_export]
macro_rules! emit_phase_chunk {
    ($message_id:expr, $phase_id:expr, $chunk:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::PhaseContentChunk {
                phase_id: $phase_id.to_string(),
                chunk: $chunk.to_string(),
            },
        )
        .emit();
    };
}

#[macro_export]
macro_rules! emit_phase_completed {
    ($message_id:expr, $phase_id:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::PhaseCompleted {
                phase_id: $phase_id.to_string(),
                output_summary: None,
            },
        )
        .emit();
    };
    ($message_id:expr, $phase_id:expr, $summary:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::PhaseCompleted {
                phase_id: $phase_id.to_string(),
                output_summary: Some($summary.to_string()),
            },
        )
        .emit();
    };
}

#[macro_export]
macro_rules! emit_phase_failed {
    ($message_id:expr, $phase_id:expr, $error_type:expr, $error:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::PhaseFailed {
                phase_id: $phase_id.to_string(),
                error_type: $error_type.to_string(),
                error_message: $error.to_string(),
                node_id: None,
            },
        )
        .emit();
    };
}

#[macro_export]
macro_rules! emit_subagent_spawned {
    ($message_id:expr, $id:expr, $name:expr, $depth:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::SubagentSpawned {
                id: $id.to_string(),
                name: $name.to_string(),
                depth: $depth,
            },
        )
        .emit();
    };
}

#[macro_export]
macro_rules! emit_subagent_finished {
    ($message_id:expr, $id:expr, $duration_ms:expr, $success:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::SubagentFinished {
                id: $id.to_string(),
                duration_ms: $duration_ms,
                success: $success,
            },
        )
        .emit();
    };
}

#[macro_export]
macro_rules! emit_tool_call {
    ($message_id:expr, $phase_id:expr, $id:expr, $name:expr, $args:expr) => {
        $crate::emit_tool_call!($message_id, $phase_id, $id, $name, $args, false)
    };
    ($message_id:expr, $phase_id:expr, $id:expr, $name:expr, $args:expr, $confirm:expr) => {
        $crate::ExecutionEnvelope::new(
            $message_id.to_string(),
            $crate::ExecutionEvent::ToolCallRequested {
                phase_id: $phase_id.to_string(),
                tool_call_id: $id.to_string(),
                name: $name.to_string(),
                arguments: $args,
                requires_confirmation: $confirm,
                timestamp: $crate::chrono::Utc::now(),
            },
        )
        .emit();
    };
}
