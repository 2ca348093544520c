//! Command pattern for runtime communication
//!
//! [`TimelineCommand`] is everything a [`TimelineHandle`](crate::runtime::TimelineHandle)
//! can ask of the runtime task. [`StateChange`] is what the runtime
//! broadcasts back after a command changed state.

use agent_timeline_sdk::{ExecutionEnvelope, OutboundAction};
use tokio::sync::oneshot;

use crate::error::Result;
use crate::models::AgentExecutionState;

/// Commands sent to the runtime task
#[derive(Debug)]
pub enum TimelineCommand {
    /// Reconcile one inbound event
    Ingest(ExecutionEnvelope),

    /// User approved a tool call
    Confirm {
        message_id: String,
        tool_call_id: String,
        reply: oneshot::Sender<Result<OutboundAction>>,
    },

    /// User rejected a tool call
    Cancel {
        message_id: String,
        tool_call_id: String,
        reply: oneshot::Sender<Result<OutboundAction>>,
    },

    /// Clone of one message's current state
    Snapshot {
        message_id: String,
        reply: oneshot::Sender<Option<AgentExecutionState>>,
    },

    /// Drop a message and abort its outbound sends
    Evict { message_id: String },

    /// Stop the runtime after draining earlier commands
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Updated,
    Evicted,
}

/// Notification that a message's state changed
///
/// Carries no state; subscribers take a snapshot if they need one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub message_id: String,
    /// Store revision after the change; 0 for evictions
    pub revision: u64,
    pub kind: ChangeKind,
}
