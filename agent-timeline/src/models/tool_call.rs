//! Tool invocation view-state

use agent_timeline_sdk::ToolCallStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error text recorded on a call the user cancelled
pub const CANCELLED_BY_USER: &str = "cancelled by user";

/// A single tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    /// Phase the call is attributed to
    pub phase_id: String,
    pub name: String,
    pub arguments: Value,
    pub result: Option<Value>,
    pub error: Option<String>,
    /// Set when the call failed because the user cancelled it
    pub cancelled: bool,
    /// Taken from the event, never from the local clock
    pub timestamp: DateTime<Utc>,
    pub status: ToolCallStatus,
}

impl ToolCall {
    pub fn is_awaiting_confirmation(&self) -> bool {
        self.status == ToolCallStatus::WaitingConfirmation
    }

    pub(crate) fn transition(&mut self, next: ToolCallStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}
