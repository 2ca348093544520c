//! Nested sub-agent view-state

use agent_timeline_sdk::SubagentStatus;
use serde::{Deserialize, Serialize};

/// A nested execution spawned by a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subagent {
    pub id: String,
    pub name: String,
    /// Nesting level, 0 for agents spawned directly by the message's agent
    pub depth: u32,
    pub status: SubagentStatus,
    /// Populated on the terminal transition
    pub duration_ms: Option<u64>,
}
