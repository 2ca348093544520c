//! Error types for the timeline core
//!
//! Protocol anomalies never surface here; they degrade to ignored events.
//! These errors cover local usage mistakes and setup-time configuration.

use agent_timeline_sdk::ToolCallStatus;

/// Errors returned across the public boundary of the timeline
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    #[error("unknown tool call: {0}")]
    UnknownToolCall(String),

    #[error("tool call {id} is not awaiting confirmation (status: {status:?})")]
    NotAwaitingConfirmation { id: String, status: ToolCallStatus },

    #[error("invalid renderer key {0:?}: keys must be non-empty and contain no whitespace")]
    InvalidRendererKey(String),

    #[error("unknown message: {0}")]
    UnknownMessage(String),

    #[error("timeline runtime is closed")]
    RuntimeClosed,
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;
