//! Tool-call lifecycle manager
//!
//! Drives [`ToolCall`] state transitions for inbound events and for the two
//! user actions, confirm and cancel. The user actions return the
//! [`OutboundAction`] the caller must forward to the transport; they never
//! perform I/O themselves.

use agent_timeline_sdk::{OutboundAction, ToolCallStatus};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, TimelineError};
use crate::models::{AgentExecutionState, ToolCall, CANCELLED_BY_USER};
use crate::reconciler::{Anomaly, Applied};

/// A new tool call announced by the agent runtime
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub tool_call_id: String,
    pub name: String,
    pub arguments: Value,
    /// Start in `waiting_confirmation` instead of `pending`
    pub requires_confirmation: bool,
    pub timestamp: DateTime<Utc>,
}

/// Which user action is being applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserAction {
    Confirm,
    Cancel,
}

/// Namespace for tool-call transitions over an execution state
pub struct ToolCallManager;

impl ToolCallManager {
    /// Register a new tool call under `phase_id`
    pub fn attach(
        state: &mut AgentExecutionState,
        phase_id: &str,
        request: ToolCallRequest,
    ) -> Applied {
        if state.tool_call(&request.tool_call_id).is_some() {
            return Applied::Ignored(Anomaly::Duplicate {
                kind: "tool_call",
                id: request.tool_call_id,
            });
        }
        let Some(phase) = state.phase_mut(phase_id) else {
            return Applied::Ignored(Anomaly::UnknownPhase(phase_id.to_string()));
        };
        phase.tool_calls.push(request.tool_call_id.clone());

        let status = if request.requires_confirmation {
            ToolCallStatus::WaitingConfirmation
        } else {
            ToolCallStatus::Pending
        };
        state.tool_calls.push(ToolCall {
            id: request.tool_call_id,
            phase_id: phase_id.to_string(),
            name: request.name,
            arguments: request.arguments,
            result: None,
            error: None,
            cancelled: false,
            timestamp: request.timestamp,
            status,
        });
        Applied::Changed
    }

    /// The runtime asked for approval of a call it registered as pending
    pub fn request_confirmation(state: &mut AgentExecutionState, tool_call_id: &str) -> Applied {
        Self::step(state, tool_call_id, ToolCallStatus::WaitingConfirmation)
    }

    /// The call started executing without needing confirmation
    pub fn start(state: &mut AgentExecutionState, tool_call_id: &str) -> Applied {
        Self::step(state, tool_call_id, ToolCallStatus::Executing)
    }

    pub fn on_result(state: &mut AgentExecutionState, tool_call_id: &str, result: Value) -> Applied {
        let applied = Self::step(state, tool_call_id, ToolCallStatus::Completed);
        if applied.is_changed() {
            if let Some(call) = state.tool_call_mut(tool_call_id) {
                call.result = Some(result);
            }
        }
        applied
    }

    pub fn on_error(state: &mut AgentExecutionState, tool_call_id: &str, error: String) -> Applied {
        let applied = Self::step(state, tool_call_id, ToolCallStatus::Failed);
        if applied.is_changed() {
            if let Some(call) = state.tool_call_mut(tool_call_id) {
                call.error = Some(error);
            }
        }
        applied
    }

    /// User approved the call; valid only while it awaits confirmation
    pub fn confirm(state: &mut AgentExecutionState, tool_call_id: &str) -> Result<OutboundAction> {
        let result = Self::user_action(state, tool_call_id, UserAction::Confirm);
        if let Err(e) = &result {
            warn!(message_id = %state.message_id, error = %e, "confirm rejected");
        }
        result
    }

    /// User rejected the call; valid only while it awaits confirmation
    pub fn cancel(state: &mut AgentExecutionState, tool_call_id: &str) -> Result<OutboundAction> {
        let result = Self::user_action(state, tool_call_id, UserAction::Cancel);
        if let Err(e) = &result {
            warn!(message_id = %state.message_id, error = %e, "cancel rejected");
        }
        result
    }

    /// Journal or echoed form of [`Self::confirm`]
    pub(crate) fn apply_confirmed(state: &mut AgentExecutionState, tool_call_id: &str) -> Applied {
        Self::as_applied(state, tool_call_id, UserAction::Confirm)
    }

    /// Journal or echoed form of [`Self::cancel`]
    pub(crate) fn apply_cancelled(state: &mut AgentExecutionState, tool_call_id: &str) -> Applied {
        Self::as_applied(state, tool_call_id, UserAction::Cancel)
    }

    fn as_applied(state: &mut AgentExecutionState, tool_call_id: &str, action: UserAction) -> Applied {
        match Self::user_action(state, tool_call_id, action) {
            Ok(_) => Applied::Changed,
            Err(TimelineError::NotAwaitingConfirmation { id, .. }) => {
                Applied::Ignored(Anomaly::Duplicate {
                    kind: "tool_call",
                    id,
                })
            }
            Err(_) => Applied::Ignored(Anomaly::UnknownToolCall(tool_call_id.to_string())),
        }
    }

    fn user_action(
        state: &mut AgentExecutionState,
        tool_call_id: &str,
        action: UserAction,
    ) -> Result<OutboundAction> {
        let message_id = state.message_id.clone();
        let call = state
            .tool_call_mut(tool_call_id)
            .ok_or_else(|| TimelineError::UnknownToolCall(tool_call_id.to_string()))?;
        if !call.is_awaiting_confirmation() {
            return Err(TimelineError::NotAwaitingConfirmation {
                id: tool_call_id.to_string(),
                status: call.status,
            });
        }

        let tool_call_id = tool_call_id.to_string();
        match action {
            UserAction::Confirm => {
                call.status = ToolCallStatus::Executing;
                info!(%message_id, %tool_call_id, tool = %call.name, "tool call confirmed");
                Ok(OutboundAction::Confirm {
                    message_id,
                    tool_call_id,
                })
            }
            UserAction::Cancel => {
                call.status = ToolCallStatus::Failed;
                call.cancelled = true;
                call.error = Some(CANCELLED_BY_USER.to_string());
                info!(%message_id, %tool_call_id, tool = %call.name, "tool call cancelled");
                Ok(OutboundAction::Cancel {
                    message_id,
                    tool_call_id,
                })
            }
        }
    }

    /// Move a call to `next` if the transition is legal.
    ///
    /// Runtime events never move a call out of `waiting_confirmation`; only
    /// the user actions do.
    fn step(state: &mut AgentExecutionState, tool_call_id: &str, next: ToolCallStatus) -> Applied {
        let Some(call) = state.tool_call_mut(tool_call_id) else {
            return Applied::Ignored(Anomaly::UnknownToolCall(tool_call_id.to_string()));
        };
        let from = call.status;
        let awaiting_user = from == ToolCallStatus::WaitingConfirmation && next != from;
        if !awaiting_user && call.transition(next) {
            Applied::Changed
        } else if !awaiting_user && (from == next || from.is_terminal()) {
            Applied::Ignored(Anomaly::Duplicate {
                kind: "tool_call",
                id: tool_call_id.to_string(),
            })
        } else {
            Applied::Ignored(Anomaly::InvalidToolCallTransition {
                tool_call_id: tool_call_id.to_string(),
                from,
                to: next,
            })
        }
    }
}
