//! Phase reconciler
//!
//! Folds one [`ExecutionEvent`] into a message's [`AgentExecutionState`].
//! Every transition is idempotent under replay: an event that was already
//! applied, or that arrives after the target reached a terminal state, is
//! reported as [`Applied::Ignored`] and logged, never raised.

use agent_timeline_sdk::{ExecutionEvent, ExecutionStatus, SubagentStatus, ToolCallStatus};
use tracing::{debug, warn};

use crate::models::{AgentExecutionState, ExecutionError, PhaseExecution, Subagent};
use crate::tool_calls::{ToolCallManager, ToolCallRequest};

/// Outcome of applying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// State changed; subscribers should re-read it
    Changed,
    /// Event had no effect
    Ignored(Anomaly),
}

impl Applied {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }

    pub fn anomaly(&self) -> Option<&Anomaly> {
        match self {
            Self::Changed => None,
            Self::Ignored(anomaly) => Some(anomaly),
        }
    }
}

/// Why an event was ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    UnknownPhase(String),
    UnknownToolCall(String),
    UnknownSubagent(String),
    /// The entity already exists or the event was already applied
    Duplicate { kind: &'static str, id: String },
    /// Phase already reached a terminal status
    TerminalPhase {
        phase_id: String,
        status: ExecutionStatus,
    },
    /// Subagent already finished
    TerminalSubagent(String),
    InvalidPhaseTransition {
        phase_id: String,
        from: ExecutionStatus,
        to: ExecutionStatus,
    },
    InvalidToolCallTransition {
        tool_call_id: String,
        from: ToolCallStatus,
        to: ToolCallStatus,
    },
}

impl Anomaly {
    /// Replays and late deliveries are expected; everything else is a protocol violation.
    fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::Duplicate { .. } | Self::TerminalPhase { .. } | Self::TerminalSubagent(_)
        )
    }

    fn log(&self, message_id: &str, event_kind: &str) {
        if self.is_benign() {
            debug!(message_id, event = event_kind, anomaly = ?self, "ignored replayed event");
        } else {
            warn!(message_id, event = event_kind, anomaly = ?self, "ignored out-of-protocol event");
        }
    }
}

/// Apply one event to `state` in place
pub fn apply(state: &mut AgentExecutionState, event: &ExecutionEvent) -> Applied {
    let applied = match event {
        ExecutionEvent::PhasePlanned {
            phase_id,
            name,
            component_key,
        } => plan_phase(state, phase_id, name, component_key),
        ExecutionEvent::PhaseStarted {
            phase_id,
            name,
            component_key,
        } => start_phase(state, phase_id, name, component_key),
        ExecutionEvent::PhaseContentChunk { phase_id, chunk } => {
            append_chunk(state, phase_id, chunk)
        }
        ExecutionEvent::PhaseCompleted {
            phase_id,
            output_summary,
        } => complete_phase(state, phase_id, output_summary),
        ExecutionEvent::PhaseFailed {
            phase_id,
            error_type,
            error_message,
            node_id,
        } => fail_phase(
            state,
            phase_id,
            ExecutionError {
                error_type: error_type.clone(),
                message: error_message.clone(),
                node_id: node_id.clone(),
            },
        ),
        ExecutionEvent::PhaseSkipped { phase_id } => skip_phase(state, phase_id),
        ExecutionEvent::AgentContentChunk { chunk } => {
            state.content.push_str(chunk);
            Applied::Changed
        }
        ExecutionEvent::SubagentSpawned { id, name, depth } => {
            spawn_subagent(state, id, name, *depth)
        }
        ExecutionEvent::SubagentFinished {
            id,
            duration_ms,
            success,
        } => finish_subagent(state, id, *duration_ms, *success),
        ExecutionEvent::ToolCallRequested {
            phase_id,
            tool_call_id,
            name,
            arguments,
            requires_confirmation,
            timestamp,
        } => ToolCallManager::attach(
            state,
            phase_id,
            ToolCallRequest {
                tool_call_id: tool_call_id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
                requires_confirmation: *requires_confirmation,
                timestamp: *timestamp,
            },
        ),
        ExecutionEvent::ToolCallConfirmationRequested { tool_call_id } => {
            ToolCallManager::request_confirmation(state, tool_call_id)
        }
        ExecutionEvent::ToolCallStarted { tool_call_id } => {
            ToolCallManager::start(state, tool_call_id)
        }
        ExecutionEvent::ToolCallResult {
            tool_call_id,
            result,
        } => ToolCallManager::on_result(state, tool_call_id, result.clone()),
        ExecutionEvent::ToolCallError {
            tool_call_id,
            error,
        } => ToolCallManager::on_error(state, tool_call_id, error.clone()),
        ExecutionEvent::ToolCallConfirmed { tool_call_id } => {
            ToolCallManager::apply_confirmed(state, tool_call_id)
        }
        ExecutionEvent::ToolCallCancelled { tool_call_id } => {
            ToolCallManager::apply_cancelled(state, tool_call_id)
        }
    };

    if let Applied::Ignored(anomaly) = &applied {
        anomaly.log(&state.message_id, event.kind());
    }
    applied
}

/// Fold a whole event log into `state`, returning how many events changed it
pub fn apply_all<'a>(
    state: &mut AgentExecutionState,
    events: impl IntoIterator<Item = &'a ExecutionEvent>,
) -> usize {
    events
        .into_iter()
        .filter(|event| apply(state, event).is_changed())
        .count()
}

fn plan_phase(
    state: &mut AgentExecutionState,
    phase_id: &str,
    name: &str,
    component_key: &Option<String>,
) -> Applied {
    if state.phase(phase_id).is_some() {
        return Applied::Ignored(Anomaly::Duplicate {
            kind: "phase",
            id: phase_id.to_string(),
        });
    }
    state
        .phases
        .push(PhaseExecution::new(phase_id, name, component_key.clone()));
    Applied::Changed
}

fn start_phase(
    state: &mut AgentExecutionState,
    phase_id: &str,
    name: &str,
    component_key: &Option<String>,
) -> Applied {
    if state.phase(phase_id).is_none() {
        state
            .phases
            .push(PhaseExecution::new(phase_id, name, component_key.clone()));
    }

    // Identity fields of an existing phase are left untouched
    let Some(phase) = state.phase_mut(phase_id) else {
        return Applied::Ignored(Anomaly::UnknownPhase(phase_id.to_string()));
    };
    if phase.transition(ExecutionStatus::Running) {
        Applied::Changed
    } else {
        Applied::Ignored(Anomaly::Duplicate {
            kind: "phase",
            id: phase_id.to_string(),
        })
    }
}

fn append_chunk(state: &mut AgentExecutionState, phase_id: &str, chunk: &str) -> Applied {
    let Some(phase) = state.phase_mut(phase_id) else {
        return Applied::Ignored(Anomaly::UnknownPhase(phase_id.to_string()));
    };
    if phase.is_terminal() {
        return Applied::Ignored(Anomaly::TerminalPhase {
            phase_id: phase_id.to_string(),
            status: phase.status,
        });
    }
    phase.streamed_content.push_str(chunk);
    Applied::Changed
}

fn complete_phase(
    state: &mut AgentExecutionState,
    phase_id: &str,
    output_summary: &Option<String>,
) -> Applied {
    let phase = match running_phase(state, phase_id, ExecutionStatus::Completed) {
        Ok(phase) => phase,
        Err(anomaly) => return Applied::Ignored(anomaly),
    };
    phase.status = ExecutionStatus::Completed;
    if phase.output_summary.is_none() {
        phase.output_summary = output_summary.clone();
    }
    Applied::Changed
}

fn fail_phase(state: &mut AgentExecutionState, phase_id: &str, error: ExecutionError) -> Applied {
    let transition = match state.phase_mut(phase_id) {
        // Stale replay of an already settled phase: leave everything alone
        Some(phase) if phase.is_terminal() => {
            return Applied::Ignored(Anomaly::TerminalPhase {
                phase_id: phase_id.to_string(),
                status: phase.status,
            })
        }
        // Planned phases may fail before they ever run
        Some(phase) => {
            phase.status = ExecutionStatus::Failed;
            Applied::Changed
        }
        None => Applied::Ignored(Anomaly::UnknownPhase(phase_id.to_string())),
    };

    // The failure is agent-level even when no phase could record it
    if state.error.is_none() {
        state.error = Some(error);
        return Applied::Changed;
    }
    transition
}

fn skip_phase(state: &mut AgentExecutionState, phase_id: &str) -> Applied {
    let Some(phase) = state.phase_mut(phase_id) else {
        return Applied::Ignored(Anomaly::UnknownPhase(phase_id.to_string()));
    };
    match phase.status {
        ExecutionStatus::Pending => {
            phase.status = ExecutionStatus::Skipped;
            Applied::Changed
        }
        // A phase that already started is never skipped
        ExecutionStatus::Running => Applied::Ignored(Anomaly::InvalidPhaseTransition {
            phase_id: phase_id.to_string(),
            from: ExecutionStatus::Running,
            to: ExecutionStatus::Skipped,
        }),
        status => Applied::Ignored(Anomaly::TerminalPhase {
            phase_id: phase_id.to_string(),
            status,
        }),
    }
}

/// Look up a phase that may move from running to `to`.
fn running_phase<'a>(
    state: &'a mut AgentExecutionState,
    phase_id: &str,
    to: ExecutionStatus,
) -> Result<&'a mut PhaseExecution, Anomaly> {
    let phase = state
        .phase_mut(phase_id)
        .ok_or_else(|| Anomaly::UnknownPhase(phase_id.to_string()))?;
    match phase.status {
        ExecutionStatus::Running => Ok(phase),
        status if status.is_terminal() => Err(Anomaly::TerminalPhase {
            phase_id: phase_id.to_string(),
            status,
        }),
        from => Err(Anomaly::InvalidPhaseTransition {
            phase_id: phase_id.to_string(),
            from,
            to,
        }),
    }
}

fn spawn_subagent(state: &mut AgentExecutionState, id: &str, name: &str, depth: u32) -> Applied {
    if state.subagent(id).is_some() {
        return Applied::Ignored(Anomaly::Duplicate {
            kind: "subagent",
            id: id.to_string(),
        });
    }
    state.subagents.push(Subagent {
        id: id.to_string(),
        name: name.to_string(),
        depth,
        status: SubagentStatus::Running,
        duration_ms: None,
    });
    Applied::Changed
}

fn finish_subagent(
    state: &mut AgentExecutionState,
    id: &str,
    duration_ms: u64,
    success: bool,
) -> Applied {
    let Some(subagent) = state.subagent_mut(id) else {
        return Applied::Ignored(Anomaly::UnknownSubagent(id.to_string()));
    };
    if subagent.status.is_terminal() {
        return Applied::Ignored(Anomaly::TerminalSubagent(id.to_string()));
    }
    subagent.status = if success {
        SubagentStatus::Completed
    } else {
        SubagentStatus::Failed
    };
    subagent.duration_ms = Some(duration_ms);
    Applied::Changed
}
