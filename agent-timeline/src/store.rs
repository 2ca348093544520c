//! Execution state store
//!
//! Owns the mapping from message id to [`AgentExecutionState`] together with
//! the ordered event journal that produced each state. All mutation goes
//! through [`ExecutionStore::apply`], [`ExecutionStore::confirm`] and
//! [`ExecutionStore::cancel`]; readers only get shared references or clones.

use std::collections::HashMap;

use agent_timeline_sdk::{AgentType, ExecutionEnvelope, ExecutionEvent, OutboundAction};
use tracing::debug;

use crate::error::{Result, TimelineError};
use crate::models::AgentExecutionState;
use crate::reconciler::{self, Applied};
use crate::tool_calls::ToolCallManager;

/// Per-message state, journal and change counter
#[derive(Debug, Clone)]
struct Entry {
    state: AgentExecutionState,
    /// Every event in delivery order, including ignored ones
    journal: Vec<ExecutionEvent>,
    /// Bumped on every change
    revision: u64,
}

/// In-memory store of active message executions
#[derive(Debug, Default)]
pub struct ExecutionStore {
    entries: HashMap<String, Entry>,
    /// Message ids in first-seen order
    order: Vec<String>,
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, message_id: &str) -> Option<&AgentExecutionState> {
        self.entries.get(message_id).map(|entry| &entry.state)
    }

    /// Return the aggregate for `message_id`, creating an empty one if needed.
    ///
    /// `agent_type` is only used on creation.
    pub fn ensure(&mut self, message_id: &str, agent_type: AgentType) -> &AgentExecutionState {
        &self.entry(message_id, agent_type).state
    }

    /// Reconcile one envelope into its message's state
    pub fn apply(&mut self, envelope: ExecutionEnvelope) -> Applied {
        let ExecutionEnvelope {
            message_id,
            agent_type,
            event,
        } = envelope;

        let entry = self.entry(&message_id, agent_type);
        let applied = reconciler::apply(&mut entry.state, &event);
        entry.journal.push(event);
        if applied.is_changed() {
            entry.revision += 1;
        }
        applied
    }

    /// User confirmation of a tool call awaiting approval
    pub fn confirm(&mut self, message_id: &str, tool_call_id: &str) -> Result<OutboundAction> {
        let entry = self.existing(message_id)?;
        let action = ToolCallManager::confirm(&mut entry.state, tool_call_id)?;
        entry.journal.push(ExecutionEvent::ToolCallConfirmed {
            tool_call_id: tool_call_id.to_string(),
        });
        entry.revision += 1;
        Ok(action)
    }

    /// User cancellation of a tool call awaiting approval
    pub fn cancel(&mut self, message_id: &str, tool_call_id: &str) -> Result<OutboundAction> {
        let entry = self.existing(message_id)?;
        let action = ToolCallManager::cancel(&mut entry.state, tool_call_id)?;
        entry.journal.push(ExecutionEvent::ToolCallCancelled {
            tool_call_id: tool_call_id.to_string(),
        });
        entry.revision += 1;
        Ok(action)
    }

    /// Ordered log of events applied to `message_id`
    pub fn journal(&self, message_id: &str) -> &[ExecutionEvent] {
        self.entries
            .get(message_id)
            .map(|entry| entry.journal.as_slice())
            .unwrap_or_default()
    }

    /// Number of changes applied to `message_id` so far
    pub fn revision(&self, message_id: &str) -> u64 {
        self.entries
            .get(message_id)
            .map(|entry| entry.revision)
            .unwrap_or(0)
    }

    /// Drop a message that left the active conversation
    pub fn evict(&mut self, message_id: &str) -> Option<AgentExecutionState> {
        let entry = self.entries.remove(message_id)?;
        self.order.retain(|id| id != message_id);
        debug!(message_id, events = entry.journal.len(), "evicted execution");
        Some(entry.state)
    }

    pub fn message_ids(&self) -> &[String] {
        &self.order
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&mut self, message_id: &str, agent_type: AgentType) -> &mut Entry {
        if !self.entries.contains_key(message_id) {
            debug!(message_id, ?agent_type, "tracking new execution");
            self.order.push(message_id.to_string());
        }
        self.entries
            .entry(message_id.to_string())
            .or_insert_with(|| Entry {
                state: AgentExecutionState::new(message_id, agent_type),
                journal: Vec::new(),
                revision: 0,
            })
    }

    fn existing(&mut self, message_id: &str) -> Result<&mut Entry> {
        self.entries
            .get_mut(message_id)
            .ok_or_else(|| TimelineError::UnknownMessage(message_id.to_string()))
    }
}

/// Rebuild a message's state from its event log
pub fn replay<'a>(
    message_id: &str,
    agent_type: AgentType,
    events: impl IntoIterator<Item = &'a ExecutionEvent>,
) -> AgentExecutionState {
    let mut state = AgentExecutionState::new(message_id, agent_type);
    reconciler::apply_all(&mut state, events);
    state
}
