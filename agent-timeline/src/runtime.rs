//! Runtime task owning the execution store
//!
//! A single tokio task owns the [`ExecutionStore`] and applies commands in
//! channel order, so every message has exactly one writer. Callers talk to
//! it through a cloneable [`TimelineHandle`] and learn about changes from a
//! broadcast channel.

use std::sync::Arc;

use agent_timeline_sdk::{ActionTransport, ExecutionEnvelope, OutboundAction, TransportError};
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commands::{ChangeKind, StateChange, TimelineCommand};
use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use crate::models::AgentExecutionState;
use crate::store::ExecutionStore;
use crate::task_registry::TaskRegistry;

pub struct TimelineRuntime {
    store: ExecutionStore,
    transport: Arc<dyn ActionTransport>,
    tasks: TaskRegistry,
    changes: broadcast::Sender<StateChange>,
}

impl TimelineRuntime {
    /// Start the runtime task.
    ///
    /// The join handle yields the final store once the runtime shuts down or
    /// every handle is dropped.
    pub fn spawn(
        config: &TimelineConfig,
        transport: Arc<dyn ActionTransport>,
    ) -> (TimelineHandle, JoinHandle<ExecutionStore>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (changes, _) = broadcast::channel(config.change_channel_capacity.max(1));

        let handle = TimelineHandle {
            commands: command_tx,
            changes: changes.clone(),
        };
        let runtime = Self {
            store: ExecutionStore::new(),
            transport,
            tasks: TaskRegistry::new(),
            changes,
        };
        let join = tokio::spawn(runtime.run(command_rx));
        (handle, join)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<TimelineCommand>) -> ExecutionStore {
        info!("timeline runtime started");
        while let Some(command) = commands.recv().await {
            match command {
                TimelineCommand::Ingest(envelope) => self.ingest(envelope),
                TimelineCommand::Confirm {
                    message_id,
                    tool_call_id,
                    reply,
                } => {
                    let result = self.store.confirm(&message_id, &tool_call_id);
                    self.after_user_action(&message_id, &result);
                    let _ = reply.send(result);
                }
                TimelineCommand::Cancel {
                    message_id,
                    tool_call_id,
                    reply,
                } => {
                    let result = self.store.cancel(&message_id, &tool_call_id);
                    self.after_user_action(&message_id, &result);
                    let _ = reply.send(result);
                }
                TimelineCommand::Snapshot { message_id, reply } => {
                    let _ = reply.send(self.store.get(&message_id).cloned());
                }
                TimelineCommand::Evict { message_id } => self.evict(&message_id),
                TimelineCommand::Shutdown => break,
            }
        }

        self.tasks.cancel_everything();
        info!(messages = self.store.len(), "timeline runtime stopped");
        self.store
    }

    fn ingest(&mut self, envelope: ExecutionEnvelope) {
        let message_id = envelope.message_id.clone();
        if self.store.apply(envelope).is_changed() {
            self.notify(&message_id, ChangeKind::Updated);
        }
    }

    fn after_user_action(&mut self, message_id: &str, result: &Result<OutboundAction>) {
        let Ok(action) = result else {
            return;
        };
        self.notify(message_id, ChangeKind::Updated);

        let transport = Arc::clone(&self.transport);
        let action = action.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = transport.send(action.clone()).await {
                warn!(
                    message_id = action.message_id(),
                    tool_call_id = action.tool_call_id(),
                    error = %e,
                    "failed to forward tool call action"
                );
            }
        });
        self.tasks.register(message_id, handle);
    }

    fn evict(&mut self, message_id: &str) {
        let aborted = self.tasks.cancel_all(message_id);
        if aborted > 0 {
            debug!(message_id, aborted, "aborted in-flight actions");
        }
        if self.store.evict(message_id).is_some() {
            let _ = self.changes.send(StateChange {
                message_id: message_id.to_string(),
                revision: 0,
                kind: ChangeKind::Evicted,
            });
        }
    }

    fn notify(&self, message_id: &str, kind: ChangeKind) {
        // No receivers is fine; nobody is watching yet.
        let _ = self.changes.send(StateChange {
            message_id: message_id.to_string(),
            revision: self.store.revision(message_id),
            kind,
        });
    }
}

/// Cloneable front end of a running [`TimelineRuntime`]
#[derive(Debug, Clone)]
pub struct TimelineHandle {
    commands: mpsc::UnboundedSender<TimelineCommand>,
    changes: broadcast::Sender<StateChange>,
}

impl TimelineHandle {
    /// Queue an inbound event; it is applied after everything queued before it.
    pub fn ingest(&self, envelope: ExecutionEnvelope) -> Result<()> {
        self.send(TimelineCommand::Ingest(envelope))
    }

    pub async fn confirm(&self, message_id: &str, tool_call_id: &str) -> Result<OutboundAction> {
        let (reply, rx) = oneshot::channel();
        self.send(TimelineCommand::Confirm {
            message_id: message_id.to_string(),
            tool_call_id: tool_call_id.to_string(),
            reply,
        })?;
        rx.await.map_err(|_| TimelineError::RuntimeClosed)?
    }

    pub async fn cancel(&self, message_id: &str, tool_call_id: &str) -> Result<OutboundAction> {
        let (reply, rx) = oneshot::channel();
        self.send(TimelineCommand::Cancel {
            message_id: message_id.to_string(),
            tool_call_id: tool_call_id.to_string(),
            reply,
        })?;
        rx.await.map_err(|_| TimelineError::RuntimeClosed)?
    }

    /// Current state of a message, `None` if it is not tracked
    pub async fn snapshot(&self, message_id: &str) -> Result<Option<AgentExecutionState>> {
        let (reply, rx) = oneshot::channel();
        self.send(TimelineCommand::Snapshot {
            message_id: message_id.to_string(),
            reply,
        })?;
        rx.await.map_err(|_| TimelineError::RuntimeClosed)
    }

    pub fn evict(&self, message_id: &str) -> Result<()> {
        self.send(TimelineCommand::Evict {
            message_id: message_id.to_string(),
        })
    }

    /// Receive a [`StateChange`] for every change applied after this call
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(TimelineCommand::Shutdown)
    }

    fn send(&self, command: TimelineCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| TimelineError::RuntimeClosed)
    }
}

/// Transport that drops every action
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransport;

#[async_trait]
impl ActionTransport for NoopTransport {
    async fn send(&self, action: OutboundAction) -> std::result::Result<(), TransportError> {
        debug!(?action, "dropping outbound action");
        Ok(())
    }
}

/// Transport that writes each action to stdout as one JSON line
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTransport;

#[async_trait]
impl ActionTransport for LoggingTransport {
    async fn send(&self, action: OutboundAction) -> std::result::Result<(), TransportError> {
        let line =
            serde_json::to_string(&action).map_err(|e| TransportError::Other(e.to_string()))?;
        info!(
            message_id = action.message_id(),
            tool_call_id = action.tool_call_id(),
            "outbound action"
        );
        println!("{}", line);
        Ok(())
    }
}
