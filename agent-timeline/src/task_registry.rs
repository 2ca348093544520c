//! Task registry for outbound action lifecycle management
//!
//! Forwarding a confirm or cancel to the transport happens on a spawned
//! tokio task so the runtime loop never waits on I/O. The handles are kept
//! here per message so evicting a message aborts sends still in flight.
//! Only the runtime task owns the registry.

use std::collections::HashMap;

use tokio::task::JoinHandle;

/// In-flight task handles keyed by message id
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Vec<JoinHandle<()>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a spawned task for `message_id`.
    ///
    /// Finished handles are dropped on the way, along with messages left
    /// with nothing in flight.
    pub fn register(&mut self, message_id: &str, handle: JoinHandle<()>) {
        self.prune();
        self.tasks
            .entry(message_id.to_string())
            .or_default()
            .push(handle);
    }

    /// Abort every task for a message, returning how many were still running
    pub fn cancel_all(&mut self, message_id: &str) -> usize {
        let Some(handles) = self.tasks.remove(message_id) else {
            return 0;
        };
        let live = handles.iter().filter(|h| !h.is_finished()).count();
        for handle in handles {
            handle.abort();
        }
        live
    }

    /// Abort all tasks (on runtime shutdown)
    pub fn cancel_everything(&mut self) {
        for (_, handles) in self.tasks.drain() {
            for handle in handles {
                handle.abort();
            }
        }
    }

    /// Number of tracked tasks that have not finished yet
    pub fn active(&self, message_id: &str) -> usize {
        self.tasks
            .get(message_id)
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    /// Number of messages with tracked handles
    pub fn tracked_messages(&self) -> usize {
        self.tasks.len()
    }

    fn prune(&mut self) {
        self.tasks.retain(|_, handles| {
            handles.retain(|h| !h.is_finished());
            !handles.is_empty()
        });
    }
}
