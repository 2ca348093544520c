// Reconciled view-state
pub mod models;

// Error types
pub mod error;

// Event folding
pub mod reconciler;
pub mod tool_calls;

// Per-message state and journal
pub mod store;

// Renderer dispatch and presentation
pub mod registry;
pub mod ui;

// Runtime task, its commands and background task tracking
pub mod commands;
pub mod runtime;
pub mod task_registry;

// Line ingest
pub mod ingest;

// Ambient setup
pub mod config;
pub mod logging;

pub use commands::{ChangeKind, StateChange, TimelineCommand};
pub use config::TimelineConfig;
pub use error::{Result, TimelineError};
pub use models::{AgentExecutionState, AgentStatus, PhaseExecution, Subagent, ToolCall};
pub use reconciler::{Anomaly, Applied};
pub use registry::{RenderStrategy, RendererRegistry};
pub use runtime::{LoggingTransport, NoopTransport, TimelineHandle, TimelineRuntime};
pub use store::ExecutionStore;
pub use tool_calls::{ToolCallManager, ToolCallRequest};
