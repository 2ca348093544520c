//! Data models for reconciled agent executions
//!
//! This module contains the view-state that the reconciler folds events into.

mod execution;
mod phase;
mod subagent;
mod tool_call;

// Re-export all public types
pub use execution::*;
pub use phase::*;
pub use subagent::*;
pub use tool_call::*;
