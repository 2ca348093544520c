//! Tests for the tool-call lifecycle
//!
//! Confirmation flow through the store, runtime-driven transitions and the
//! outbound actions produced by user decisions.

use super::common::*;
use agent_timeline::error::TimelineError;
use agent_timeline::models::CANCELLED_BY_USER;
use agent_timeline::reconciler::Anomaly;
use agent_timeline::store::ExecutionStore;
use agent_timeline_sdk::{ExecutionEvent, OutboundAction, ToolCallStatus};
use serde_json::json;

fn store_with_call(requires_confirmation: bool) -> ExecutionStore {
    let mut store = ExecutionStore::new();
    store.apply(envelope(started("p1", "tools")));
    store.apply(envelope(tool_requested("p1", "tc1", requires_confirmation)));
    store
}

fn status(store: &ExecutionStore, id: &str) -> ToolCallStatus {
    store.get(MESSAGE).unwrap().tool_call(id).unwrap().status
}

// ============================================================================
// Confirmation
// ============================================================================

#[test]
fn test_cancel_then_confirm_is_rejected() {
    let mut store = store_with_call(true);
    assert_eq!(status(&store, "tc1"), ToolCallStatus::WaitingConfirmation);

    let action = store.cancel(MESSAGE, "tc1").unwrap();
    assert_eq!(
        action,
        OutboundAction::Cancel {
            message_id: MESSAGE.to_string(),
            tool_call_id: "tc1".to_string(),
        }
    );
    let call = store.get(MESSAGE).unwrap().tool_call("tc1").unwrap().clone();
    assert_eq!(call.status, ToolCallStatus::Failed);
    assert!(call.cancelled);
    assert_eq!(call.error.as_deref(), Some(CANCELLED_BY_USER));

    let revision = store.revision(MESSAGE);
    assert_eq!(
        store.confirm(MESSAGE, "tc1"),
        Err(TimelineError::NotAwaitingConfirmation {
            id: "tc1".to_string(),
            status: ToolCallStatus::Failed,
        })
    );
    assert_eq!(store.get(MESSAGE).unwrap().tool_call("tc1").unwrap(), &call);
    assert_eq!(store.revision(MESSAGE), revision);
}

#[test]
fn test_confirm_then_cancel_is_rejected() {
    let mut store = store_with_call(true);
    assert!(store.confirm(MESSAGE, "tc1").is_ok());
    assert_eq!(status(&store, "tc1"), ToolCallStatus::Executing);

    assert!(matches!(
        store.cancel(MESSAGE, "tc1"),
        Err(TimelineError::NotAwaitingConfirmation { .. })
    ));
    assert_eq!(status(&store, "tc1"), ToolCallStatus::Executing);
}

#[test]
fn test_confirm_requires_waiting_call() {
    let mut store = store_with_call(false);
    assert!(matches!(
        store.confirm(MESSAGE, "tc1"),
        Err(TimelineError::NotAwaitingConfirmation {
            status: ToolCallStatus::Pending,
            ..
        })
    ));
    assert_eq!(
        store.cancel(MESSAGE, "nope"),
        Err(TimelineError::UnknownToolCall("nope".to_string()))
    );
}

#[test]
fn test_user_actions_are_journaled() {
    let mut store = store_with_call(true);
    store.confirm(MESSAGE, "tc1").unwrap();
    assert_eq!(
        store.journal(MESSAGE).last(),
        Some(&ExecutionEvent::ToolCallConfirmed {
            tool_call_id: "tc1".to_string()
        })
    );
}

#[test]
fn test_late_confirmation_request() {
    let mut store = store_with_call(false);
    let applied = store.apply(envelope(ExecutionEvent::ToolCallConfirmationRequested {
        tool_call_id: "tc1".to_string(),
    }));
    assert!(applied.is_changed());
    assert_eq!(
        store.get(MESSAGE).unwrap().awaiting_confirmation(),
        vec!["tc1"]
    );
    assert!(store.confirm(MESSAGE, "tc1").is_ok());
}

// ============================================================================
// Runtime-driven transitions
// ============================================================================

#[test]
fn test_runtime_cannot_bypass_confirmation() {
    let mut store = store_with_call(true);
    let applied = store.apply(envelope(tool_started("tc1")));
    assert!(matches!(
        applied.anomaly(),
        Some(Anomaly::InvalidToolCallTransition { .. })
    ));
    let applied = store.apply(envelope(tool_error("tc1", "timeout")));
    assert!(!applied.is_changed());
    assert_eq!(status(&store, "tc1"), ToolCallStatus::WaitingConfirmation);
}

#[test]
fn test_executing_call_completes_with_result() {
    let mut store = store_with_call(false);
    store.apply(envelope(tool_started("tc1")));
    assert!(store
        .apply(envelope(tool_result("tc1", json!({"exit": 0}))))
        .is_changed());

    let call = store.get(MESSAGE).unwrap().tool_call("tc1").unwrap();
    assert_eq!(call.status, ToolCallStatus::Completed);
    assert_eq!(call.result, Some(json!({"exit": 0})));

    // Terminal calls ignore everything afterwards
    assert!(!store.apply(envelope(tool_error("tc1", "late"))).is_changed());
    assert_eq!(status(&store, "tc1"), ToolCallStatus::Completed);
}

#[test]
fn test_confirmed_call_reports_error() {
    let mut store = store_with_call(true);
    store.confirm(MESSAGE, "tc1").unwrap();
    store.apply(envelope(tool_error("tc1", "permission denied")));

    let call = store.get(MESSAGE).unwrap().tool_call("tc1").unwrap();
    assert_eq!(call.status, ToolCallStatus::Failed);
    assert_eq!(call.error.as_deref(), Some("permission denied"));
    assert!(!call.cancelled);
}

#[test]
fn test_duplicate_request_keeps_first() {
    let mut store = store_with_call(true);
    let applied = store.apply(envelope(tool_requested("p1", "tc1", false)));
    assert!(!applied.is_changed());
    let state = store.get(MESSAGE).unwrap();
    assert_eq!(state.tool_calls.len(), 1);
    assert_eq!(state.phase("p1").unwrap().tool_calls, vec!["tc1"]);
    assert_eq!(status(&store, "tc1"), ToolCallStatus::WaitingConfirmation);
}

#[test]
fn test_calls_listed_per_phase() {
    let mut store = ExecutionStore::new();
    store.apply(envelope(started("p1", "a")));
    store.apply(envelope(started("p2", "b")));
    store.apply(envelope(tool_requested("p2", "tc-b", false)));
    store.apply(envelope(tool_requested("p1", "tc-a", false)));

    let state = store.get(MESSAGE).unwrap();
    let ids: Vec<&str> = state
        .tool_calls_for("p2")
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, vec!["tc-b"]);
    assert_eq!(state.tool_call("tc-a").unwrap().phase_id, "p1");
}

// ============================================================================
// Monotonicity
// ============================================================================

enum Step {
    Event(ExecutionEvent),
    Confirm(&'static str),
}

fn observed_statuses(steps: Vec<Step>, id: &str) -> Vec<ToolCallStatus> {
    let mut store = ExecutionStore::new();
    store.apply(envelope(started("p1", "tools")));
    let mut seen: Vec<ToolCallStatus> = Vec::new();
    for step in steps {
        match step {
            Step::Event(event) => {
                store.apply(envelope(event));
            }
            Step::Confirm(call) => {
                let _ = store.confirm(MESSAGE, call);
            }
        }
        if let Some(call) = store.get(MESSAGE).unwrap().tool_call(id) {
            if seen.last() != Some(&call.status) {
                seen.push(call.status);
            }
        }
    }
    seen
}

#[test]
fn test_observed_tool_call_statuses_only_move_forward() {
    let direct = observed_statuses(
        vec![
            Step::Event(tool_requested("p1", "tc1", false)),
            Step::Event(tool_result("tc1", json!({"early": true}))),
            Step::Event(tool_started("tc1")),
            Step::Event(tool_started("tc1")),
            Step::Event(tool_result("tc1", json!({"exit": 0}))),
            Step::Event(tool_error("tc1", "late")),
            Step::Event(tool_started("tc1")),
        ],
        "tc1",
    );
    assert_eq!(
        direct,
        vec![
            ToolCallStatus::Pending,
            ToolCallStatus::Executing,
            ToolCallStatus::Completed
        ]
    );

    let confirmed = observed_statuses(
        vec![
            Step::Event(tool_requested("p1", "tc2", true)),
            Step::Event(tool_started("tc2")),
            Step::Confirm("tc2"),
            Step::Confirm("tc2"),
            Step::Event(tool_error("tc2", "permission denied")),
            Step::Event(tool_result("tc2", json!({"exit": 0}))),
        ],
        "tc2",
    );
    assert_eq!(
        confirmed,
        vec![
            ToolCallStatus::WaitingConfirmation,
            ToolCallStatus::Executing,
            ToolCallStatus::Failed
        ]
    );

    for seen in [&direct, &confirmed] {
        for pair in seen.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }
}
