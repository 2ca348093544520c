//! Tests for phase reconciliation
//!
//! Lifecycle transitions, content streaming, arrival order and the
//! agent-level error.

use super::common::*;
use agent_timeline::models::{AgentExecutionState, AgentStatus};
use agent_timeline::reconciler::{apply, apply_all, Anomaly, Applied};
use agent_timeline_sdk::{AgentType, ExecutionEvent, ExecutionStatus};

fn fresh() -> AgentExecutionState {
    AgentExecutionState::new(MESSAGE, AgentType::MultiPhase)
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_streamed_phase_completes() {
    let mut state = fresh();
    let events = vec![
        started("p1", "plan"),
        chunk("p1", "Hello "),
        chunk("p1", "world"),
        completed("p1"),
    ];

    assert_eq!(apply_all(&mut state, &events), 4);
    assert_eq!(state.phases[0].streamed_content, "Hello world");
    assert_eq!(state.phases[0].status, ExecutionStatus::Completed);
    assert_eq!(state.status(), AgentStatus::Completed);
}

#[test]
fn test_stale_completion_after_failure_is_ignored() {
    let mut state = fresh();
    apply(&mut state, &started("p1", "build"));
    assert!(apply(&mut state, &failed("p1", "ToolError", "disk full")).is_changed());

    let applied = apply(&mut state, &completed("p1"));
    assert_eq!(
        applied,
        Applied::Ignored(Anomaly::TerminalPhase {
            phase_id: "p1".to_string(),
            status: ExecutionStatus::Failed,
        })
    );
    assert_eq!(state.phases[0].status, ExecutionStatus::Failed);
    let error = state.error.as_ref().unwrap();
    assert_eq!(error.error_type, "ToolError");
    assert_eq!(error.message, "disk full");
    assert_eq!(state.status(), AgentStatus::Failed);
}

#[test]
fn test_phases_keep_arrival_order() {
    let mut state = fresh();
    apply(&mut state, &started("p2", "second"));
    apply(&mut state, &started("p1", "first"));

    let ids: Vec<&str> = state.phases.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p1"]);
}

#[test]
fn test_planned_phase_starts_pending() {
    let mut state = fresh();
    apply(&mut state, &planned("p1", "plan"));
    assert_eq!(state.phases[0].status, ExecutionStatus::Pending);
    assert_eq!(state.status(), AgentStatus::Pending);

    assert!(apply(&mut state, &started("p1", "renamed")).is_changed());
    assert_eq!(state.phases[0].status, ExecutionStatus::Running);
    assert_eq!(state.phases[0].name, "plan");
}

#[test]
fn test_duplicate_start_is_ignored() {
    let mut state = fresh();
    apply(&mut state, &started("p1", "plan"));
    let applied = apply(&mut state, &started("p1", "plan"));
    assert!(!applied.is_changed());
    assert_eq!(state.phases.len(), 1);
}

#[test]
fn test_completion_of_pending_phase_is_rejected() {
    let mut state = fresh();
    apply(&mut state, &planned("p1", "plan"));
    let applied = apply(&mut state, &completed("p1"));
    assert!(matches!(
        applied.anomaly(),
        Some(Anomaly::InvalidPhaseTransition {
            from: ExecutionStatus::Pending,
            to: ExecutionStatus::Completed,
            ..
        })
    ));
    assert_eq!(state.phases[0].status, ExecutionStatus::Pending);
}

#[test]
fn test_summary_is_set_once() {
    let mut state = fresh();
    apply(&mut state, &started("p1", "plan"));
    apply(&mut state, &completed_with("p1", "first"));
    apply(&mut state, &completed_with("p1", "second"));
    assert_eq!(state.phases[0].output_summary.as_deref(), Some("first"));
}

// ============================================================================
// Skipping
// ============================================================================

#[test]
fn test_pending_phase_can_be_skipped() {
    let mut state = fresh();
    apply(&mut state, &planned("p1", "optional"));
    assert!(apply(&mut state, &skipped("p1")).is_changed());
    assert_eq!(state.phases[0].status, ExecutionStatus::Skipped);
    assert_eq!(state.status(), AgentStatus::Completed);
}

#[test]
fn test_running_phase_is_never_skipped() {
    let mut state = fresh();
    apply(&mut state, &started("p1", "busy"));
    let applied = apply(&mut state, &skipped("p1"));
    assert_eq!(
        applied,
        Applied::Ignored(Anomaly::InvalidPhaseTransition {
            phase_id: "p1".to_string(),
            from: ExecutionStatus::Running,
            to: ExecutionStatus::Skipped,
        })
    );
    assert_eq!(state.phases[0].status, ExecutionStatus::Running);
}

// ============================================================================
// Content
// ============================================================================

#[test]
fn test_content_only_grows() {
    let mut state = fresh();
    let events = vec![
        started("p1", "write"),
        chunk("p1", "a"),
        chunk("p2", "lost"),
        chunk("p1", "b"),
        completed("p1"),
        chunk("p1", "after"),
        chunk("p1", "c"),
    ];

    let mut previous = String::new();
    for event in &events {
        apply(&mut state, event);
        let current = state
            .phase("p1")
            .map(|p| p.streamed_content.clone())
            .unwrap_or_default();
        assert!(current.starts_with(&previous), "{:?} shrank to {:?}", previous, current);
        previous = current;
    }
    assert_eq!(previous, "ab");
}

#[test]
fn test_chunk_for_unknown_phase_is_ignored() {
    let mut state = fresh();
    let applied = apply(&mut state, &chunk("ghost", "boo"));
    assert_eq!(applied, Applied::Ignored(Anomaly::UnknownPhase("ghost".to_string())));
    assert!(state.phases.is_empty());
}

#[test]
fn test_react_content_accumulates() {
    let mut state = AgentExecutionState::new(MESSAGE, AgentType::React);
    for part in ["Thinking", "...", " done"] {
        apply(
            &mut state,
            &ExecutionEvent::AgentContentChunk {
                chunk: part.to_string(),
            },
        );
    }
    assert_eq!(state.content, "Thinking... done");
}

// ============================================================================
// Status monotonicity and the agent error
// ============================================================================

#[test]
fn test_observed_phase_statuses_only_move_forward() {
    let mut state = fresh();
    let mut seen: Vec<ExecutionStatus> = Vec::new();
    for event in sample_run() {
        apply(&mut state, &event);
        if let Some(phase) = state.phase("p2") {
            if seen.last() != Some(&phase.status) {
                seen.push(phase.status);
            }
        }
    }
    assert_eq!(
        seen,
        vec![
            ExecutionStatus::Pending,
            ExecutionStatus::Running,
            ExecutionStatus::Failed
        ]
    );
    for pair in seen.windows(2) {
        assert!(pair[0].can_transition_to(pair[1]));
    }
}

#[test]
fn test_first_failure_wins() {
    let mut state = fresh();
    apply(&mut state, &started("p1", "a"));
    apply(&mut state, &started("p2", "b"));
    apply(&mut state, &failed("p1", "First", "one"));
    let before = state.error.clone();

    apply(&mut state, &failed("p2", "Second", "two"));
    apply(&mut state, &failed("p1", "Again", "three"));
    apply(&mut state, &completed("p2"));

    assert_eq!(state.error, before);
    assert_eq!(state.error.as_ref().unwrap().message, "one");
    assert_eq!(state.phase("p2").unwrap().status, ExecutionStatus::Failed);
}

#[test]
fn test_failure_of_unknown_phase_still_records_error() {
    let mut state = fresh();
    assert!(apply(&mut state, &failed("missing", "Crash", "boom")).is_changed());
    assert_eq!(state.error.as_ref().unwrap().error_type, "Crash");
    assert!(state.phases.is_empty());
}

#[test]
fn test_planned_phase_can_fail_before_running() {
    let mut state = fresh();
    apply(&mut state, &planned("p1", "deploy"));
    apply(&mut state, &started("p0", "build"));
    apply(&mut state, &completed("p0"));

    assert!(apply(&mut state, &failed("p1", "Crash", "boom")).is_changed());
    assert_eq!(state.phase("p1").unwrap().status, ExecutionStatus::Failed);
    assert_eq!(state.error.as_ref().unwrap().message, "boom");
    assert_eq!(state.status(), AgentStatus::Failed);

    // Settled now; a late start cannot revive it
    assert!(!apply(&mut state, &started("p1", "deploy")).is_changed());
    assert_eq!(state.phase("p1").unwrap().status, ExecutionStatus::Failed);
}

#[test]
fn test_running_outranks_failed_in_overall_status() {
    let mut state = fresh();
    apply(&mut state, &started("p1", "a"));
    apply(&mut state, &failed("p1", "E", "x"));
    apply(&mut state, &started("p2", "b"));
    assert_eq!(state.status(), AgentStatus::Running);
}
