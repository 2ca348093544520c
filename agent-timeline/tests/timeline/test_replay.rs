//! Tests for journal replay determinism

use super::common::*;
use agent_timeline::store::{replay, ExecutionStore};
use agent_timeline_sdk::{AgentType, ExecutionEnvelope, ExecutionEvent};

fn fill(store: &mut ExecutionStore, events: &[ExecutionEvent]) {
    for event in events {
        store.apply(envelope(event.clone()));
    }
}

#[test]
fn test_same_log_yields_same_state() {
    let events = sample_run();
    let mut first = ExecutionStore::new();
    let mut second = ExecutionStore::new();
    fill(&mut first, &events);
    fill(&mut second, &events);

    assert_eq!(first.get(MESSAGE), second.get(MESSAGE));
    assert_eq!(
        serde_json::to_string(first.get(MESSAGE).unwrap()).unwrap(),
        serde_json::to_string(second.get(MESSAGE).unwrap()).unwrap()
    );
}

#[test]
fn test_journal_replay_reproduces_live_state() {
    let mut store = ExecutionStore::new();
    fill(&mut store, &sample_run());
    store.apply(envelope(started("p4", "Extra")));
    store.apply(envelope(tool_requested("p4", "tc3", true)));
    store.confirm(MESSAGE, "tc3").unwrap();

    let live = store.get(MESSAGE).unwrap();
    let rebuilt = replay(MESSAGE, live.agent_type, store.journal(MESSAGE));
    assert_eq!(&rebuilt, live);
}

#[test]
fn test_journal_keeps_ignored_events() {
    let events = sample_run();
    let mut store = ExecutionStore::new();
    fill(&mut store, &events);
    assert_eq!(store.journal(MESSAGE), events.as_slice());
    assert!(store.revision(MESSAGE) < events.len() as u64);
}

#[test]
fn test_first_envelope_decides_agent_type() {
    let mut store = ExecutionStore::new();
    store.apply(
        ExecutionEnvelope::new(
            MESSAGE,
            ExecutionEvent::AgentContentChunk {
                chunk: "hi".to_string(),
            },
        )
        .with_agent_type(AgentType::React),
    );
    store.apply(envelope(started("p1", "late phase")));
    assert_eq!(store.get(MESSAGE).unwrap().agent_type, AgentType::React);
}

#[test]
fn test_replay_after_evict_starts_fresh() {
    let mut store = ExecutionStore::new();
    fill(&mut store, &sample_run());
    store.evict(MESSAGE);
    store.apply(envelope(started("p1", "again")));

    let state = store.get(MESSAGE).unwrap();
    assert_eq!(state.phases.len(), 1);
    assert!(state.error.is_none());
    assert_eq!(store.journal(MESSAGE).len(), 1);
}
