//! Tests for line ingest

use super::common::*;
use agent_timeline::ingest::{parse_line, parse_log, read_events, IngestStats, LineKind};
use agent_timeline::{NoopTransport, TimelineConfig, TimelineRuntime};
use agent_timeline_sdk::{ExecutionStatus, EVENT_PREFIX};
use std::sync::Arc;
use tokio::io::BufReader;

fn event_line(event: agent_timeline_sdk::ExecutionEvent) -> String {
    envelope(event).to_line().unwrap()
}

fn mixed_log() -> String {
    [
        "Starting agent...".to_string(),
        event_line(started("p1", "plan")),
        event_line(chunk("p1", "Hello ")),
        "  some progress output".to_string(),
        format!("{}{{\"message_id\": 42}}", EVENT_PREFIX),
        event_line(chunk("p1", "world")),
        event_line(completed("p1")),
        String::new(),
    ]
    .join("\n")
}

#[test]
fn test_emitted_line_parses_back() {
    let line = event_line(tool_requested("p1", "tc1", true));
    match parse_line(&line, EVENT_PREFIX) {
        LineKind::Event(parsed) => assert_eq!(parsed, envelope(tool_requested("p1", "tc1", true))),
        other => panic!("expected event, got {:?}", other),
    }
}

#[test]
fn test_bare_json_envelope_is_accepted() {
    let line = serde_json::to_string(&envelope(skipped("p3"))).unwrap();
    assert!(matches!(parse_line(&line, EVENT_PREFIX), LineKind::Event(_)));
}

#[test]
fn test_custom_prefix() {
    let json = serde_json::to_string(&envelope(skipped("p3"))).unwrap();
    let line = format!(">>{}", json);
    assert!(matches!(parse_line(&line, ">>"), LineKind::Event(_)));
    assert!(matches!(parse_line(&line, EVENT_PREFIX), LineKind::Raw(_)));
}

#[test]
fn test_parse_log_keeps_event_order() {
    let envelopes = parse_log(&mixed_log(), EVENT_PREFIX);
    let kinds: Vec<&str> = envelopes.iter().map(|e| e.event.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "phase_started",
            "phase_content_chunk",
            "phase_content_chunk",
            "phase_completed"
        ]
    );
}

#[tokio::test]
async fn test_read_events_feeds_runtime() {
    let (handle, _runtime) =
        TimelineRuntime::spawn(&TimelineConfig::default(), Arc::new(NoopTransport));
    let log = mixed_log();

    let stats = read_events(BufReader::new(log.as_bytes()), EVENT_PREFIX, &handle)
        .await
        .unwrap();
    assert_eq!(
        stats,
        IngestStats {
            events: 4,
            raw: 2,
            malformed: 1,
        }
    );

    let state = handle.snapshot(MESSAGE).await.unwrap().unwrap();
    assert_eq!(state.phases[0].streamed_content, "Hello world");
    assert_eq!(state.phases[0].status, ExecutionStatus::Completed);
}
