//! Line-oriented event ingest
//!
//! Producers write one envelope per line, prefixed with
//! [`EVENT_PREFIX`](agent_timeline_sdk::EVENT_PREFIX), interleaved with
//! whatever else they print. Bare JSON envelopes are accepted as well so
//! plain `.jsonl` journals can be replayed.

use agent_timeline_sdk::ExecutionEnvelope;
use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::runtime::TimelineHandle;

/// Classification of one input line
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Event(ExecutionEnvelope),
    /// Not an event; ordinary producer output
    Raw(String),
    /// Carried the event prefix but did not decode
    Malformed { line: String, error: String },
}

pub fn parse_line(line: &str, prefix: &str) -> LineKind {
    let trimmed = line.trim();
    if let Some(json) = trimmed.strip_prefix(prefix) {
        return match serde_json::from_str::<ExecutionEnvelope>(json) {
            Ok(envelope) => LineKind::Event(envelope),
            Err(e) => LineKind::Malformed {
                line: trimmed.to_string(),
                error: e.to_string(),
            },
        };
    }
    if trimmed.starts_with('{') {
        // Other structured output is not ours to reject.
        if let Ok(envelope) = serde_json::from_str::<ExecutionEnvelope>(trimmed) {
            return LineKind::Event(envelope);
        }
    }
    LineKind::Raw(line.to_string())
}

/// Decode every event in `text`, skipping everything else
pub fn parse_log(text: &str, prefix: &str) -> Vec<ExecutionEnvelope> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| match parse_line(line, prefix) {
            LineKind::Event(envelope) => Some(envelope),
            LineKind::Raw(_) => None,
            LineKind::Malformed { error, .. } => {
                warn!(line = i + 1, %error, "skipping malformed event");
                None
            }
        })
        .collect()
}

/// Counters reported by [`read_events`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub events: usize,
    pub raw: usize,
    pub malformed: usize,
}

/// Stream lines from `reader` into the runtime until EOF
pub async fn read_events<R>(
    reader: R,
    prefix: &str,
    handle: &TimelineHandle,
) -> anyhow::Result<IngestStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = IngestStats::default();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input line")? {
        match parse_line(&line, prefix) {
            LineKind::Event(envelope) => {
                handle
                    .ingest(envelope)
                    .context("Timeline runtime stopped while ingesting")?;
                stats.events += 1;
            }
            LineKind::Raw(raw) => {
                debug!(line = %raw, "non-event line");
                stats.raw += 1;
            }
            LineKind::Malformed { line, error } => {
                warn!(%line, %error, "skipping malformed event");
                stats.malformed += 1;
            }
        }
    }
    Ok(stats)
}
