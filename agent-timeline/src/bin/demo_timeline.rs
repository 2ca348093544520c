use agent_timeline_sdk::{
    emit_phase_chunk, emit_phase_completed, emit_phase_failed, emit_phase_planned,
    emit_phase_started, emit_subagent_finished, emit_subagent_spawned, emit_tool_call,
    new_message_id, AgentType, ExecutionEnvelope, ExecutionEvent,
};
use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;

/// Emit a sample agent execution as event lines on stderr
#[derive(Parser, Debug, Clone)]
struct Args {
    /// Message id to emit events for (random when omitted)
    #[arg(short, long)]
    message_id: Option<String>,

    /// Simulate slow execution
    #[arg(short = 's', long, action = clap::ArgAction::SetTrue)]
    slow_mode: bool,

    /// Fail the last phase instead of completing it
    #[arg(long, action = clap::ArgAction::SetTrue)]
    fail: bool,

    /// Emit a react agent that streams content directly
    #[arg(long, action = clap::ArgAction::SetTrue)]
    react: bool,
}

impl Args {
    async fn pause(&self, fast_ms: u64) {
        let ms = if self.slow_mode { fast_ms * 5 } else { fast_ms };
        sleep(Duration::from_millis(ms)).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let message_id = args.message_id.clone().unwrap_or_else(new_message_id);

    println!("🚀 Demo agent execution {}", message_id);

    if args.react {
        react_run(&args, &message_id).await;
    } else {
        multi_phase_run(&args, &message_id).await;
    }

    println!("✅ Demo finished");
    Ok(())
}

async fn react_run(args: &Args, message_id: &str) {
    for chunk in ["Thinking about the question.\n", "Looking it up.\n", "The answer is 42.\n"] {
        ExecutionEnvelope::new(
            message_id,
            ExecutionEvent::AgentContentChunk {
                chunk: chunk.to_string(),
            },
        )
        .with_agent_type(AgentType::React)
        .emit();
        args.pause(100).await;
    }
}

async fn multi_phase_run(args: &Args, message_id: &str) {
    emit_phase_planned!(message_id, "plan", "Plan", "system:plan");
    emit_phase_planned!(message_id, "research", "Research");
    emit_phase_planned!(message_id, "write", "Write", "system:summary");
    emit_phase_planned!(message_id, "review", "Review");

    // Plan
    emit_phase_started!(message_id, "plan", "Plan", "system:plan");
    for step in ["Collect sources", "Summarize findings", "Draft answer"] {
        emit_phase_chunk!(message_id, "plan", format!("{}\n", step));
        args.pause(80).await;
    }
    emit_phase_completed!(message_id, "plan", "3 steps");

    // Research with a tool call and a nested sub-agent
    emit_phase_started!(message_id, "research", "Research");
    emit_tool_call!(message_id, "research", "tc_search", "web_search", json!({"query": "rust actors"}));
    ExecutionEnvelope::new(
        message_id,
        ExecutionEvent::ToolCallStarted {
            tool_call_id: "tc_search".to_string(),
        },
    )
    .emit();
    args.pause(150).await;
    ExecutionEnvelope::new(
        message_id,
        ExecutionEvent::ToolCallResult {
            tool_call_id: "tc_search".to_string(),
            result: json!({"hits": 3}),
        },
    )
    .emit();

    emit_subagent_spawned!(message_id, "sa_reader", "reader", 0);
    emit_subagent_spawned!(message_id, "sa_quotes", "quote-extractor", 1);
    for i in 1..=3 {
        emit_phase_chunk!(message_id, "research", format!("Read source {}\n", i));
        args.pause(100).await;
    }
    emit_subagent_finished!(message_id, "sa_quotes", 240, true);
    emit_subagent_finished!(message_id, "sa_reader", 1320, true);
    emit_phase_completed!(message_id, "research", "3 sources read");

    // Write
    emit_phase_started!(message_id, "write", "Write", "system:summary");
    emit_phase_chunk!(message_id, "write", "Drafting...\n");
    args.pause(120).await;
    emit_phase_completed!(message_id, "write", "Draft ready");

    // Review
    emit_phase_started!(message_id, "review", "Review");
    emit_tool_call!(
        message_id,
        "review",
        "tc_publish",
        "publish",
        json!({"target": "docs"}),
        true
    );
    args.pause(100).await;
    if args.fail {
        emit_phase_failed!(message_id, "review", "ReviewError", "reviewer rejected the draft");
    } else {
        emit_phase_chunk!(message_id, "review", "Looks good.\n");
        emit_phase_completed!(message_id, "review");
    }
}
