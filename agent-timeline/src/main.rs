use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_timeline::commands::ChangeKind;
use agent_timeline::ingest::{parse_log, read_events};
use agent_timeline::registry::RendererRegistry;
use agent_timeline::store::{replay, ExecutionStore};
use agent_timeline::ui::{render_timeline, to_plain_lines, DefaultPhaseRenderer, TimelineOptions};
use agent_timeline::{logging, AgentExecutionState, LoggingTransport, TimelineConfig, TimelineRuntime};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "agent-timeline", about = "Reconcile and render agent execution events")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Content lines shown for collapsed phases
    #[arg(long, global = true)]
    max_lines: Option<usize>,

    /// Hide the sub-agent list
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    no_subagents: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the final timeline of every message in an event log
    Replay {
        file: PathBuf,
        /// Only this message
        #[arg(short, long)]
        message: Option<String>,
        /// Print reconciled state as JSON instead of text
        #[arg(long, action = clap::ArgAction::SetTrue)]
        json: bool,
    },
    /// Read events from stdin and re-render on every change
    Follow {
        /// Confirm every tool call that asks for approval
        #[arg(long, action = clap::ArgAction::SetTrue)]
        auto_confirm: bool,
    },
    /// Check that replaying each message's journal reproduces its state
    Verify { file: PathBuf },
    /// List registered renderer keys
    Keys,
}

impl Cli {
    fn resolve_config(&self) -> Result<TimelineConfig> {
        let mut config = TimelineConfig::load(self.config.as_deref())?;
        config.apply_env()?;
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(max_lines) = self.max_lines {
            config.max_content_lines = max_lines;
        }
        if self.no_subagents {
            config.show_subagents = false;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    logging::init(&config.log_level);

    let registry = RendererRegistry::with_builtin_renderers(DefaultPhaseRenderer::with_max_lines(
        config.max_content_lines,
    ));
    let options = TimelineOptions {
        show_subagents: config.show_subagents,
    };

    match cli.command {
        Command::Replay {
            file,
            message,
            json,
        } => {
            let store = load_store(&file, &config)?;
            for id in store.message_ids() {
                if message.as_deref().is_some_and(|m| m != id.as_str()) {
                    continue;
                }
                let Some(state) = store.get(id) else { continue };
                if json {
                    println!("{}", serde_json::to_string_pretty(state)?);
                } else {
                    print_timeline(state, &registry, &options);
                }
            }
        }
        Command::Follow { auto_confirm } => follow(&config, &registry, &options, auto_confirm).await?,
        Command::Verify { file } => verify(&file, &config)?,
        Command::Keys => {
            for key in registry.list_keys() {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

fn load_store(path: &Path, config: &TimelineConfig) -> Result<ExecutionStore> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event log {}", path.display()))?;
    let mut store = ExecutionStore::new();
    for envelope in parse_log(&text, &config.event_prefix) {
        store.apply(envelope);
    }
    Ok(store)
}

fn print_timeline(state: &AgentExecutionState, registry: &RendererRegistry, options: &TimelineOptions) {
    for line in to_plain_lines(&render_timeline(state, registry, options)) {
        println!("{}", line);
    }
    println!();
}

fn verify(path: &Path, config: &TimelineConfig) -> Result<()> {
    let store = load_store(path, config)?;
    let mut mismatched = Vec::new();
    for id in store.message_ids() {
        let Some(live) = store.get(id) else { continue };
        let replayed = replay(id, live.agent_type, store.journal(id));
        let live_json = serde_json::to_value(live)?;
        let replayed_json = serde_json::to_value(&replayed)?;
        if live_json == replayed_json {
            println!("✓ {} ({} events)", id, store.journal(id).len());
        } else {
            println!("✗ {} replay diverged", id);
            mismatched.push(id.clone());
        }
    }
    if !mismatched.is_empty() {
        bail!("{} message(s) did not replay deterministically", mismatched.len());
    }
    Ok(())
}

async fn follow(
    config: &TimelineConfig,
    registry: &RendererRegistry,
    options: &TimelineOptions,
    auto_confirm: bool,
) -> Result<()> {
    let (handle, runtime) = TimelineRuntime::spawn(config, Arc::new(LoggingTransport));
    let mut changes = handle.subscribe();

    let reader_handle = handle.clone();
    let prefix = config.event_prefix.clone();
    let mut reader = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        read_events(stdin, &prefix, &reader_handle).await
    });

    loop {
        tokio::select! {
            change = changes.recv() => match change {
                Ok(change) if change.kind == ChangeKind::Evicted => {}
                Ok(change) => {
                    let Some(state) = handle.snapshot(&change.message_id).await? else {
                        continue;
                    };
                    println!("── {} (rev {}) ──", change.message_id, change.revision);
                    print_timeline(&state, registry, options);

                    if auto_confirm {
                        for tool_call_id in state.awaiting_confirmation() {
                            if let Err(e) = handle.confirm(&state.message_id, tool_call_id).await {
                                warn!(error = %e, "auto-confirm failed");
                            }
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "render loop fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            stats = &mut reader => {
                let stats = stats.context("Input reader panicked")??;
                info!(
                    events = stats.events,
                    raw = stats.raw,
                    malformed = stats.malformed,
                    "input closed"
                );
                break;
            }
        }
    }

    handle.shutdown()?;
    let store = runtime.await.context("Timeline runtime panicked")?;
    println!("══ final ══");
    for id in store.message_ids() {
        if let Some(state) = store.get(id) {
            print_timeline(state, registry, options);
        }
    }
    Ok(())
}
