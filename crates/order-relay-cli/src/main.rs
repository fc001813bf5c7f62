//! Order Relay CLI
//!
//! The `order-relay` command drives the sales/checkout handoff orchestrator
//! from recorded transcripts and inspects stored conversations.
//!
//! ## Commands
//!
//! - `replay`: Run a scripted transcript through the orchestrator
//! - `show`: Print a stored conversation's projection and message log

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use order_relay_core::{
    format_money, ConversationId, ConversationState, ConversationStore, Decision,
    FsConversationStore, MemoryConversationStore, Orchestrator, RelayConfig, Role,
    ScriptedReasoner, Speaker, TurnOutcome,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "order-relay")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sales/checkout handoff orchestrator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines and JSON command output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted transcript through the orchestrator
    Replay {
        /// Path to the script file (JSON)
        script: PathBuf,

        /// Persist conversations under this directory (default: in memory)
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Conversation id (overrides the script's, default: random)
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// Show a stored conversation
    Show {
        /// Conversation id
        conversation: String,

        /// Store directory (default: ORDER_RELAY_STORE_DIR or .order-relay/conversations)
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Project the order for this role instead of the active one
        #[arg(short, long)]
        role: Option<Role>,
    },
}

/// A recorded transcript: one user input and one scripted decision per turn.
#[derive(Debug, Deserialize)]
struct ReplayScript {
    #[serde(default)]
    conversation: Option<String>,
    turns: Vec<ScriptedTurn>,
}

#[derive(Debug, Deserialize)]
struct ScriptedTurn {
    input: String,
    #[serde(default)]
    decision: Decision,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    order_relay_core::init_tracing(cli.json, level);

    let config = RelayConfig::from_env().context("Invalid ORDER_RELAY_* configuration")?;

    match cli.command {
        Commands::Replay {
            script,
            store_dir,
            conversation,
        } => {
            cmd_replay(
                &config,
                &script,
                store_dir.as_deref(),
                conversation.as_deref(),
                cli.json,
            )
            .await
        }
        Commands::Show {
            conversation,
            store_dir,
            role,
        } => {
            let dir = store_dir.unwrap_or_else(|| config.store_dir.clone());
            cmd_show(&dir, &conversation, role, cli.json).await
        }
    }
}

fn load_script(path: &Path) -> Result<ReplayScript> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid script {}", path.display()))
}

/// Run every turn of `script` and collect the outcomes.
async fn run_replay(
    config: &RelayConfig,
    script: ReplayScript,
    store: Arc<dyn ConversationStore>,
    conversation: Option<&str>,
) -> Result<(ConversationId, Vec<TurnOutcome>)> {
    let id = conversation
        .map(ConversationId::from)
        .or_else(|| script.conversation.as_deref().map(ConversationId::from))
        .unwrap_or_default();

    let (inputs, decisions): (Vec<String>, Vec<Decision>) = script
        .turns
        .into_iter()
        .map(|t| (t.input, t.decision))
        .unzip();
    let orchestrator = Orchestrator::new(Arc::new(ScriptedReasoner::new(decisions)), store)
        .with_config(config.clone());

    info!(conversation_id = %id, turns = inputs.len(), "replaying script");

    let mut outcomes = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let outcome = orchestrator
            .handle_turn(&id, input)
            .await
            .with_context(|| format!("Turn {} failed", i + 1))?;
        outcomes.push(outcome);
    }
    Ok((id, outcomes))
}

async fn cmd_replay(
    config: &RelayConfig,
    script_path: &Path,
    store_dir: Option<&Path>,
    conversation: Option<&str>,
    json: bool,
) -> Result<()> {
    let script = load_script(script_path)?;
    let store: Arc<dyn ConversationStore> = match store_dir {
        Some(dir) => Arc::new(
            FsConversationStore::new(dir)
                .with_context(|| format!("Failed to open store at {}", dir.display()))?,
        ),
        None => Arc::new(MemoryConversationStore::new()),
    };

    let (id, outcomes) = run_replay(config, script, store, conversation).await?;

    if json {
        for outcome in &outcomes {
            println!("{}", serde_json::to_string(outcome)?);
        }
        return Ok(());
    }

    println!("Conversation: {id}");
    for outcome in &outcomes {
        print!("{}", render_outcome(outcome));
    }
    Ok(())
}

fn render_outcome(outcome: &TurnOutcome) -> String {
    let mut out = format!("\n[turn {}] {}", outcome.turn, outcome.handled_by);
    if outcome.active_role != outcome.handled_by {
        out.push_str(&format!(" -> {}", outcome.active_role));
    }
    out.push('\n');
    for record in &outcome.messages {
        out.push_str(&format!("  {}: {}\n", speaker_label(record.speaker), record.content));
    }
    for confirmation in &outcome.confirmations {
        out.push_str(&format!(
            "  confirmation {} ({} items, {})\n",
            confirmation.confirmation_id,
            confirmation.item_count,
            format_money(confirmation.total)
        ));
    }
    out.push_str(&format!("  order total: {}\n", format_money(outcome.order.total)));
    out
}

fn speaker_label(speaker: Speaker) -> String {
    match speaker {
        Speaker::User => "user".to_string(),
        Speaker::Agent(role) => role.to_string(),
        Speaker::Action(action) => action.to_string(),
    }
}

async fn cmd_show(store_dir: &Path, conversation: &str, role: Option<Role>, json: bool) -> Result<()> {
    let store = FsConversationStore::new(store_dir)
        .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;
    let id = ConversationId::from(conversation);
    let state = store
        .load(&id)
        .await
        .with_context(|| format!("Failed to load conversation {conversation}"))?
        .with_context(|| format!("Conversation not found: {conversation}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print!("{}", render_state(&state, role));
    }
    Ok(())
}

fn render_state(state: &ConversationState, role: Option<Role>) -> String {
    let role = role.unwrap_or(state.active_role);
    let mut out = format!(
        "Conversation: {}\nActive role: {}\nTurns: {}\n\n[{} view]\n{}\n",
        state.id,
        state.active_role,
        state.turns,
        role,
        role.project(&state.order)
    );
    if !state.message_log().is_empty() {
        out.push_str("\nLog:\n");
    }
    for record in state.message_log() {
        out.push_str(&format!(
            "  #{} {}: {}\n",
            record.turn,
            speaker_label(record.speaker),
            record.content
        ));
    }
    out
}
