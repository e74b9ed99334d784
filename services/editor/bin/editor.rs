//! Main Entrypoint for the Story Editor Console
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and command line.
//! 2. Initializing logging.
//! 3. Initializing the language model and search clients.
//! 4. Starting the agent session with the lead editor.
//! 5. Reading user turns from stdin until the story is finished or Ctrl+C.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use story_editor::{
    config::Config,
    console::ConsoleHost,
    cycle::{TurnResult, handle_user_turn_until},
    prompts::editor_prompts,
};
use story_editor_core::{
    AgentSession, SessionHost, SessionOptions,
    llm_client::{LLMClient, OpenAICompatibleClient},
    search::HttpSearchClient,
};
use tokio::io::{AsyncBufReadExt, BufReader, Stdout};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info};

#[derive(Parser, Debug)]
#[command(version, about = "Talk a story idea through with a team of editors")]
struct Cli {
    /// Room to join and delete when the story is finished (overrides ROOM_NAME).
    #[arg(long)]
    room: Option<String>,
    /// Language every editor must answer in (overrides RESPONSE_LANGUAGE; empty turns it off).
    #[arg(long)]
    language: Option<String>,
    /// Directory of markdown prompt overrides (overrides PROMPTS_PATH).
    #[arg(long)]
    prompts: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(room) = cli.room {
        config.room_name = room;
    }
    if let Some(language) = cli.language {
        config.response_language = Some(language).filter(|l| !l.trim().is_empty());
    }
    if cli.prompts.is_some() {
        config.prompts_path = cli.prompts;
    }

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!("Configuration loaded. Initializing editors...");

    // --- 3. Initialize Shared Services ---
    let prompts = editor_prompts(
        config.prompts_path.as_deref(),
        config.response_language.as_deref(),
    )?;

    let api_key = config
        .provider_api_key()
        .context("No API key for the configured provider")?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(config.provider.api_base());
    let llm: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::new(openai_config));
    let host = Arc::new(ConsoleHost::new(llm.clone(), tokio::io::stdout()));
    let search = Arc::new(HttpSearchClient::new(config.search_settings()));

    let (story_tx, mut story_rx) = mpsc::channel(16);
    tokio::spawn(async move {
        while let Some(story) = story_rx.recv().await {
            debug!(?story, "Story updated.");
        }
    });

    // --- 4. Start the Session ---
    let session = AgentSession::new(
        host.clone(),
        SessionOptions {
            room: config.room_name.clone(),
            prompts,
            backends: config.backends.clone(),
        },
    )
    .with_search(search)
    .with_story_updates(story_tx);

    info!(
        provider = ?config.provider,
        model = %config.backends.llm_model,
        room = %config.room_name,
        "Editors configured. Starting session..."
    );
    let session_span = tracing::info_span!("agent_runtime", session_id = %session.id(), room = %config.room_name);
    run_session(session, host, llm).instrument(session_span).await
}

/// Reads user turns until the story is finished, stdin closes or Ctrl+C.
async fn run_session(
    mut session: AgentSession,
    host: Arc<ConsoleHost<Stdout>>,
    llm: Arc<dyn LLMClient>,
) -> anyhow::Result<()> {
    session
        .start()
        .await
        .context("The lead editor failed to open the conversation")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !session.is_ended() {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal. Shutting down...");
                break;
            }
        };
        let Some(line) = line else {
            info!("Input closed. Ending session.");
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        let Some(turn) = handle_user_turn_until(&mut session, llm.as_ref(), text, shutdown).await
        else {
            info!("Received shutdown signal during a reply. Shutting down...");
            host.interrupt().await?;
            break;
        };
        match turn {
            Ok(TurnResult::Replied(reply)) => {
                let speaker = session.active().role().to_string();
                host.print_line(&speaker, &reply).await?;
            }
            Ok(TurnResult::HandedOff { .. }) => {
                info!(agent = %session.active().role(), "Handoff complete.");
            }
            Ok(TurnResult::Finished) => break,
            Ok(TurnResult::Silent) => {}
            Err(e) => error!(error = ?e, "User turn failed."),
        }
    }

    info!(story = ?session.story(), ended = session.is_ended(), "Session finished.");
    Ok(())
}
