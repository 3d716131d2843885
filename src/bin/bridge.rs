//! world-search-bridge binary
//!
//! Sits between a mixed-reality host and the world directory. Reads prompt
//! replies from stdin and writes scene commands to stdout, one JSON object
//! per line. Logs go to stderr.
//!
//! ## Input (stdin)
//!
//! Either a `PromptResult` object (`{"text": "...", "submitted": true}`) or
//! a plain line, which is treated as a submitted query.
//!
//! ## Configuration (TOML via `--config`, env via `config` crate)
//!
//! See [`world_search::settings`] for keys. CLI flags override both.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use world_search::{
    agent::{forward_scene_events, SearchAgent},
    client::HttpSearchClient,
    protocol::PromptResult,
    settings::load_settings,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "world-search-bridge", about = "World search host bridge", version)]
struct Args {
    /// TOML settings file
    #[arg(long, env = "WORLD_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Session tag stamped on outbound events
    #[arg(long)]
    session: Option<String>,

    /// Result cap per search
    #[arg(long)]
    max_results: Option<u32>,

    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Search to run once at start-up
    #[arg(long)]
    initial_query: Option<String>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging (stderr; stdout carries scene commands)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("world_search=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = load_settings(args.config.as_deref()).context("Failed to load settings")?;
    if let Some(session) = args.session {
        config.session = session;
    }
    if let Some(max_results) = args.max_results {
        config.max_results = max_results;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    if args.initial_query.is_some() {
        config.initial_query = args.initial_query;
    }

    tracing::info!(
        endpoint = %config.endpoint,
        session = %config.session,
        max_results = config.max_results,
        "Starting world-search-bridge"
    );

    let transport = HttpSearchClient::new(
        &config.user_agent,
        Duration::from_millis(config.request_timeout_ms),
    )
    .context("Failed to build HTTP client")?;

    let initial_query = config.initial_query.clone();
    let (agent, events) = SearchAgent::new(config, transport);
    let forwarder = tokio::spawn(forward_scene_events(events, tokio::io::stdout()));

    let mut pending = Vec::new();
    if let Some(query) = initial_query {
        pending.push(agent.spawn_search(&query));
    }

    // -----------------------------------------------------------------------
    // Prompt loop
    // -----------------------------------------------------------------------

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let prompt = PromptResult::from_line(&line);
                pending.retain(|handle| !handle.is_finished());
                if let Some(handle) = agent.handle_prompt(&prompt) {
                    pending.push(handle);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("world-search-bridge shutting down (SIGINT)");
                break;
            }
        }
    }

    // Let in-flight searches land before closing the command stream.
    for handle in pending {
        if let Err(e) = handle.await {
            tracing::warn!("Search task failed: {}", e);
        }
    }

    let stats = agent.stats();
    drop(agent);
    let written = forwarder.await.context("Forwarder task panicked")??;
    tracing::info!(
        searches = stats.searches_started,
        superseded = stats.searches_superseded,
        commands = written,
        "world-search-bridge stopped"
    );
    Ok(())
}
