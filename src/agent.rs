//! SearchAgent – drives a [`SearchOrchestrator`] from prompt replies and
//! HTTP round trips.
//!
//! ## Concurrency model
//!
//! ```text
//! caller task                      search task (one per search)
//! ───────────────────────────────  ─────────────────────────────────────
//! spawn_search(q)
//!   lock → begin_search → emit
//!   ticket ─────────────────────►  transport.fetch(uri) under timeout
//!                                  lock → complete_search → emit
//! ```
//!
//! Tickets are issued on the caller's task, so start order is generation
//! order. Fetches run without the lock and may finish in any order; the
//! orchestrator drops every completion whose generation is no longer the
//! latest. Commands are pushed into the outbound channel while the lock is
//! held, so the channel order always matches the orchestrator's state order.

use crate::client::{SearchTransport, TransportError};
use crate::error::SearchError;
use crate::orchestrator::{SearchEvents, SearchOrchestrator, SearchSummary, SearchTicket};
use crate::protocol::{PromptResult, SceneCommand, SceneEvent};
use crate::types::{SearchConfig, SearchResultSet, SearchState, SearchStats};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type SceneEventSender = mpsc::UnboundedSender<SceneEvent<SceneCommand>>;
pub type SceneEventReceiver = mpsc::UnboundedReceiver<SceneEvent<SceneCommand>>;

// ---------------------------------------------------------------------------
// SearchAgent
// ---------------------------------------------------------------------------

pub struct SearchAgent<T> {
    session: String,
    timeout: Duration,
    orchestrator: Arc<Mutex<SearchOrchestrator>>,
    transport: Arc<T>,
    events: SceneEventSender,
}

impl<T> Clone for SearchAgent<T> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            timeout: self.timeout,
            orchestrator: self.orchestrator.clone(),
            transport: self.transport.clone(),
            events: self.events.clone(),
        }
    }
}

impl<T: SearchTransport + 'static> SearchAgent<T> {
    /// Create an agent and the receiving end of its scene command stream.
    pub fn new(config: SearchConfig, transport: T) -> (Self, SceneEventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let agent = Self {
            session: config.session.clone(),
            timeout: Duration::from_millis(config.request_timeout_ms),
            orchestrator: Arc::new(Mutex::new(SearchOrchestrator::new(config))),
            transport: Arc::new(transport),
            events: tx,
        };
        (agent, rx)
    }

    pub fn stats(&self) -> SearchStats {
        self.orchestrator.lock().stats()
    }

    pub fn state(&self) -> SearchState {
        self.orchestrator.lock().state().clone()
    }

    /// Snapshot of the last applied result set.
    pub fn results(&self) -> SearchResultSet {
        self.orchestrator.lock().results().clone()
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// React to a prompt reply: relabel the search button, then start a
    /// search if the prompt was submitted.
    ///
    /// The label and the new search are issued under one lock, so the last
    /// label sent always names the latest search.
    pub fn handle_prompt(
        &self,
        prompt: &PromptResult,
    ) -> Option<JoinHandle<Result<SearchSummary, SearchError>>> {
        let label = SceneCommand::SetButtonLabel {
            text: prompt.button_label(),
        };
        let mut orchestrator = self.orchestrator.lock();

        if !prompt.submitted {
            self.send(orchestrator.generation(), label);
            debug!("Prompt cancelled, keeping current results");
            return None;
        }

        let (ticket, events) = orchestrator.begin_search(&prompt.text);
        self.send(ticket.generation, label);
        self.emit(events);
        drop(orchestrator);
        Some(self.spawn_finish(ticket))
    }

    /// Start a search and finish it on a new Tokio task.
    ///
    /// The search is registered before this returns, so a later call always
    /// supersedes an earlier one.
    pub fn spawn_search(&self, query: &str) -> JoinHandle<Result<SearchSummary, SearchError>> {
        let ticket = self.begin(query);
        self.spawn_finish(ticket)
    }

    /// Run a search to completion on the current task.
    pub async fn search(&self, query: &str) -> Result<SearchSummary, SearchError> {
        let ticket = self.begin(query);
        self.finish(ticket).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn spawn_finish(&self, ticket: SearchTicket) -> JoinHandle<Result<SearchSummary, SearchError>> {
        let agent = self.clone();
        tokio::spawn(async move { agent.finish(ticket).await })
    }

    fn begin(&self, query: &str) -> SearchTicket {
        let mut orchestrator = self.orchestrator.lock();
        let (ticket, events) = orchestrator.begin_search(query);
        self.emit(events);
        ticket
    }

    async fn finish(&self, ticket: SearchTicket) -> Result<SearchSummary, SearchError> {
        let fetch = self.transport.fetch(ticket.uri.clone());
        let response = match tokio::time::timeout(self.timeout, fetch).await {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(err)) => Err(SearchError::from(err)),
            Err(_) => Err(SearchError::from(TransportError::Timeout(self.timeout))),
        };

        let mut orchestrator = self.orchestrator.lock();
        let (result, events) = orchestrator.complete_search(&ticket, response);
        self.emit(events);
        result
    }

    fn emit(&self, events: SearchEvents) {
        for command in events.commands {
            self.send(events.generation, command);
        }
    }
}

impl<T> SearchAgent<T> {
    fn send(&self, generation: u64, command: SceneCommand) {
        let event = SceneEvent::new(self.session.as_str(), generation, command);
        if self.events.send(event).is_err() {
            debug!("Scene event receiver closed, dropping command");
        }
    }
}

// ---------------------------------------------------------------------------
// Forwarding
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OutboundLine<'a> {
    subject: &'a str,
    #[serde(flatten)]
    event: &'a SceneEvent<SceneCommand>,
}

/// Drain `events` into `out` as one JSON object per line, tagged with the
/// command's subject. Returns the number of lines written once every
/// sender is gone.
///
/// Serialisation failures are logged and skipped; write failures end the
/// loop.
pub async fn forward_scene_events<W>(
    mut events: SceneEventReceiver,
    mut out: W,
) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(event) = events.recv().await {
        let line = OutboundLine {
            subject: event.payload.subject(),
            event: &event,
        };
        match serde_json::to_vec(&line) {
            Ok(mut bytes) => {
                bytes.push(b'\n');
                out.write_all(&bytes).await?;
                out.flush().await?;
                written += 1;
            }
            Err(e) => warn!("Failed to serialise scene event for {}: {}", line.subject, e),
        }
    }
    Ok(written)
}
