//! SearchOrchestrator – search lifecycle, generation tracking, scene teardown.
//!
//! ```text
//!            begin_search                complete_search
//!   Idle ───────────────► Searching{g} ───────────────► Populated{n} | Empty | Failed
//!    ▲                        ▲                                    │
//!    │                        └──────── begin_search ──────────────┘
//! ```
//!
//! Populated, Empty and Failed are resting states; a new search may start
//! from any state. Starting a search tears down every teleporter placed by
//! the previous one and clears the result set, so the scene never mixes
//! results from two searches.
//!
//! The orchestrator does no I/O. Callers fetch the ticket's URI themselves
//! and hand the outcome back; [`crate::agent::SearchAgent`] is the async
//! driver used by the bridge.

use crate::error::SearchError;
use crate::layout::plan_layout;
use crate::normalize::parse_search_response;
use crate::protocol::SceneCommand;
use crate::query::build_search_request;
use crate::types::{SearchConfig, SearchResultSet, SearchState, SearchStats};
use log::{debug, info, warn};
use serde_json::Value;
use url::Url;

pub const STATUS_NO_RESULTS: &str = "No worlds found";
pub const STATUS_FAILED: &str = "Search failed, please try again";

// ---------------------------------------------------------------------------
// Tickets & events
// ---------------------------------------------------------------------------

/// Handle for one started search. Pass it back to
/// [`SearchOrchestrator::complete_search`] with the response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: String,
    /// Request to issue for this search.
    pub uri: Url,
}

/// Commands produced by a single orchestrator transition.
///
/// Callers (typically [`crate::agent::SearchAgent`]) forward these to the
/// host in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchEvents {
    /// Generation that produced these commands.
    pub generation: u64,
    pub commands: Vec<SceneCommand>,
}

/// Result of applying one search outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    pub generation: u64,
    pub query: String,
    /// Number of teleporters placed.
    pub placed: usize,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct SearchOrchestrator {
    config: SearchConfig,
    state: SearchState,
    generation: u64,
    results: SearchResultSet,
    /// World ids of teleporters currently in the scene, in placement order.
    placed: Vec<String>,
    stats: SearchStats,
}

impl SearchOrchestrator {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            state: SearchState::Idle,
            generation: 0,
            results: SearchResultSet::new(),
            placed: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Latest issued generation (0 before the first search).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Results of the last applied search.
    pub fn results(&self) -> &SearchResultSet {
        &self.results
    }

    pub fn placed(&self) -> &[String] {
        &self.placed
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            generation: self.generation,
            placed_teleporters: self.placed.len(),
            ..self.stats.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Start a new search, superseding any search still in flight.
    ///
    /// Returns the ticket for the request plus the teardown commands for
    /// everything the previous search placed.
    pub fn begin_search(&mut self, query: &str) -> (SearchTicket, SearchEvents) {
        self.generation += 1;
        self.stats.searches_started += 1;

        if let SearchState::Searching { generation } = self.state {
            debug!("Search {} superseded by search {}", generation, self.generation);
        }

        let mut commands: Vec<SceneCommand> = self
            .placed
            .drain(..)
            .map(|world_id| SceneCommand::RemoveTeleporter { world_id })
            .collect();
        self.results.clear();

        commands.push(SceneCommand::ShowStatus {
            text: format!("Searching for \"{}\"...", query),
        });

        let uri = build_search_request(&self.config.endpoint, query, self.config.max_results);
        info!("Search {} started: {}", self.generation, uri);

        self.state = SearchState::Searching {
            generation: self.generation,
        };

        let ticket = SearchTicket {
            generation: self.generation,
            query: query.to_string(),
            uri,
        };
        let events = SearchEvents {
            generation: self.generation,
            commands,
        };
        (ticket, events)
    }

    /// Apply the outcome of the request described by `ticket`.
    ///
    /// `response` is the parsed body, or the transport-level failure. Stale
    /// tickets are rejected with [`SearchError::Superseded`] and produce no
    /// commands. [`SearchError::NotFound`] and [`SearchError::Invalid`] are
    /// returned after the corresponding status command has been produced.
    pub fn complete_search(
        &mut self,
        ticket: &SearchTicket,
        response: Result<Value, SearchError>,
    ) -> (Result<SearchSummary, SearchError>, SearchEvents) {
        let mut events = SearchEvents {
            generation: ticket.generation,
            commands: Vec::new(),
        };

        if ticket.generation != self.generation {
            self.stats.searches_superseded += 1;
            debug!(
                "Dropping response for search {} (latest is {})",
                ticket.generation, self.generation
            );
            let err = SearchError::Superseded {
                generation: ticket.generation,
                latest: self.generation,
            };
            return (Err(err), events);
        }

        let outcome = response.and_then(|raw| parse_search_response(&raw));
        let result = match outcome {
            Ok(results) => {
                self.stats.searches_applied += 1;
                self.stats.last_result_count = results.len();
                self.populate(results, &mut events.commands);
                info!(
                    "Search {} for '{}' placed {} teleporters",
                    ticket.generation,
                    ticket.query,
                    self.placed.len()
                );
                self.state = SearchState::Populated {
                    count: self.placed.len(),
                };
                Ok(SearchSummary {
                    generation: ticket.generation,
                    query: ticket.query.clone(),
                    placed: self.placed.len(),
                })
            }
            Err(SearchError::NotFound) => {
                self.stats.searches_applied += 1;
                self.stats.last_result_count = 0;
                info!("Search {} for '{}' found nothing", ticket.generation, ticket.query);
                events.commands.push(SceneCommand::ShowStatus {
                    text: STATUS_NO_RESULTS.into(),
                });
                self.state = SearchState::Empty;
                Err(SearchError::NotFound)
            }
            Err(err) => {
                self.stats.searches_failed += 1;
                self.stats.last_result_count = 0;
                warn!("Search {} for '{}' failed: {}", ticket.generation, ticket.query, err);
                events.commands.push(SceneCommand::ShowStatus {
                    text: STATUS_FAILED.into(),
                });
                self.state = SearchState::Failed {
                    reason: err.to_string(),
                };
                Err(err)
            }
        };

        (result, events)
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    fn populate(&mut self, results: SearchResultSet, commands: &mut Vec<SceneCommand>) {
        for (record, slot) in plan_layout(&results, self.config.spacing, self.config.base_offset) {
            debug!("Placing '{}' at {}", record.id, slot.position);
            commands.push(SceneCommand::PlaceTeleporter {
                world_id: record.id.clone(),
                label: record.name.clone(),
                position: slot.position,
                rotation: slot.rotation,
                scale: slot.scale,
            });
            commands.push(SceneCommand::AttachInfoPopup {
                world_id: record.id.clone(),
                text: record.info_text(),
            });
            if let Some(image_url) = record.image_url.clone() {
                commands.push(SceneCommand::AttachPreviewImage {
                    world_id: record.id.clone(),
                    image_url,
                });
            }
            self.placed.push(record.id);
        }

        let status = match results.len() {
            0 => STATUS_NO_RESULTS.to_string(),
            1 => "1 world found".to_string(),
            n => format!("{} worlds found", n),
        };
        commands.push(SceneCommand::ShowStatus { text: status });
        self.results = results;
    }
}
