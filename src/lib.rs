//! World Search
//!
//! Turns a free-text query into teleporters in a mixed-reality scene: query
//! the public world directory, normalize the results and lay them out in a
//! row in front of the search button.
//!
//! ## Architecture
//!
//! ```text
//! SearchAgent  (agent.rs)          ← prompt replies, HTTP, timeouts
//!   └── SearchOrchestrator  (orchestrator.rs) ← generations, teardown
//!         ├── build_search_request  (query.rs)
//!         ├── parse_search_response (normalize.rs)
//!         └── plan_layout           (layout.rs)
//! ```
//!
//! The orchestrator emits [`protocol::SceneCommand`]s; the host runtime owns
//! actors, assets and teleport mechanics and only interprets them.

// Pure pipeline (no runtime feature needed).
pub mod error;
pub mod layout;
pub mod normalize;
pub mod orchestrator;
pub mod protocol;
pub mod query;
pub mod settings;
pub mod types;

// Async runtime modules require the `runtime` feature.
#[cfg(feature = "runtime")]
pub mod agent;
#[cfg(feature = "runtime")]
pub mod client;

// Convenience re-exports (runtime only)
#[cfg(feature = "runtime")]
pub use agent::{forward_scene_events, SearchAgent};
#[cfg(feature = "runtime")]
pub use client::{HttpSearchClient, SearchTransport, TransportError};

pub use error::SearchError;
pub use layout::plan_layout;
pub use normalize::{parse_search_body, parse_search_response};
pub use orchestrator::{SearchEvents, SearchOrchestrator, SearchSummary, SearchTicket};
pub use protocol::{PromptResult, SceneCommand, SceneEvent};
pub use query::build_search_request;
pub use types::{
    PlacementSlot, SearchConfig, SearchResultSet, SearchState, SearchStats, Vec3, WorldRecord,
};
