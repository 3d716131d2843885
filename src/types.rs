//! Core search types shared across all modules.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use url::Url;

/// Public world directory search endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://account.altvr.com/api/public/spaces/search";

/// Result cap used when the caller does not choose one.
pub const DEFAULT_MAX_RESULTS: u32 = 25;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// World records
// ---------------------------------------------------------------------------

/// One world returned by the directory search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldRecord {
    /// Opaque directory identifier, unique within one result set.
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Preview image shown next to the teleporter.
    pub image_url: Option<String>,
    pub owner_display_name: String,
    pub owner_username: String,
    pub favorite_count: u64,
    pub visit_count: u64,
}

impl WorldRecord {
    /// Text shown by the "more info" popup.
    ///
    /// ```text
    /// <name>
    ///
    /// By <owner display name> (<owner username>)
    ///
    /// <description, when present>
    ///
    /// Favorited <n> | Visited <n>
    /// ```
    pub fn info_text(&self) -> String {
        let mut text = format!(
            "{}\n\nBy {} ({})",
            self.name, self.owner_display_name, self.owner_username
        );
        if let Some(description) = &self.description {
            let _ = write!(text, "\n\n{}", description);
        }
        let _ = write!(
            text,
            "\n\nFavorited {} | Visited {}",
            self.favorite_count, self.visit_count
        );
        text
    }
}

// ---------------------------------------------------------------------------
// Result set
// ---------------------------------------------------------------------------

/// Insertion-ordered mapping of world id to record for a single search.
///
/// Re-inserting an id replaces the stored record but keeps the slot of the
/// first occurrence, so iteration order always follows the API order of
/// first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResultSet {
    records: IndexMap<String, WorldRecord>,
}

impl SearchResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the record it replaced (if any).
    pub fn insert(&mut self, record: WorldRecord) -> Option<WorldRecord> {
        self.records.insert(record.id.clone(), record)
    }

    pub fn get(&self, id: &str) -> Option<&WorldRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldRecord> {
        self.records.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

impl FromIterator<WorldRecord> for SearchResultSet {
    fn from_iter<I: IntoIterator<Item = WorldRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Where the host should place the teleporter for one record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlacementSlot {
    /// Zero-based position in the result set.
    pub index: usize,
    pub position: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
}

// ---------------------------------------------------------------------------
// State & stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SearchState {
    Idle,
    Searching { generation: u64 },
    Populated { count: usize },
    /// The directory reported that nothing matched.
    Empty,
    Failed { reason: String },
}

impl SearchState {
    /// True while a request is outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, SearchState::Searching { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchStats {
    /// Latest issued search generation.
    pub generation: u64,
    pub searches_started: u64,
    pub searches_applied: u64,
    pub searches_superseded: u64,
    pub searches_failed: u64,
    pub last_result_count: usize,
    pub placed_teleporters: usize,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Directory search endpoint; `q` and `per` are appended per request.
    pub endpoint: Url,
    /// Value of the `per` parameter.
    pub max_results: u32,
    /// Upper bound on a single search round trip.
    pub request_timeout_ms: u64,
    /// Distance between neighbouring teleporters along the x axis.
    pub spacing: f32,
    /// x offset of the layout origin.
    pub base_offset: f32,
    /// Session tag stamped on every outbound scene event.
    pub session: String,
    pub user_agent: String,
    /// Search issued once when the bridge starts.
    pub initial_query: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            max_results: DEFAULT_MAX_RESULTS,
            request_timeout_ms: 10_000,
            spacing: 1.5,
            base_offset: 0.0,
            session: "default".into(),
            user_agent: concat!("world-search/", env!("CARGO_PKG_VERSION")).into(),
            initial_query: None,
        }
    }
}

/// Parsed form of [`DEFAULT_SEARCH_ENDPOINT`].
pub fn default_endpoint() -> Url {
    Url::parse(DEFAULT_SEARCH_ENDPOINT).expect("DEFAULT_SEARCH_ENDPOINT is a valid URL")
}
