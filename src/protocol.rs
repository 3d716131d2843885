//! Wire protocol for everything that crosses the pipeline boundary.
//!
//! ## Boundaries
//!
//! | Direction             | Carried by                | Types                         |
//! |-----------------------|---------------------------|-------------------------------|
//! | directory → pipeline  | HTTP JSON body            | [`api`] field names           |
//! | host → pipeline       | prompt dialog reply       | [`PromptResult`]              |
//! | pipeline → host       | scene command stream      | [`SceneEvent`]<[`SceneCommand`]> |
//!
//! ## Design rules
//!
//! 1. Scene commands are plain data; no rendering types appear here.
//! 2. Every outbound event carries `session` and the search `generation`
//!    that produced it.
//! 3. The directory response is never deserialized into a strict struct;
//!    the normalizer reads it field by field so that odd payloads degrade
//!    to defaults instead of failing.

use crate::types::Vec3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Directory response schema
// ---------------------------------------------------------------------------

/// Field names of the directory search response.
pub mod api {
    /// Query parameter carrying the search text.
    pub const PARAM_QUERY: &str = "q";
    /// Query parameter carrying the result cap.
    pub const PARAM_PER_PAGE: &str = "per";

    pub const SPACES: &str = "spaces";
    pub const STATUS: &str = "status";
    /// `status` value the directory uses when nothing matched.
    pub const STATUS_NOT_FOUND: &str = "404";

    pub const SPACE_ID: &str = "space_id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const IMAGE_LARGE: &str = "image_large";
    pub const FIRST_NAME: &str = "first_name";
    pub const USERNAME: &str = "username";
    pub const FAVORITED: &str = "favorited";
    pub const VISITED: &str = "visited";
}

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

/// Every outbound command is wrapped in this envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneEvent<T> {
    pub session: String,
    /// Search generation that produced the payload.
    pub generation: u64,
    pub payload: T,
}

impl<T> SceneEvent<T> {
    pub fn new(session: impl Into<String>, generation: u64, payload: T) -> Self {
        Self {
            session: session.into(),
            generation,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Scene commands  (pipeline → host)
// ---------------------------------------------------------------------------

/// Instruction for the host runtime. The host owns actors, assets and
/// teleport mechanics; it only has to interpret these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SceneCommand {
    /// Destroy the teleporter spawned for `world_id` by an earlier search.
    RemoveTeleporter { world_id: String },
    /// Spawn a teleporter for `world_id` with a text label.
    PlaceTeleporter {
        world_id: String,
        label: String,
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
    },
    /// Attach a "more info" trigger to the teleporter for `world_id`.
    AttachInfoPopup { world_id: String, text: String },
    /// Attach a preview image to the teleporter for `world_id`.
    AttachPreviewImage { world_id: String, image_url: String },
    /// Replace the text of the result/status area.
    ShowStatus { text: String },
    /// Replace the text of the search button.
    SetButtonLabel { text: String },
}

impl SceneCommand {
    /// Subject this command is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            SceneCommand::RemoveTeleporter { .. } => subjects::TELEPORTER_REMOVED,
            SceneCommand::PlaceTeleporter { .. } => subjects::TELEPORTER_PLACED,
            SceneCommand::AttachInfoPopup { .. } => subjects::TELEPORTER_INFO,
            SceneCommand::AttachPreviewImage { .. } => subjects::TELEPORTER_PREVIEW,
            SceneCommand::ShowStatus { .. } => subjects::STATUS,
            SceneCommand::SetButtonLabel { .. } => subjects::BUTTON_LABEL,
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt replies  (host → pipeline)
// ---------------------------------------------------------------------------

/// Reply from the host's text prompt dialog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptResult {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_submitted")]
    pub submitted: bool,
}

fn default_submitted() -> bool {
    true
}

impl PromptResult {
    pub fn submitted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            submitted: true,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            text: String::new(),
            submitted: false,
        }
    }

    /// Decode one line of the host's prompt stream.
    ///
    /// A JSON object is read as a full reply; anything else (including a
    /// bare JSON string) is a submitted query with trailing whitespace
    /// removed.
    pub fn from_line(line: &str) -> Self {
        serde_json::from_str(line).unwrap_or_else(|_| Self::submitted(line.trim_end()))
    }

    /// Label the search button shows after this reply.
    pub fn button_label(&self) -> String {
        if self.submitted {
            format!("Search\nLast: {}", self.text)
        } else {
            "Search\nLast: <cancelled>".to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Subject helpers
// ---------------------------------------------------------------------------

/// All subjects used by the scene protocol, as constants.
pub mod subjects {
    pub const TELEPORTER_PLACED: &str = "scene.teleporter.placed";
    pub const TELEPORTER_REMOVED: &str = "scene.teleporter.removed";
    pub const TELEPORTER_INFO: &str = "scene.teleporter.info";
    pub const TELEPORTER_PREVIEW: &str = "scene.teleporter.preview";

    pub const STATUS: &str = "scene.status";
    pub const BUTTON_LABEL: &str = "scene.button.label";
}
