//! Layered configuration: built-in defaults, an optional TOML file, then
//! `WORLD_SEARCH_*` environment variables.
//!
//! | Key                   | Env                              | Default                 |
//! |-----------------------|----------------------------------|-------------------------|
//! | `endpoint`            | `WORLD_SEARCH_ENDPOINT`          | public directory search |
//! | `max_results`         | `WORLD_SEARCH_MAX_RESULTS`       | `25`                    |
//! | `request_timeout_ms`  | `WORLD_SEARCH_REQUEST_TIMEOUT_MS`| `10000`                 |
//! | `spacing`             | `WORLD_SEARCH_SPACING`           | `1.5`                   |
//! | `base_offset`         | `WORLD_SEARCH_BASE_OFFSET`       | `0.0`                   |
//! | `session`             | `WORLD_SEARCH_SESSION`           | `default`               |
//! | `user_agent`          | `WORLD_SEARCH_USER_AGENT`        | `world-search/<ver>`    |
//! | `initial_query`       | `WORLD_SEARCH_INITIAL_QUERY`     | *(none)*                |

use crate::types::SearchConfig;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;

pub const ENV_PREFIX: &str = "WORLD_SEARCH";

/// Load a [`SearchConfig`]. Keys missing from every source keep their
/// defaults; a `path` that does not exist is an error.
pub fn load_settings(path: Option<&Path>) -> Result<SearchConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    builder
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize()
}
