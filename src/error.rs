//! Search error taxonomy.

/// Every way a search can end without new results being placed.
///
/// None of these reach the rendering side: the orchestrator turns them into
/// status commands (or, for [`SearchError::Superseded`], nothing at all).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The directory reported no match. Equivalent to zero results.
    #[error("no worlds found")]
    NotFound,

    /// Transport failure, timeout, malformed JSON or an unexpected schema.
    #[error("invalid search response: {0}")]
    Invalid(String),

    /// A newer search started before this one completed.
    #[error("search {generation} superseded by search {latest}")]
    Superseded { generation: u64, latest: u64 },
}

impl SearchError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SearchError::Invalid(reason.into())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Invalid(format!("malformed JSON: {}", err))
    }
}
