//! Directory response normalization.
//!
//! Turns a raw search response into a [`SearchResultSet`]. Field access is
//! total: missing, `null` or wrongly typed fields coerce to defaults rather
//! than failing, so only the outer shape of the payload can make a response
//! invalid.

use crate::error::SearchError;
use crate::protocol::api;
use crate::types::{SearchResultSet, WorldRecord};
use log::debug;
use serde_json::{Map, Value};

/// Normalize a raw response body.
pub fn parse_search_body(body: &[u8]) -> Result<SearchResultSet, SearchError> {
    let value: Value = serde_json::from_slice(body)?;
    parse_search_response(&value)
}

/// Normalize an already-parsed response.
///
/// * `{"spaces": [...]}` → records in API order; a repeated `space_id`
///   replaces the earlier record.
/// * `{"status": "404"}` (string or number) → [`SearchError::NotFound`].
/// * anything else → [`SearchError::Invalid`].
pub fn parse_search_response(raw: &Value) -> Result<SearchResultSet, SearchError> {
    let Some(object) = raw.as_object() else {
        return Err(SearchError::invalid(format!(
            "expected a JSON object, got {}",
            kind_of(raw)
        )));
    };

    match object.get(api::SPACES) {
        Some(Value::Array(spaces)) => {
            let mut set = SearchResultSet::new();
            for (index, entry) in spaces.iter().enumerate() {
                let Some(fields) = entry.as_object() else {
                    return Err(SearchError::invalid(format!(
                        "spaces[{}] is {}, expected an object",
                        index,
                        kind_of(entry)
                    )));
                };
                if let Some(previous) = set.insert(world_record(fields)) {
                    debug!("Duplicate world id '{}', keeping the later entry", previous.id);
                }
            }
            debug!("Normalized {} worlds from {} entries", set.len(), spaces.len());
            Ok(set)
        }
        Some(Value::Null) | None if is_not_found(object) => Err(SearchError::NotFound),
        Some(Value::Null) | None => Err(SearchError::invalid(
            "response has neither a spaces list nor a not-found status",
        )),
        Some(other) => Err(SearchError::invalid(format!(
            "spaces is {}, expected an array",
            kind_of(other)
        ))),
    }
}

fn is_not_found(object: &Map<String, Value>) -> bool {
    coerce_string(object.get(api::STATUS)) == api::STATUS_NOT_FOUND
}

fn world_record(fields: &Map<String, Value>) -> WorldRecord {
    WorldRecord {
        id: coerce_string(fields.get(api::SPACE_ID)),
        name: coerce_string(fields.get(api::NAME)),
        description: coerce_optional(fields.get(api::DESCRIPTION)),
        image_url: coerce_optional(fields.get(api::IMAGE_LARGE)),
        owner_display_name: coerce_string(fields.get(api::FIRST_NAME)),
        owner_username: coerce_string(fields.get(api::USERNAME)),
        favorite_count: coerce_count(fields.get(api::FAVORITED)),
        visit_count: coerce_count(fields.get(api::VISITED)),
    }
}

// ---------------------------------------------------------------------------
// Coercions
// ---------------------------------------------------------------------------

/// Strings pass through, scalars are stringified, everything else is `""`.
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Like [`coerce_string`], but blank text counts as absent.
fn coerce_optional(value: Option<&Value>) -> Option<String> {
    let s = coerce_string(value);
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Non-negative integer; negative, fractional parts and garbage clamp to 0.
fn coerce_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(float_count))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(float_count))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_count(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        // `as` saturates at u64::MAX
        f.trunc() as u64
    } else {
        0
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
