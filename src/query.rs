//! Search request construction.

use crate::protocol::api;
use crate::types::default_endpoint;
use url::Url;

/// Build the GET URI for `query` against `endpoint`.
///
/// Any query string already on `endpoint` is replaced. `q` and `per` are
/// form-encoded, so decoding the `q` pair yields `query` unchanged; an empty
/// query is sent as `q=` and left to the server. `per` is at least 1.
pub fn build_search_request(endpoint: &Url, query: &str, max_results: u32) -> Url {
    let mut uri = endpoint.clone();
    uri.set_query(None);
    uri.query_pairs_mut()
        .append_pair(api::PARAM_QUERY, query)
        .append_pair(api::PARAM_PER_PAGE, &max_results.max(1).to_string());
    uri
}

/// [`build_search_request`] against the public directory endpoint.
pub fn default_search_request(query: &str, max_results: u32) -> Url {
    build_search_request(&default_endpoint(), query, max_results)
}

/// Decoded value of the `q` parameter, if present.
pub fn query_text(uri: &Url) -> Option<String> {
    uri.query_pairs()
        .find(|(k, _)| k == api::PARAM_QUERY)
        .map(|(_, v)| v.into_owned())
}
