//! Core data types for fetched pages and search results.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::cookies::CookieJar;

/// Final, non-redirect response of a fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers as lower-case `(name, value)` pairs. Multi-valued
    /// headers such as `set-cookie` appear once per value.
    pub headers: Vec<(String, String)>,
    /// Response body as text.
    pub body: String,
    /// URL that produced this response, after redirects.
    pub final_url: String,
    /// Cookies sent with the request plus every cookie set along the
    /// redirect chain and by this response.
    pub cookies: CookieJar,
}

impl FetchResult {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a header, matched case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Cookies set by this response alone.
    pub fn set_cookies(&self) -> CookieJar {
        self.header_values("set-cookie").collect()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// One parsed forum search hit.
///
/// Never constructed with a title shorter than three characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// Thread title with markup stripped.
    pub title: String,
    /// Absolute thread URL.
    pub url: String,
    /// Post excerpt, at most 300 characters.
    #[serde(default)]
    pub snippet: String,
    /// Poster's username, empty when the hit names none.
    #[serde(default)]
    pub author: String,
    /// ISO timestamp from `<time datetime>`, or the element's visible text.
    #[serde(default)]
    pub date: String,
    /// Sub-forum name; absent when the hit carries no forum link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forum: Option<String>,
}

/// Outcome of one search invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResponse {
    Success {
        query: String,
        results: Vec<SearchResultItem>,
    },
    Failure {
        error: String,
        query: String,
        google_fallback: String,
    },
}

impl SearchResponse {
    pub fn query(&self) -> &str {
        match self {
            SearchResponse::Success { query, .. } | SearchResponse::Failure { query, .. } => query,
        }
    }

    /// Parsed results; always empty for a failure.
    pub fn results(&self) -> &[SearchResultItem] {
        match self {
            SearchResponse::Success { results, .. } => results.as_slice(),
            SearchResponse::Failure { .. } => &[],
        }
    }

    pub fn result_count(&self) -> usize {
        self.results().len()
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SearchResponse::Success { .. } => None,
            SearchResponse::Failure { error, .. } => Some(error),
        }
    }

    pub fn google_fallback(&self) -> Option<&str> {
        match self {
            SearchResponse::Success { .. } => None,
            SearchResponse::Failure {
                google_fallback, ..
            } => Some(google_fallback),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchResponse::Success { .. })
    }
}

/// Serializes to `{query, result_count, results}` on success and
/// `{error, query, results: [], google_fallback}` on failure.
impl Serialize for SearchResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SearchResponse::Success { query, results } => {
                let mut s = serializer.serialize_struct("SearchResponse", 3)?;
                s.serialize_field("query", query)?;
                s.serialize_field("result_count", &results.len())?;
                s.serialize_field("results", results)?;
                s.end()
            }
            SearchResponse::Failure {
                error,
                query,
                google_fallback,
            } => {
                let mut s = serializer.serialize_struct("SearchResponse", 4)?;
                s.serialize_field("error", error)?;
                s.serialize_field("query", query)?;
                s.serialize_field("results", &[] as &[SearchResultItem])?;
                s.serialize_field("google_fallback", google_fallback)?;
                s.end()
            }
        }
    }
}
