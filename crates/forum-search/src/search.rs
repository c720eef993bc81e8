//! Forum search orchestration: token fetch, form submit, extraction.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::error::Result;
use crate::extract::Extractor;
use crate::http::{FetchOptions, Fetcher};
use crate::types::{SearchResponse, SearchResultItem};

/// Name of XenForo's CSRF token field.
pub const TOKEN_FIELD: &str = "_xfToken";

static TOKEN_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<input[^>]*name="_xfToken"[^>]*value="([^"]*)""#).expect("valid regex")
});

/// Pull the CSRF token out of the search landing page.
///
/// Returns an empty string when the field is missing; the submission is
/// still attempted and the forum decides whether to accept it.
pub fn extract_token(html: &str) -> String {
    TOKEN_INPUT
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// URL-encoded body of the search form.
pub fn build_search_form(query: &str, token: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("keywords", query)
        .append_pair("order", "relevance")
        .append_pair("search_type", "thread")
        .append_pair(TOKEN_FIELD, token)
        .finish()
}

/// Runs searches against one forum.
#[derive(Clone)]
pub struct ForumSearcher {
    config: SearchConfig,
    fetcher: Fetcher,
    extractor: Extractor,
}

impl ForumSearcher {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config)?;
        let extractor = Extractor::new(config.base_url.clone());
        Ok(Self {
            config,
            fetcher,
            extractor,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search for `query` and return at most `limit` hits.
    ///
    /// Never fails: any fetch error becomes [`SearchResponse::Failure`] with a
    /// Google URL scoped to the forum.
    pub async fn search(&self, query: &str, limit: usize) -> SearchResponse {
        match self.try_search(query, limit).await {
            Ok(results) => {
                info!(query, results = results.len(), "search complete");
                SearchResponse::Success {
                    query: query.to_string(),
                    results,
                }
            }
            Err(e) => {
                warn!(query, error = %e, "search failed");
                SearchResponse::Failure {
                    error: e.to_string(),
                    query: query.to_string(),
                    google_fallback: self.config.google_fallback(query),
                }
            }
        }
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<SearchResultItem>> {
        let landing = self
            .fetcher
            .fetch(&self.config.search_page_url(), FetchOptions::get(), None)
            .await?;
        if !landing.is_success() {
            warn!(
                status = landing.status_code,
                url = %landing.final_url,
                "search page returned non-success status"
            );
        }

        let token = extract_token(&landing.body);
        if token.is_empty() {
            warn!("no {TOKEN_FIELD} on search page, submitting without it");
        }

        let form = build_search_form(query, &token);
        let options = FetchOptions::post()
            .header("Content-Type", "application/x-www-form-urlencoded")
            .cookies(landing.cookies);

        let submitted = self
            .fetcher
            .fetch(&self.config.search_submit_url(), options, Some(form))
            .await?;
        if !submitted.is_success() {
            warn!(
                status = submitted.status_code,
                url = %submitted.final_url,
                "search submit returned non-success status"
            );
        }

        Ok(self.extractor.parse_search_results(&submitted.body, limit))
    }
}
