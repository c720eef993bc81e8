//! Forum search: fetch the B4X forum search page, submit the search form
//! with its CSRF token, and extract structured results from the reply.

pub mod config;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod html;
pub mod http;
pub mod search;
pub mod types;

pub use config::SearchConfig;
pub use cookies::CookieJar;
pub use error::{FetchError, Result};
pub use extract::{extract_result_from_item, parse_search_results, Extractor};
pub use html::strip_html;
pub use http::{FetchOptions, Fetcher};
pub use search::ForumSearcher;
pub use types::*;
