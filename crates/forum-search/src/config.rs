//! Configuration loading and resolution.
//!
//! Values resolve in the order explicit setting > environment > default.

use std::time::Duration;

/// Default forum root. All search endpoints hang off this path.
pub const DEFAULT_BASE_URL: &str = "https://www.b4x.com/android/forum";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on redirects followed per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Environment variable overriding the forum base URL.
pub const ENV_BASE_URL: &str = "B4X_FORUM_URL";

/// Environment variable overriding the request timeout, in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "B4X_SEARCH_TIMEOUT_SECS";

/// Settings shared by the fetcher, extractor and orchestrator.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Forum root, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout, covering connect through body read.
    pub timeout: Duration,
    /// Redirect hops followed before a fetch fails.
    pub max_redirects: usize,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// `Accept` sent with every request.
    pub accept: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }
}

impl SearchConfig {
    /// Defaults overlaid with any `B4X_*` environment variables.
    ///
    /// Unparseable or empty values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                config = config.with_base_url(url.trim());
            }
        }

        if let Some(secs) = std::env::var(ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            config.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Replace the base URL, trimming any trailing slashes.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Landing page that carries the CSRF token.
    pub fn search_page_url(&self) -> String {
        format!("{}/search/", self.base_url)
    }

    /// Form submission endpoint.
    pub fn search_submit_url(&self) -> String {
        format!("{}/search/search", self.base_url)
    }

    /// Google query restricted to the forum, used when the forum search fails.
    pub fn google_fallback(&self, query: &str) -> String {
        format!(
            "https://www.google.com/search?q=site:{}+{}",
            self.site_scope(),
            urlencoding::encode(query)
        )
    }

    /// `host/path` of the base URL with scheme and leading `www.` removed,
    /// e.g. `b4x.com/android/forum`.
    fn site_scope(&self) -> String {
        match url::Url::parse(&self.base_url) {
            Ok(parsed) => {
                let host = parsed.host_str().unwrap_or_default();
                let host = host.strip_prefix("www.").unwrap_or(host);
                format!("{host}{}", parsed.path().trim_end_matches('/'))
            }
            Err(_) => self.base_url.clone(),
        }
    }
}
