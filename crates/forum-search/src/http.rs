//! Async HTTP fetcher wrapping reqwest.
//!
//! Plain GET and POST requests with a browser-like header set. reqwest's own
//! redirect policy is disabled and redirects are chased here instead, so that cookies set on
//! intermediate hops (XenForo sets its CSRF cookie on the first response)
//! are captured and replayed on the next hop.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE, LOCATION, SET_COOKIE, USER_AGENT,
};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::SearchConfig;
use crate::cookies::CookieJar;
use crate::error::{FetchError, Result};
use crate::types::FetchResult;

/// Per-request options for [`Fetcher::fetch`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// HTTP method, `GET` by default.
    pub method: Method,
    /// Extra headers merged over the defaults; these win on conflict.
    pub headers: Vec<(String, String)>,
    /// Cookies sent as the `Cookie` header.
    pub cookies: Option<CookieJar>,
    /// Redirect bound; `None` uses the fetcher's configured value.
    pub max_redirects: Option<usize>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            cookies: None,
            max_redirects: None,
        }
    }
}

impl FetchOptions {
    /// A plain `GET` with no extra headers or cookies.
    pub fn get() -> Self {
        Self::default()
    }

    /// A `POST`; the body is passed to [`Fetcher::fetch`].
    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    /// Add a header, replacing any default of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn cookies(mut self, cookies: CookieJar) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }
}

/// HTTP client for talking to the forum.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    user_agent: String,
    accept: String,
    timeout: Duration,
    max_redirects: usize,
}

impl Fetcher {
    /// Create a fetcher with the config's timeout, redirect bound and
    /// default headers.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            accept: config.accept.clone(),
            timeout: config.timeout,
            max_redirects: config.max_redirects,
        })
    }

    /// Perform one logical request, following redirects.
    ///
    /// A 3xx response with a `Location` header is never returned: its
    /// `Set-Cookie` pairs go into the jar and the request is reissued at the
    /// resolved location. The method and body are kept across hops, except
    /// for 303 which continues as a body-less GET. Fails with
    /// [`FetchError::TooManyRedirects`] once the bound is exceeded.
    pub async fn fetch(
        &self,
        url: &str,
        options: FetchOptions,
        body: Option<String>,
    ) -> Result<FetchResult> {
        let max_redirects = options.max_redirects.unwrap_or(self.max_redirects);
        let base_headers = self.merged_headers(&options.headers)?;
        let mut jar = options.cookies.unwrap_or_default();
        let mut method = options.method;
        let mut body = body;
        let mut current =
            Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        let mut redirects = 0usize;

        loop {
            let mut headers = base_headers.clone();
            if let Some(cookie) = jar.header_value() {
                let value = HeaderValue::from_str(&cookie)
                    .map_err(|_| FetchError::InvalidHeader(format!("cookie: {cookie}")))?;
                headers.insert(COOKIE, value);
            }

            debug!(%method, url = %current, redirects, "sending request");

            let mut request = self
                .client
                .request(method.clone(), current.clone())
                .headers(headers);
            if let Some(payload) = &body {
                request = request.body(payload.clone());
            }

            let response = request
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

            let status = response.status();
            let set_cookies: Vec<String> = response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(String::from)
                .collect();

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);

            if let (true, Some(location)) = (status.is_redirection(), location) {
                if redirects >= max_redirects {
                    return Err(FetchError::TooManyRedirects { max: max_redirects });
                }
                redirects += 1;

                let next = current
                    .join(&location)
                    .map_err(|e| FetchError::InvalidUrl(format!("{location}: {e}")))?;

                for cookie in &set_cookies {
                    jar.store_set_cookie(cookie);
                }

                if status == StatusCode::SEE_OTHER {
                    method = Method::GET;
                    body = None;
                }

                debug!(status = status.as_u16(), from = %current, to = %next, "following redirect");
                current = next;
                continue;
            }

            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .map(|(k, v)| {
                    (
                        k.as_str().to_string(),
                        String::from_utf8_lossy(v.as_bytes()).into_owned(),
                    )
                })
                .collect();

            for cookie in &set_cookies {
                jar.store_set_cookie(cookie);
            }

            let text = response
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

            debug!(
                status = status.as_u16(),
                url = %current,
                bytes = text.len(),
                "response received"
            );

            return Ok(FetchResult {
                status_code: status.as_u16(),
                headers,
                body: text,
                final_url: current.to_string(),
                cookies: jar,
            });
        }
    }

    /// Default `User-Agent` and `Accept`, overridden by caller headers.
    fn merged_headers(&self, extra: &[(String, String)]) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent).map_err(|_| {
                FetchError::InvalidHeader(format!("user-agent: {}", self.user_agent))
            })?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&self.accept)
                .map_err(|_| FetchError::InvalidHeader(format!("accept: {}", self.accept)))?,
        );

        for (name, value) in extra {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| FetchError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| FetchError::InvalidHeader(format!("{name}: {value}")))?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}
