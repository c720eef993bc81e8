//! Regex-based extraction of search hits from XenForo result pages.
//!
//! No DOM is built. The page is scanned for `block-row` list items and each
//! item's fields are pulled out by ordered pattern lists, where the first
//! pattern that matches wins. When a page has no `block-row` items at all
//! (older theme, or an unexpected layout) any anchor pointing at a
//! `/threads/` URL is taken as a bare title + URL hit instead.
//!
//! Extraction never fails; unexpected markup yields fewer results.

use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::DEFAULT_BASE_URL;
use crate::html::{strip_html, truncate_chars};
use crate::types::SearchResultItem;

/// Shortest title accepted from a `block-row` item.
const MIN_TITLE_CHARS: usize = 3;

/// Shortest anchor text accepted by the thread-link fallback.
const MIN_FALLBACK_TITLE_CHARS: usize = 5;

/// Snippets are cut to this many characters.
const MAX_SNIPPET_CHARS: usize = 300;

// ── Patterns ─────────────────────────────────────────────────────────────────

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

/// Opening tag of a result item.
static BLOCK_ROW_OPEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)<li[^>]*class="[^"]*block-row[^"]*"[^>]*>"#));

/// Any `<li>` open or close tag; group 1 is `/` for a close tag.
static LI_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)<(/?)li\b[^>]*>"));

static THREAD_LINK: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)<a[^>]*href="([^"]*/threads/[^"]*)"[^>]*>([^<]+)</a>"#));

/// Title + URL, captured as (href, inner HTML).
static TITLE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile(
            r#"(?is)<a[^>]*class="[^"]*contentRow-title[^"]*"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#,
        ),
        compile(
            r#"(?is)<h3[^>]*class="[^"]*contentRow-title[^"]*"[^>]*>.*?<a[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#,
        ),
        compile(r#"(?is)<a[^>]*href="([^"]*/threads/[^"]*)"[^>]*>(.*?)</a>"#),
    ]
});

static SNIPPET_PATTERNS: LazyLock<[Regex; 1]> = LazyLock::new(|| {
    [compile(
        r#"(?is)<div[^>]*class="[^"]*contentRow-snippet[^"]*"[^>]*>(.*?)</div>"#,
    )]
});

static AUTHOR_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile(r#"(?i)<a[^>]*data-user-id="[^"]*"[^>]*>([^<]+)</a>"#),
        compile(r#"(?i)<a[^>]*class="[^"]*username[^"]*"[^>]*>([^<]+)</a>"#),
    ]
});

/// The attribute form is used verbatim; the text form is stripped.
static DATE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)<time[^>]*datetime="([^"]*)"[^>]*>"#));
static DATE_TEXT: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)<time[^>]*>([^<]*)</time>"));

static FORUM_PATTERNS: LazyLock<[Regex; 1]> = LazyLock::new(|| {
    [compile(
        r#"(?i)<a[^>]*href="[^"]*/forums/[^"]*"[^>]*>([^<]+)</a>"#,
    )]
});

/// Inner HTML of each `block-row` item, in document order.
///
/// Items end at their matching `</li>`, so the nested `<li>` elements
/// XenForo uses for the author/date/forum line stay inside the item. When
/// the nesting never balances (HTML5 allows omitting `</li>`), the item ends
/// at the first `</li>` after its opening tag and scanning resumes there.
fn block_rows(html: &str) -> impl Iterator<Item = &str> + '_ {
    let mut pos = 0usize;
    std::iter::from_fn(move || {
        let open = BLOCK_ROW_OPEN.find_at(html, pos)?;
        let start = open.end();
        let mut depth = 1usize;
        let mut first_close = None;
        let mut matching_close = None;
        for tag in LI_TAG.captures_iter(&html[start..]) {
            let whole = tag.get(0)?;
            let is_close = tag.get(1).is_some_and(|m| !m.as_str().is_empty());
            if is_close {
                first_close.get_or_insert(whole.range());
                depth -= 1;
                if depth == 0 {
                    matching_close = Some(whole.range());
                    break;
                }
            } else {
                depth += 1;
            }
        }
        let close = matching_close.or(first_close)?;
        pos = start + close.end;
        Some(&html[start..start + close.start])
    })
}

/// Run patterns in order and return the first match.
fn first_match<'h>(patterns: &[Regex], html: &'h str) -> Option<Captures<'h>> {
    patterns.iter().find_map(|re| re.captures(html))
}

/// First match of `patterns`, capture group 1, stripped.
fn first_text(patterns: &[Regex], html: &str) -> Option<String> {
    first_match(patterns, html)
        .and_then(|caps| caps.get(1))
        .map(|m| strip_html(m.as_str()))
}

// ── Extractor ────────────────────────────────────────────────────────────────

/// Turns search result HTML into [`SearchResultItem`]s, resolving relative
/// links against a forum base URL.
#[derive(Debug, Clone)]
pub struct Extractor {
    base_url: String,
    /// `scheme://host[:port]` of the base URL.
    origin: Option<String>,
    /// Path of the base URL without a trailing slash, e.g. `/android/forum`.
    base_path: String,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Extractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let (origin, base_path) = match url::Url::parse(&base_url) {
            Ok(parsed) => (
                Some(parsed.origin().ascii_serialization()),
                parsed.path().trim_end_matches('/').to_string(),
            ),
            Err(_) => (None, String::new()),
        };
        Self {
            base_url,
            origin,
            base_path,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Extract at most `limit` hits, in document order.
    ///
    /// `block-row` items are tried first; the thread-link scan only runs if
    /// that produced nothing.
    pub fn parse_search_results(&self, html: &str, limit: usize) -> Vec<SearchResultItem> {
        let mut results = Vec::new();
        if limit == 0 {
            return results;
        }

        let mut blocks = 0usize;
        for item_html in block_rows(html) {
            if results.len() >= limit {
                break;
            }
            blocks += 1;
            if let Some(item) = self.extract_result_from_item(item_html) {
                results.push(item);
            }
        }

        if !results.is_empty() {
            debug!(blocks, results = results.len(), "extracted block-row results");
            return results;
        }

        debug!(blocks, "no block-row results, scanning thread links");
        self.thread_link_results(html, limit)
    }

    /// Pull one hit out of a single `block-row` item's inner HTML.
    ///
    /// Returns `None` when no title is found or the title is shorter than
    /// three characters.
    pub fn extract_result_from_item(&self, item_html: &str) -> Option<SearchResultItem> {
        // Title and URL: class-tagged anchor > heading-wrapped anchor > any thread link
        let caps = first_match(TITLE_PATTERNS.as_slice(), item_html)?;
        let href = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let title = caps
            .get(2)
            .map(|m| strip_html(m.as_str()))
            .unwrap_or_default();

        if title.chars().count() < MIN_TITLE_CHARS {
            return None;
        }

        let snippet = first_text(SNIPPET_PATTERNS.as_slice(), item_html)
            .map(|s| truncate_chars(&s, MAX_SNIPPET_CHARS))
            .unwrap_or_default();

        let author = first_text(AUTHOR_PATTERNS.as_slice(), item_html).unwrap_or_default();

        let date = DATE_ATTR
            .captures(item_html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .or_else(|| {
                DATE_TEXT
                    .captures(item_html)
                    .and_then(|caps| caps.get(1))
                    .map(|m| strip_html(m.as_str()))
            })
            .unwrap_or_default();

        let forum = first_text(FORUM_PATTERNS.as_slice(), item_html);

        Some(SearchResultItem {
            title,
            url: self.absolute_url(href),
            snippet,
            author,
            date,
            forum,
        })
    }

    /// Fallback scan: every distinct `/threads/` anchor with enough text.
    fn thread_link_results(&self, html: &str, limit: usize) -> Vec<SearchResultItem> {
        let mut results = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for caps in THREAD_LINK.captures_iter(html) {
            if results.len() >= limit {
                break;
            }
            let (Some(href), Some(text)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let href = href.as_str();
            let title = strip_html(text.as_str());

            if seen.contains(href) || title.chars().count() < MIN_FALLBACK_TITLE_CHARS {
                continue;
            }
            seen.insert(href);

            results.push(SearchResultItem {
                title,
                url: self.absolute_url(href),
                snippet: String::new(),
                author: String::new(),
                date: String::new(),
                forum: None,
            });
        }

        debug!(results = results.len(), "extracted thread-link results");
        results
    }

    /// Site-root hrefs that already carry the forum path (`/android/forum/...`)
    /// only get the origin; anything else relative is appended to the base.
    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http") {
            return href.to_string();
        }
        if let Some(origin) = &self.origin {
            if !self.base_path.is_empty()
                && href
                    .strip_prefix(self.base_path.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            {
                return format!("{origin}{href}");
            }
        }
        format!("{}{}", self.base_url, href)
    }
}

/// Extract hits using the default forum base URL.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SearchResultItem> {
    Extractor::default().parse_search_results(html, limit)
}

/// Extract one `block-row` item using the default forum base URL.
pub fn extract_result_from_item(item_html: &str) -> Option<SearchResultItem> {
    Extractor::default().extract_result_from_item(item_html)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.b4x.com/android/forum";

    fn block_row(inner: &str) -> String {
        format!(r#"<li class="block-row block-row--separated" data-author="x">{inner}</li>"#)
    }

    #[test]
    fn test_sample_thread() {
        let html = block_row(
            r#"<div class="contentRow">
                <a class="contentRow-title" href="/threads/sample.123/">Sample Thread</a>
                <div class="contentRow-snippet">Example answer text</div>
                <a href="/members/erel.1/" data-user-id="5">Erel</a>
                <time class="u-dt" datetime="2024-01-01">Jan 1, 2024</time>
            </div>"#,
        );
        let results = parse_search_results(&html, 10);
        assert_eq!(
            results,
            vec![SearchResultItem {
                title: "Sample Thread".into(),
                url: format!("{BASE}/threads/sample.123/"),
                snippet: "Example answer text".into(),
                author: "Erel".into(),
                date: "2024-01-01".into(),
                forum: None,
            }]
        );
    }

    #[test]
    fn test_empty_html() {
        assert!(parse_search_results("", 10).is_empty());
        let html = "<html><body><p>No results.</p></body></html>";
        assert!(parse_search_results(html, 10).is_empty());
    }

    #[test]
    fn test_zero_limit() {
        let html = block_row(r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a>"#);
        assert!(parse_search_results(&html, 0).is_empty());
    }

    #[test]
    fn test_limit_respected() {
        let html: String = (0..8)
            .map(|i| {
                block_row(&format!(
                    r#"<a class="contentRow-title" href="/threads/t.{i}/">Thread {i}</a>"#
                ))
            })
            .collect();
        let results = parse_search_results(&html, 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[2].title, "Thread 2");
    }

    #[test]
    fn test_short_title_rejected() {
        let html = format!(
            "{}{}",
            block_row(r#"<a class="contentRow-title" href="/threads/x.1/"><b>Hi</b></a>"#),
            block_row(r#"<a class="contentRow-title" href="/threads/y.2/">Fine title</a>"#),
        );
        let results = parse_search_results(&html, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Fine title");
    }

    #[test]
    fn test_heading_wrapped_title() {
        let html = block_row(
            r#"<h3 class="contentRow-title">
                <a href="/threads/b4xpages-tutorial.118955/"><em class="textHighlight">B4XPages</em> tutorial</a>
            </h3>"#,
        );
        let item = extract_result_from_item(&html).unwrap();
        assert_eq!(item.title, "B4XPages tutorial");
        assert_eq!(item.url, format!("{BASE}/threads/b4xpages-tutorial.118955/"));
    }

    #[test]
    fn test_generic_thread_link_title() {
        let html = r#"<span><a href="/threads/xui-views.100/">XUI Views</a></span>"#;
        let item = extract_result_from_item(html).unwrap();
        assert_eq!(item.title, "XUI Views");
    }

    #[test]
    fn test_absolute_href_kept() {
        let item = extract_result_from_item(
            r#"<a class="contentRow-title" href="https://www.b4x.com/android/forum/threads/z.9/">Zed thread</a>"#,
        )
        .unwrap();
        assert_eq!(item.url, "https://www.b4x.com/android/forum/threads/z.9/");
    }

    #[test]
    fn test_no_title_is_none() {
        let html = r#"<div class="contentRow-snippet">text</div>"#;
        assert!(extract_result_from_item(html).is_none());
    }

    #[test]
    fn test_snippet_truncated() {
        let long = "word ".repeat(100);
        let html = format!(
            r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a><div class="contentRow-snippet">{long}</div>"#
        );
        let item = extract_result_from_item(&html).unwrap();
        assert_eq!(item.snippet.chars().count(), 300);
    }

    #[test]
    fn test_author_username_fallback() {
        let html = r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a>
            <a href="/members/klaus.2/" class="username">klaus</a>"#;
        assert_eq!(extract_result_from_item(html).unwrap().author, "klaus");
    }

    #[test]
    fn test_date_text_fallback() {
        let html = r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a>
            <time class="u-dt"> Yesterday at 10:15 </time>"#;
        assert_eq!(extract_result_from_item(html).unwrap().date, "Yesterday at 10:15");
    }

    #[test]
    fn test_missing_optional_fields() {
        let html = r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a>"#;
        let item = extract_result_from_item(html).unwrap();
        assert_eq!(item.snippet, "");
        assert_eq!(item.author, "");
        assert_eq!(item.date, "");
        assert_eq!(item.forum, None);
    }

    #[test]
    fn test_forum_category() {
        let html = r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a>
            <a href="/android/forum/forums/b4a-questions.26/">Android Questions</a>"#;
        assert_eq!(
            extract_result_from_item(html).unwrap().forum.as_deref(),
            Some("Android Questions")
        );
    }

    #[test]
    fn test_fallback_dedupes_by_href() {
        let html = r#"
            <a href="/threads/first.1/">First thread title</a>
            <a href="/threads/first.1/">Duplicate title text</a>
            <a href="/threads/second.2/">Second thread title</a>
        "#;
        let results = parse_search_results(html, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "First thread title");
        assert_eq!(results[1].title, "Second thread title");
        assert_eq!(results[0].snippet, "");
        assert_eq!(results[0].forum, None);
    }

    #[test]
    fn test_fallback_short_text_does_not_claim_href() {
        let html = r#"
            <a href="/threads/first.1/">1</a>
            <a href="/threads/first.1/">First thread title</a>
        "#;
        let results = parse_search_results(html, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "First thread title");
    }

    #[test]
    fn test_fallback_limit() {
        let html: String = (0..6)
            .map(|i| format!(r#"<a href="/threads/t.{i}/">Thread number {i}</a>"#))
            .collect();
        assert_eq!(parse_search_results(&html, 4).len(), 4);
    }

    #[test]
    fn test_fallback_skipped_when_blocks_match() {
        let html = format!(
            r#"{}<a href="/threads/other.5/">Sidebar thread</a>"#,
            block_row(r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a>"#)
        );
        let results = parse_search_results(&html, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Alpha");
    }

    #[test]
    fn test_fallback_runs_when_blocks_all_rejected() {
        let html = format!(
            r#"{}<a href="/threads/other.5/">Sidebar thread</a>"#,
            block_row(r#"<span>no link here</span>"#)
        );
        let results = parse_search_results(&html, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Sidebar thread");
    }

    #[test]
    fn test_custom_base_url() {
        let extractor = Extractor::new("http://127.0.0.1:9000/forum/");
        let item = extractor
            .extract_result_from_item(r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a>"#)
            .unwrap();
        assert_eq!(item.url, "http://127.0.0.1:9000/forum/threads/a.1/");
    }

    #[test]
    fn test_site_root_href_not_doubled() {
        let item = extract_result_from_item(
            r#"<a class="contentRow-title" href="/android/forum/threads/a.1/">Alpha</a>"#,
        )
        .unwrap();
        assert_eq!(item.url, "https://www.b4x.com/android/forum/threads/a.1/");

        // a path that merely starts with the same characters is still appended
        let item = extract_result_from_item(
            r#"<a class="contentRow-title" href="/android/forumx/threads/a.1/">Alpha</a>"#,
        )
        .unwrap();
        assert_eq!(item.url, "https://www.b4x.com/android/forum/android/forumx/threads/a.1/");
    }

    #[test]
    fn test_nested_list_items_stay_in_block() {
        let html = block_row(
            r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a>
            <ul class="listInline">
                <li><a class="username" href="/members/b.2/">bob</a></li>
                <li><time datetime="2023-05-06T07:08:09+0000">May 6, 2023</time></li>
                <li><a href="/forums/b4j-questions.3/">B4J Questions</a></li>
            </ul>"#,
        );
        let results = parse_search_results(&format!("{html}{html}"), 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].author, "bob");
        assert_eq!(results[0].date, "2023-05-06T07:08:09+0000");
        assert_eq!(results[0].forum.as_deref(), Some("B4J Questions"));
    }

    #[test]
    fn test_block_without_close_tag_ignored() {
        let html =
            r#"<li class="block-row"><a class="contentRow-title" href="/threads/a.1/">Alpha</a>"#;
        assert!(block_rows(html).next().is_none());
    }

    #[test]
    fn test_unclosed_inner_items_end_at_first_close() {
        let row = |title: &str, slug: &str| {
            format!(
                r#"<li class="block-row">
                <h3 class="contentRow-title"><a href="/threads/{slug}/">{title}</a></h3>
                <ul class="listInline">
                    <li><a class="username" href="/members/bob.2/">bob</a>
                    <li><time datetime="2024-01-01">Jan 1, 2024</time>
                </ul></li>"#
            )
        };
        let html = format!("{}{}", row("Alpha one", "alpha.1"), row("Bravo two", "bravo.2"));

        let results = parse_search_results(&html, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Alpha one");
        assert_eq!(results[1].title, "Bravo two");
        for item in &results {
            assert_eq!(item.author, "bob");
            assert_eq!(item.date, "2024-01-01");
        }
    }

    #[test]
    fn test_unclosed_block_does_not_end_scan() {
        let html = r#"<li class="block-row"><a class="contentRow-title" href="/threads/alpha.1/">Alpha one</a>
            <div class="contentRow-snippet">snip</div>
            <li class="block-row"><a class="contentRow-title" href="/threads/bravo.2/">Bravo two</a>
            <a class="username" href="/members/carol.3/">carol</a></li>
            <li class="block-row"><a class="contentRow-title" href="/threads/charlie.3/">Charlie three</a></li>"#;

        let results = parse_search_results(html, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Alpha one");
        assert_eq!(results[0].snippet, "snip");
        assert_eq!(results[0].author, "carol");
        assert_eq!(results[1].title, "Charlie three");
        assert_eq!(results[1].author, "");
    }

    #[test]
    fn test_link_tag_is_not_list_item() {
        let html = block_row(
            r#"<link rel="stylesheet" href="x.css"><a class="contentRow-title" href="/threads/a.1/">Alpha</a>"#,
        );
        let blocks: Vec<&str> = block_rows(&html).collect();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let html = format!(
            "{}{}",
            block_row(r#"<a class="contentRow-title" href="/threads/a.1/">Alpha</a>"#),
            block_row(r#"<a class="contentRow-title" href="/threads/b.2/">Bravo</a>"#),
        );
        assert_eq!(parse_search_results(&html, 10), parse_search_results(&html, 10));
    }
}
