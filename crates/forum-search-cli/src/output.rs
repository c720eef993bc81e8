//! Human-readable rendering of a search response.

use std::fmt::Write;

use forum_search::html::truncate_chars;
use forum_search::{SearchConfig, SearchResponse};

const PREVIEW_CHARS: usize = 150;

/// Render the text-mode report. `config` supplies the Google suggestion
/// shown when a successful search finds nothing.
pub fn render_text(response: &SearchResponse, config: &SearchConfig) -> String {
    let mut out = String::new();

    match response {
        SearchResponse::Failure {
            error,
            google_fallback,
            ..
        } => {
            let _ = writeln!(out, "\nError: {error}");
            if !google_fallback.is_empty() {
                let _ = writeln!(out, "\nGoogle fallback: {google_fallback}");
            }
        }
        SearchResponse::Success { query, results } => {
            let _ = writeln!(out, "\n=== B4X Forum Search: '{query}' ===");
            let _ = writeln!(out, "Found {} results\n", results.len());

            for (i, r) in results.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", i + 1, r.title);
                let _ = writeln!(out, "   URL: {}", r.url);
                if !r.author.is_empty() {
                    if r.date.is_empty() {
                        let _ = writeln!(out, "   Author: {}", r.author);
                    } else {
                        let _ = writeln!(out, "   Author: {} | Date: {}", r.author, r.date);
                    }
                }
                if let Some(forum) = r.forum.as_deref().filter(|f| !f.is_empty()) {
                    let _ = writeln!(out, "   Forum: {forum}");
                }
                if !r.snippet.is_empty() {
                    let _ = writeln!(
                        out,
                        "   Preview: {}...",
                        truncate_chars(&r.snippet, PREVIEW_CHARS)
                    );
                }
                out.push('\n');
            }

            if results.is_empty() {
                let _ = writeln!(
                    out,
                    "No results found. Try Google:\n{}",
                    config.google_fallback(query)
                );
            }
        }
    }

    out
}
