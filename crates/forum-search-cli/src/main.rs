//! B4X forum search command-line entry point.

use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use forum_search::{ForumSearcher, SearchConfig};

mod output;

/// Used for `--limit` when the value is missing, unparseable or not positive.
const DEFAULT_LIMIT: usize = 10;

#[derive(Parser, Debug)]
#[command(
    name = "b4x-search",
    about = "Search the B4X community forums and print parsed results",
    version,
    after_help = "Examples:\n  b4x-search \"CustomListView tutorial\"\n  b4x-search \"httpjob example\" --limit 5\n  b4x-search \"SQL database\" --json"
)]
struct Cli {
    /// Search query
    query: Option<String>,

    /// Maximum results
    #[arg(
        short,
        long,
        value_name = "N",
        default_value_t = DEFAULT_LIMIT,
        value_parser = parse_limit,
        allow_hyphen_values = true
    )]
    limit: usize,

    /// Output raw JSON
    #[arg(short, long)]
    json: bool,

    /// Forum base URL. Also reads B4X_FORUM_URL.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Request timeout in seconds. Also reads B4X_SEARCH_TIMEOUT_SECS.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    /// The query to run; only an absent or empty argument counts as missing.
    fn query(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }

    /// Flags > environment > defaults.
    fn config(&self) -> SearchConfig {
        let mut config = SearchConfig::from_env();
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.as_str());
        }
        if let Some(secs) = self.timeout.filter(|s| *s > 0) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// Lenient `--limit` parsing: leading digits (after an optional `+`) are
/// used, anything else falls back to the default.
fn parse_limit(raw: &str) -> Result<usize, std::convert::Infallible> {
    let raw = raw.trim_start();
    let digits: String = raw
        .strip_prefix('+')
        .unwrap_or(raw)
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    Ok(digits
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LIMIT))
}

#[tokio::main]
async fn main() -> Result<()> {
    // No arguments at all: show usage, like --help
    if std::env::args_os().len() <= 1 {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(query) = cli.query() else {
        eprintln!("Error: No search query provided");
        std::process::exit(1);
    };

    let config = cli.config();
    tracing::debug!(base_url = %config.base_url, limit = cli.limit, "starting search");

    let searcher = ForumSearcher::new(config)?;
    let response = searcher.search(query, cli.limit).await;

    if cli.json {
        // The failure object carries its own error field; exit status stays 0
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    print!("{}", output::render_text(&response, searcher.config()));
    if !response.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
