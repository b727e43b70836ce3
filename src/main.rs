//! # Trending News
//!
//! Pulls the "trending" and "most popular" headline lists from Indonesian
//! news portals, normalizes them into typed records, and reports them as
//! JSON snapshots and Markdown.
//!
//! ## Features
//!
//! - Tempo.co trending articles and trending topics
//! - Kompas.com most popular articles with their channel
//! - Declarative, configurable extraction rules per feed
//! - Per-feed result cache with a TTL, so repeated rounds stay polite
//! - Word frequencies and category distributions per feed
//!
//! ## Usage
//!
//! ```sh
//! trending_news -j ./json -m ./markdown --interval-secs 300
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: one GET per feed page, no retries
//! 2. **Extraction**: anchor → container → items → fields
//! 3. **Normalization**: absolute links, cleaned titles and topics
//! 4. **Caching**: results memoized per (site, feed) for the TTL
//! 5. **Output**: dashboard summaries written as JSON and Markdown

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cache;
mod cli;
mod config;
mod error;
mod fetcher;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod report;
mod scrapers;
mod utils;

use cli::Cli;
use config::Config;
use fetcher::HttpFetcher;
use outputs::{json, markdown};
use pipeline::TrendingService;
use report::{load_stopwords, Dashboard, FeedStatus};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("trending_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Config ----
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(ttl) = args.ttl_secs {
        info!(ttl_secs = ttl, "Overriding cache TTL from the command line");
        config.cache_ttl_secs = ttl;
    }

    // Early check: output dirs must be writable
    for dir in [&args.json_output_dir, &args.markdown_output_dir]
        .into_iter()
        .flatten()
    {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let stopwords = load_stopwords(&args.stopwords);
    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout())?;
    let service = TrendingService::new(&config, fetcher)?;
    info!(feeds = service.feeds().count(), "Trending service ready");

    loop {
        let start_time = std::time::Instant::now();
        if args.refresh {
            service.invalidate_all();
        }

        let results = service.fetch_all().await;
        let dashboard = Dashboard::build(results, &stopwords, args.top_words, Utc::now());

        if let Some(dir) = &args.json_output_dir {
            if let Err(e) = json::write_dashboard(&dashboard, dir).await {
                error!(error = %e, "Failed to write JSON snapshot");
            }
        }
        if let Some(dir) = &args.markdown_output_dir {
            if let Err(e) = markdown::write_markdown(&dashboard, dir).await {
                error!(error = %e, "Failed to write Markdown report");
            }
        }
        if args.markdown_to_stdout() {
            println!("{}", markdown::dashboard_to_markdown(&dashboard));
        }

        let count = |status| {
            dashboard
                .feeds
                .iter()
                .filter(|f| f.summary.status == status)
                .count()
        };
        let elapsed = start_time.elapsed();
        info!(
            ok = count(FeedStatus::Ok),
            empty = count(FeedStatus::Empty),
            failed = count(FeedStatus::Failed),
            cached = service.cached_feeds(),
            millis = elapsed.as_millis() as u64,
            "Round complete"
        );

        let Some(interval) = args.interval_secs else {
            break;
        };
        debug!(interval_secs = interval, "Sleeping until next round");
        tokio::time::sleep(Duration::from_secs(interval)).await;
    }

    info!("Execution complete");
    Ok(())
}
