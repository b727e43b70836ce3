//! Command-line interface definitions for Trending News.
//!
//! All options can be given as flags; the config path also falls back to an
//! environment variable.

use clap::Parser;

/// Command-line arguments for the Trending News application.
///
/// # Examples
///
/// ```sh
/// # One round, Markdown report on stdout
/// trending_news
///
/// # Snapshot files every five minutes, with a custom config
/// trending_news -c sites.yaml -j ./json -m ./markdown --interval-secs 300
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, env = "TRENDING_NEWS_CONFIG")]
    pub config: Option<String>,

    /// Newline-delimited stopword list used for word frequencies
    #[arg(short, long, default_value = "list-of-stopwords.txt")]
    pub stopwords: String,

    /// Output directory for JSON snapshots
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for Markdown reports (stdout when no output dir is given)
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// Override the cache TTL from the config file
    #[arg(long)]
    pub ttl_secs: Option<u64>,

    /// Repeat every N seconds instead of running once (at least 1)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: Option<u64>,

    /// Invalidate all cached results before each round
    #[arg(long)]
    pub refresh: bool,

    /// Number of words in each feed's frequency table
    #[arg(long, default_value_t = 20)]
    pub top_words: usize,
}

impl Cli {
    /// True when neither output directory was given.
    pub fn markdown_to_stdout(&self) -> bool {
        self.json_output_dir.is_none() && self.markdown_output_dir.is_none()
    }
}
