//! Aggregation of feed results into dashboard-ready data.
//!
//! Everything here is plain data: counts, category distributions, word
//! frequencies and the joined text a word-cloud renderer would consume.
//! Rendering is left to [`crate::outputs`].

use crate::models::{FeedResult, NormalizedItem, NOT_AVAILABLE};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['-][\p{L}\p{N}]+)*").expect("word pattern is valid")
});

/// Load a newline-delimited stopword list.
///
/// Entries are trimmed and lowercased; blank lines are ignored. A missing or
/// unreadable file yields an empty set and a warning, so word frequencies are
/// computed unfiltered.
#[instrument(level = "info")]
pub fn load_stopwords(path: &str) -> HashSet<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let words: HashSet<String> = text
                .lines()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_lowercase)
                .collect();
            info!(count = words.len(), "Loaded stopwords");
            words
        }
        Err(e) => {
            warn!(error = %e, "Stopword file not available; word frequencies will be unfiltered");
            HashSet::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Ok,
    /// The site answered but no items were found.
    Empty,
    /// Retrieval failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSummary {
    pub site_id: String,
    pub feed_id: String,
    pub status: FeedStatus,
    pub item_count: usize,
    /// Category distribution, most frequent first. Empty for feeds without categories.
    pub categories: Vec<Count>,
    /// Word frequencies over titles/topics, most frequent first.
    pub top_words: Vec<Count>,
    /// Titles/topics joined by spaces, `#` removed and stopwords filtered.
    pub word_blob: String,
}

/// A token counts as a word when it has at least two characters and is not
/// a bare number.
fn is_word(token: &str) -> bool {
    token.chars().nth(1).is_some() && !token.chars().all(char::is_numeric)
}

/// Words of `text` in order, lowercased, `#` removed, stopwords dropped.
pub fn words<'a>(text: &'a str, stopwords: &'a HashSet<String>) -> impl Iterator<Item = String> + 'a {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(move |w| is_word(w) && !stopwords.contains(w))
}

fn ranked<I: IntoIterator<Item = String>>(values: I) -> Vec<Count> {
    values
        .into_iter()
        .counts()
        .into_iter()
        .sorted_by(|(a, ca), (b, cb)| cb.cmp(ca).then_with(|| a.cmp(b)))
        .map(|(value, count)| Count { value, count })
        .collect()
}

impl FeedSummary {
    pub fn from_result(result: &FeedResult, stopwords: &HashSet<String>, top_n: usize) -> Self {
        let status = if result.stale {
            FeedStatus::Failed
        } else if result.is_empty() {
            FeedStatus::Empty
        } else {
            FeedStatus::Ok
        };

        let has_categories = result
            .items
            .iter()
            .any(|item| matches!(item, NormalizedItem::Popular(_)));
        let categories = if has_categories {
            ranked(
                result
                    .items
                    .iter()
                    .map(|item| item.category().unwrap_or(NOT_AVAILABLE).to_string()),
            )
        } else {
            Vec::new()
        };

        let texts = result.items.iter().filter_map(|item| item.text()).join(" ");
        let word_list: Vec<String> = words(&texts, stopwords).collect();

        Self {
            site_id: result.site_id.clone(),
            feed_id: result.feed_id.clone(),
            status,
            item_count: result.items.len(),
            categories,
            top_words: ranked(word_list.iter().cloned()).into_iter().take(top_n).collect(),
            word_blob: word_list.join(" "),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedReport {
    pub result: Arc<FeedResult>,
    pub summary: FeedSummary,
}

/// One refresh cycle's worth of feeds, ready for output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub feeds: Vec<FeedReport>,
}

impl Dashboard {
    pub fn build(
        results: Vec<Arc<FeedResult>>,
        stopwords: &HashSet<String>,
        top_n: usize,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let feeds = results
            .into_iter()
            .map(|result| FeedReport {
                summary: FeedSummary::from_result(&result, stopwords, top_n),
                result,
            })
            .collect();
        Self {
            generated_at,
            feeds,
        }
    }
}
