//! Data models for extracted feed items and feed results.
//!
//! This module defines the records that flow through the pipeline:
//! - [`RawDocument`]: A fetched HTML page
//! - [`RawRecord`]: Untyped field mapping harvested from one repeated node
//! - [`TrendingItem`], [`TopicItem`], [`PopularNewsItem`]: Normalized records
//! - [`FeedResult`]: The ordered items of one (site, feed) pair plus diagnostics
//!
//! Text fields that could not be extracted are `None` in memory and only
//! become the [`NOT_AVAILABLE`] marker when serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder written for a text field that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Well-known raw field names.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const TOPIC: &str = "topic";
    pub const LINK: &str = "link";
    pub const CATEGORY: &str = "category";
}

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// The response body.
    pub body: String,
    /// The URL the body was fetched from.
    pub source_url: String,
}

/// Field name → raw string, as harvested and before normalization.
///
/// A field that is absent was not located in the document; a field that
/// is present but empty was located and held no text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord(BTreeMap<String, String>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The shape of records a feed produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    TrendingArticles,
    TrendingTopics,
    PopularArticles,
}

impl FeedKind {
    /// The mandatory text field for this kind of feed.
    pub fn text_field(self) -> &'static str {
        match self {
            FeedKind::TrendingTopics => fields::TOPIC,
            FeedKind::TrendingArticles | FeedKind::PopularArticles => fields::TITLE,
        }
    }
}

fn or_not_available<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(value.as_deref().unwrap_or(NOT_AVAILABLE))
}

/// An entry of a trending-articles feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendingItem {
    #[serde(serialize_with = "or_not_available")]
    pub title: Option<String>,
    /// Absolute URL, or empty when the site published no link.
    pub link: String,
}

/// An entry of a trending-topics feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicItem {
    #[serde(serialize_with = "or_not_available")]
    pub topic: Option<String>,
    pub link: String,
}

/// An entry of a category-bearing most-popular feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularNewsItem {
    #[serde(serialize_with = "or_not_available")]
    pub title: Option<String>,
    #[serde(serialize_with = "or_not_available")]
    pub category: Option<String>,
    pub link: String,
}

/// A normalized record of any feed kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NormalizedItem {
    Trending(TrendingItem),
    Topic(TopicItem),
    Popular(PopularNewsItem),
}

impl NormalizedItem {
    /// Title or topic text, if it was extracted.
    pub fn text(&self) -> Option<&str> {
        match self {
            NormalizedItem::Trending(item) => item.title.as_deref(),
            NormalizedItem::Topic(item) => item.topic.as_deref(),
            NormalizedItem::Popular(item) => item.title.as_deref(),
        }
    }

    pub fn link(&self) -> &str {
        match self {
            NormalizedItem::Trending(item) => &item.link,
            NormalizedItem::Topic(item) => &item.link,
            NormalizedItem::Popular(item) => &item.link,
        }
    }

    /// Category text; only popular-news items carry one.
    pub fn category(&self) -> Option<&str> {
        match self {
            NormalizedItem::Popular(item) => item.category.as_deref(),
            _ => None,
        }
    }

    /// Fields of this item that render as [`NOT_AVAILABLE`] or an empty link.
    pub fn missing_fields(&self) -> usize {
        let category_missing = matches!(self, NormalizedItem::Popular(item) if item.category.is_none());
        [self.text().is_none(), self.link().is_empty(), category_missing]
            .into_iter()
            .filter(|missing| *missing)
            .count()
    }
}

/// Where structural extraction stopped short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionGap {
    AnchorNotFound,
    ContainerNotFound,
}

impl fmt::Display for ExtractionGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionGap::AnchorNotFound => f.write_str("anchor not found"),
            ExtractionGap::ContainerNotFound => f.write_str("container not found"),
        }
    }
}

/// Soft failures observed while producing a feed result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDiagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<ExtractionGap>,
    /// Fields replaced by the "not available" marker.
    pub fields_missing: usize,
    /// Items discarded because both text and link were unrecoverable.
    pub records_dropped: usize,
}

/// Cache key: one (site, feed) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub site: String,
    pub feed: String,
}

impl FeedKey {
    pub fn new(site: impl Into<String>, feed: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            feed: feed.into(),
        }
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.site, self.feed)
    }
}

/// The outcome of one fetch → extract → normalize cycle for a (site, feed) pair.
///
/// Items keep document order. A result is never mutated after it is built;
/// the cache replaces it wholesale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResult {
    pub site_id: String,
    pub feed_id: String,
    pub items: Vec<NormalizedItem>,
    pub fetched_at: DateTime<Utc>,
    /// Set when the last attempt failed and `items` holds nothing usable.
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub diagnostics: FeedDiagnostics,
}

impl FeedResult {
    /// An empty result for a failed retrieval.
    pub fn failed(key: &FeedKey, at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            site_id: key.site.clone(),
            feed_id: key.feed.clone(),
            items: Vec::new(),
            fetched_at: at,
            stale: true,
            error: Some(error.into()),
            diagnostics: FeedDiagnostics::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
