//! Record normalization.
//!
//! Turns harvested [`RawRecord`]s into typed [`NormalizedItem`]s:
//! - trims every text field
//! - removes promotional badges from titles, then trims again
//! - strips one leading `#` from topics
//! - resolves root-relative links against the site origin
//! - drops a record only when both its text and its link are empty
//!
//! Duplicates are kept in document order.

use crate::models::{
    fields, FeedKind, NormalizedItem, PopularNewsItem, RawRecord, TopicItem, TrendingItem,
};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct Normalizer {
    base_origin: String,
    promo_markers: Vec<String>,
}

impl Normalizer {
    /// `base_url` is reduced to its origin, so a configured path never leaks
    /// into resolved links.
    pub fn new(base_url: &str, promo_markers: Vec<String>) -> Self {
        Self {
            base_origin: site_origin(base_url).unwrap_or_else(|| base_url.to_string()),
            promo_markers,
        }
    }

    /// Normalize one record of a feed of the given kind.
    ///
    /// Returns `None` when the mandatory text field and the link are both empty.
    pub fn normalize(&self, raw: &RawRecord, kind: FeedKind) -> Option<NormalizedItem> {
        let link = raw
            .get(fields::LINK)
            .map(|link| resolve_link(link.trim(), &self.base_origin))
            .unwrap_or_default();

        let text = raw.get(kind.text_field()).map(|text| match kind {
            FeedKind::TrendingTopics => strip_hash(text),
            FeedKind::TrendingArticles | FeedKind::PopularArticles => {
                strip_markers(text, &self.promo_markers)
            }
        });
        if text.as_deref() == Some("") {
            debug!(field = kind.text_field(), "Field empty after cleaning");
        }
        let text = text.filter(|t| !t.is_empty());

        if text.is_none() && link.is_empty() {
            debug!(?raw, "Record has no text and no link; dropping");
            return None;
        }

        Some(match kind {
            FeedKind::TrendingArticles => NormalizedItem::Trending(TrendingItem { title: text, link }),
            FeedKind::TrendingTopics => NormalizedItem::Topic(TopicItem { topic: text, link }),
            FeedKind::PopularArticles => NormalizedItem::Popular(PopularNewsItem {
                title: text,
                category: raw
                    .get(fields::CATEGORY)
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
                link,
            }),
        })
    }
}

/// The `scheme://host[:port]` origin of an absolute http(s) URL.
///
/// Returns `None` for anything that cannot serve as a link base: relative
/// or unparsable input, other schemes, or a missing host.
pub fn site_origin(base_url: &str) -> Option<String> {
    let url = Url::parse(base_url.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(url.origin().ascii_serialization())
}

/// Prefix a root-relative `link` with `base_origin`; anything else passes through.
///
/// Protocol-relative links (`//host/path`) take the origin's scheme.
pub fn resolve_link(link: &str, base_origin: &str) -> String {
    if let Some(rest) = link.strip_prefix("//") {
        let scheme = Url::parse(base_origin)
            .map(|u| u.scheme().to_string())
            .unwrap_or_else(|_| "https".to_string());
        format!("{scheme}://{rest}")
    } else if link.starts_with('/') {
        format!("{}{}", base_origin.trim_end_matches('/'), link)
    } else {
        link.to_string()
    }
}

/// Remove every occurrence of each marker (case-sensitive), then trim.
pub fn strip_markers(title: &str, markers: &[String]) -> String {
    let mut title = title.trim().to_string();
    // Removal can splice a new occurrence of any marker together, e.g.
    // "TempoTempo Plus Plus", so repeat until a full pass finds nothing.
    while let Some(marker) = markers
        .iter()
        .find(|m| !m.is_empty() && title.contains(m.as_str()))
    {
        title = title.replace(marker.as_str(), "");
    }
    title.trim().to_string()
}

/// Trim, drop exactly one leading `#`, trim again.
pub fn strip_hash(topic: &str) -> String {
    let topic = topic.trim();
    topic.strip_prefix('#').unwrap_or(topic).trim().to_string()
}
