//! Tempo.co homepage feeds.
//!
//! Both feeds live on the [Tempo](https://www.tempo.co) homepage:
//!
//! - **Artikel Trending**: a `<span>ARTIKEL TRENDING</span>` label inside a
//!   `div.flex-col` column of `<figure>` cards. The first figure in that
//!   column is the pinned lead card, not a trending entry, and is skipped.
//! - **Topik Trending**: a `<div>` labelled `TOPIK TRENDING` followed by a
//!   `<ul>` of hashtag links.
//!
//! Paywalled titles carry a "Tempo Plus" badge inside the link text; it is
//! stripped during normalization.

use crate::config::{FeedConfig, SiteConfig};
use crate::models::{fields, FeedKind};
use crate::scrapers::rule::{
    AnchorRule, ExtractionRule, FieldRule, HarvestRule, Navigation, TextMatch,
};

pub const SITE_ID: &str = "tempo";
pub const BASE_URL: &str = "https://www.tempo.co";
pub const TRENDING_ARTICLES: &str = "trending-articles";
pub const TRENDING_TOPICS: &str = "trending-topics";

/// Badge appended to paywalled headlines.
pub const PROMO_MARKER: &str = "Tempo Plus";

pub fn site() -> SiteConfig {
    SiteConfig {
        id: SITE_ID.to_string(),
        base_url: BASE_URL.to_string(),
        feeds: vec![
            FeedConfig {
                id: TRENDING_ARTICLES.to_string(),
                kind: FeedKind::TrendingArticles,
                url: None,
                rule: trending_articles_rule(),
            },
            FeedConfig {
                id: TRENDING_TOPICS.to_string(),
                kind: FeedKind::TrendingTopics,
                url: None,
                rule: trending_topics_rule(),
            },
        ],
    }
}

pub fn trending_articles_rule() -> ExtractionRule {
    ExtractionRule {
        anchor: AnchorRule {
            tag: "span".to_string(),
            text: "ARTIKEL TRENDING".to_string(),
            text_match: TextMatch::Exact,
        },
        navigate: Navigation::Ancestor {
            tag: "div".to_string(),
            class: Some("flex-col".to_string()),
        },
        harvest: HarvestRule {
            selector: "figure".to_string(),
            skip: 1,
        },
        fields: vec![
            FieldRule::text(fields::TITLE, "figcaption a"),
            FieldRule::attr(fields::LINK, "figcaption a", "href"),
        ],
    }
}

pub fn trending_topics_rule() -> ExtractionRule {
    ExtractionRule {
        anchor: AnchorRule {
            tag: "div".to_string(),
            text: r"\s*TOPIK TRENDING\s*".to_string(),
            text_match: TextMatch::Pattern,
        },
        navigate: Navigation::NextSibling {
            tag: "ul".to_string(),
        },
        harvest: HarvestRule {
            selector: "li".to_string(),
            skip: 0,
        },
        fields: vec![
            FieldRule::text(fields::TOPIC, "a"),
            FieldRule::attr(fields::LINK, "a", "href"),
        ],
    }
}
