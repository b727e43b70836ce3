//! Kompas.com "Terpopuler" feed.
//!
//! The most-popular box on the [Kompas](https://www.kompas.com) homepage is a
//! `div.most__wrap` headed by an `<h2>Terpopuler</h2>`. Each `.most__item`
//! carries a title, a channel (category) label and a link. The channel label
//! is missing on some sponsored entries, which then report the category as
//! not available.

use crate::config::{FeedConfig, SiteConfig};
use crate::models::{fields, FeedKind};
use crate::scrapers::rule::{
    AnchorRule, ExtractionRule, FieldRule, HarvestRule, Navigation, TextMatch,
};

pub const SITE_ID: &str = "kompas";
pub const BASE_URL: &str = "https://www.kompas.com";
pub const POPULAR_ARTICLES: &str = "popular-articles";

pub fn site() -> SiteConfig {
    SiteConfig {
        id: SITE_ID.to_string(),
        base_url: BASE_URL.to_string(),
        feeds: vec![FeedConfig {
            id: POPULAR_ARTICLES.to_string(),
            kind: FeedKind::PopularArticles,
            url: None,
            rule: popular_articles_rule(),
        }],
    }
}

pub fn popular_articles_rule() -> ExtractionRule {
    ExtractionRule {
        anchor: AnchorRule {
            tag: "h2".to_string(),
            text: r"^\s*Terpopuler\s*$".to_string(),
            text_match: TextMatch::Pattern,
        },
        navigate: Navigation::Ancestor {
            tag: "div".to_string(),
            class: Some("most__wrap".to_string()),
        },
        harvest: HarvestRule {
            selector: ".most__item".to_string(),
            skip: 0,
        },
        fields: vec![
            FieldRule::text(fields::TITLE, ".most__title"),
            FieldRule::text(fields::CATEGORY, ".most__channel"),
            FieldRule::attr(fields::LINK, "a.most__link", "href"),
        ],
    }
}
