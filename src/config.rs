//! Runtime configuration.
//!
//! Configuration is optional YAML. Every top-level key has a built-in
//! default, so a file only needs to contain what it overrides:
//!
//! ```yaml
//! cache_ttl_secs: 120
//! promo_markers: ["Tempo Plus", "Premium"]
//! ```
//!
//! Site selectors are data, not code: a changed layout is fixed by editing the
//! `sites` section rather than the extractor.

use crate::error::ConfigError;
use crate::models::FeedKind;
use crate::normalize::site_origin;
use crate::scrapers::engine::Extractor;
use crate::scrapers::rule::ExtractionRule;
use crate::scrapers::{kompas, tempo};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, instrument};

/// Desktop browser identification; several portals reject default client agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Freshness window for cached feed results.
    pub cache_ttl_secs: u64,
    /// Substrings removed from titles (exact, case-sensitive).
    pub promo_markers: Vec<String>,
    pub sites: Vec<SiteConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub id: String,
    /// Origin prepended to root-relative links, e.g. `https://www.tempo.co`.
    pub base_url: String,
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub id: String,
    pub kind: FeedKind,
    /// Page to fetch; defaults to the site's `base_url`.
    #[serde(default)]
    pub url: Option<String>,
    pub rule: ExtractionRule,
}

impl FeedConfig {
    pub fn page_url<'a>(&'a self, site: &'a SiteConfig) -> &'a str {
        self.url.as_deref().unwrap_or(&site.base_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 15,
            cache_ttl_secs: 300,
            promo_markers: vec![tempo::PROMO_MARKER.to_string()],
            sites: vec![tempo::site(), kompas::site()],
        }
    }
}

impl Config {
    /// Load configuration from `path`, or the built-in defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if a
    /// rule fails validation.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_string(),
                    source,
                })?;
                Self::from_yaml(&text, path)?
            }
        };
        config.validate()?;
        info!(
            sites = config.sites.len(),
            ttl_secs = config.cache_ttl_secs,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse YAML text; `origin` names the source in error messages.
    pub fn from_yaml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: origin.to_string(),
            source,
        })
    }

    /// Check every site's `base_url`, compile every rule and reject duplicate
    /// (site, feed) pairs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for site in &self.sites {
            if site_origin(&site.base_url).is_none() {
                return Err(ConfigError::BaseUrl {
                    site: site.id.clone(),
                    url: site.base_url.clone(),
                });
            }
            for feed in &site.feeds {
                if !seen.insert((site.id.as_str(), feed.id.as_str())) {
                    return Err(ConfigError::DuplicateFeed {
                        site: site.id.clone(),
                        feed: feed.id.clone(),
                    });
                }
                Extractor::compile(feed.kind, &feed.rule).map_err(|source| ConfigError::Rule {
                    site: site.id.clone(),
                    feed: feed.id.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> TimeDelta {
        TimeDelta::from_std(Duration::from_secs(self.cache_ttl_secs)).unwrap_or(TimeDelta::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_ttl(), TimeDelta::minutes(5));
        assert_eq!(config.sites.len(), 2);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config =
            Config::from_yaml(include_str!("../config.example.yaml"), "config.example.yaml")
                .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_yaml_keeps_default_sites() {
        let config = Config::from_yaml("cache_ttl_secs: 60\npromo_markers: []\n", "inline").unwrap();
        assert_eq!(config.cache_ttl_secs, 60);
        assert!(config.promo_markers.is_empty());
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.sites, Config::default().sites);
    }

    #[test]
    fn test_yaml_site_override() {
        let yaml = r#"
sites:
  - id: contoh
    base_url: https://contoh.id
    feeds:
      - id: populer
        kind: popular_articles
        url: https://contoh.id/populer
        rule:
          anchor: { tag: h2, text: Populer }
          navigate: { type: ancestor, tag: section }
          harvest: { selector: article }
          fields:
            - { name: title, selector: h3 }
            - { name: category, selector: .kanal }
            - { name: link, selector: a, attr: href }
"#;
        let config = Config::from_yaml(yaml, "inline").unwrap();
        assert!(config.validate().is_ok());
        let site = &config.sites[0];
        assert_eq!(site.feeds[0].kind, FeedKind::PopularArticles);
        assert_eq!(site.feeds[0].page_url(site), "https://contoh.id/populer");
    }

    #[test]
    fn test_duplicate_feed_rejected() {
        let mut config = Config::default();
        let dup = config.sites[0].feeds[0].clone();
        config.sites[0].feeds.push(dup);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateFeed { .. })
        ));
    }

    #[test]
    fn test_base_url_without_scheme_rejected() {
        let mut config = Config::default();
        config.sites[1].base_url = "www.kompas.com".to_string();
        match config.validate() {
            Err(ConfigError::BaseUrl { site, url }) => {
                assert_eq!(site, "kompas");
                assert_eq!(url, "www.kompas.com");
            }
            other => panic!("expected BaseUrl error, got {other:?}"),
        }
    }

    #[test]
    fn test_base_url_with_path_accepted() {
        let mut config = Config::default();
        config.sites[0].base_url = "https://www.tempo.co/news".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_selector_rejected() {
        let mut config = Config::default();
        config.sites[1].feeds[0].rule.harvest.selector = "::".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("rule for kompas/popular-articles is invalid"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::load(Some("/nonexistent/trending.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
