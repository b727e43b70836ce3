//! Fetch → extract → normalize, memoized per (site, feed).
//!
//! [`TrendingService`] is the composition root of the core. It owns the
//! fetcher, one compiled [`Extractor`] per configured feed, and the
//! [`ResultCache`]. Every public call returns a well-formed [`FeedResult`]:
//! fetch failures become empty stale results and structural misses become
//! empty results with an [`ExtractionGap`](crate::models::ExtractionGap) in
//! their diagnostics.

use crate::cache::{Clock, ResultCache, SystemClock};
use crate::config::Config;
use crate::error::{ConfigError, FetchError};
use crate::fetcher::FetchHtml;
use crate::models::{FeedDiagnostics, FeedKey, FeedResult, NormalizedItem};
use crate::normalize::Normalizer;
use crate::scrapers::engine::Extractor;
use chrono::TimeDelta;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug)]
struct FeedPipeline {
    key: FeedKey,
    url: String,
    extractor: Extractor,
    normalizer: Normalizer,
}

#[derive(Debug)]
pub struct TrendingService<F, C = SystemClock> {
    fetcher: F,
    feeds: Vec<FeedPipeline>,
    cache: ResultCache<C>,
    ttl: TimeDelta,
}

impl<F: FetchHtml> TrendingService<F, SystemClock> {
    pub fn new(config: &Config, fetcher: F) -> Result<Self, ConfigError> {
        Self::with_clock(config, fetcher, SystemClock)
    }
}

impl<F: FetchHtml, C: Clock> TrendingService<F, C> {
    /// Compile every configured feed and build an empty cache on `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Rule`] if a feed's rule does not compile.
    pub fn with_clock(config: &Config, fetcher: F, clock: C) -> Result<Self, ConfigError> {
        let mut feeds = Vec::new();
        for site in &config.sites {
            for feed in &site.feeds {
                let extractor =
                    Extractor::compile(feed.kind, &feed.rule).map_err(|source| ConfigError::Rule {
                        site: site.id.clone(),
                        feed: feed.id.clone(),
                        source,
                    })?;
                feeds.push(FeedPipeline {
                    key: FeedKey::new(&site.id, &feed.id),
                    url: feed.page_url(site).to_string(),
                    extractor,
                    normalizer: Normalizer::new(&site.base_url, config.promo_markers.clone()),
                });
            }
        }

        Ok(Self {
            fetcher,
            feeds,
            cache: ResultCache::new(clock),
            ttl: config.cache_ttl(),
        })
    }

    /// Configured (site, feed) pairs in configuration order.
    pub fn feeds(&self) -> impl Iterator<Item = &FeedKey> {
        self.feeds.iter().map(|feed| &feed.key)
    }

    /// The result for (`site`, `feed`), fetched at most once per configured TTL.
    pub async fn get_or_fetch(&self, site: &str, feed: &str) -> Arc<FeedResult> {
        self.get_or_fetch_with_ttl(site, feed, self.ttl).await
    }

    #[instrument(level = "info", skip(self, ttl))]
    pub async fn get_or_fetch_with_ttl(
        &self,
        site: &str,
        feed: &str,
        ttl: TimeDelta,
    ) -> Arc<FeedResult> {
        let key = FeedKey::new(site, feed);
        let Some(pipeline) = self.feeds.iter().find(|p| p.key == key) else {
            warn!(%key, "No such feed configured");
            return Arc::new(FeedResult::failed(
                &key,
                self.cache.now(),
                format!("feed {key} is not configured"),
            ));
        };
        self.cache
            .get_or_fetch(&key, ttl, || self.run(pipeline))
            .await
    }

    /// Every configured feed, fetched concurrently. Results keep configuration order.
    pub async fn fetch_all(&self) -> Vec<Arc<FeedResult>> {
        join_all(
            self.feeds
                .iter()
                .map(|p| self.get_or_fetch(&p.key.site, &p.key.feed)),
        )
        .await
    }

    /// Forget all cached results.
    pub fn invalidate_all(&self) {
        if self.cache.is_empty() {
            debug!("Nothing cached to invalidate");
            return;
        }
        self.cache.invalidate_all();
    }

    /// Number of feeds currently holding a cached result.
    pub fn cached_feeds(&self) -> usize {
        self.cache.len()
    }

    async fn run(&self, pipeline: &FeedPipeline) -> Result<FeedResult, FetchError> {
        let key = &pipeline.key;
        let doc = self.fetcher.fetch(&pipeline.url).await.inspect_err(|e| {
            error!(%key, url = %pipeline.url, kind = %e.kind, error = %e.message, "Fetch failed");
        })?;

        let extraction = pipeline.extractor.extract(&doc);
        if let Some(gap) = extraction.gap {
            warn!(%key, url = %pipeline.url, %gap, "Extraction gap; page layout may have changed");
        }

        let harvested = extraction.records.len();
        let items: Vec<_> = extraction
            .records
            .iter()
            .filter_map(|raw| pipeline.normalizer.normalize(raw, pipeline.extractor.kind()))
            .collect();
        let diagnostics = FeedDiagnostics {
            gap: extraction.gap,
            fields_missing: items.iter().map(NormalizedItem::missing_fields).sum(),
            records_dropped: extraction.records_dropped + (harvested - items.len()),
        };

        info!(
            %key,
            items = items.len(),
            fields_missing = diagnostics.fields_missing,
            records_dropped = diagnostics.records_dropped,
            "Feed extracted"
        );

        Ok(FeedResult {
            site_id: key.site.clone(),
            feed_id: key.feed.clone(),
            items,
            fetched_at: self.cache.now(),
            stale: false,
            error: None,
            diagnostics,
        })
    }
}
