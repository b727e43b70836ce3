//! Single-attempt HTML fetching.
//!
//! [`FetchHtml`] is the seam between the pipeline and the network. The
//! production implementation, [`HttpFetcher`], sends one GET per call with a
//! browser user agent and a bounded timeout. It never retries; the result
//! cache decides when to ask again.

use crate::error::{FetchError, FetchErrorKind};
use crate::models::RawDocument;
use crate::utils::truncate_for_log;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Fetch a page and return its body.
///
/// Implementors make exactly one attempt per call.
pub trait FetchHtml {
    /// Fetch `url`, returning the body of a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, non-2xx status or
    /// an empty body.
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError>;
}

/// [`FetchHtml`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client sending `user_agent` and giving up after `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn get_body(&self, url: &str) -> Result<RawDocument, FetchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::new(
                FetchErrorKind::EmptyBody,
                format!("{url} returned an empty body"),
            ));
        }
        Ok(RawDocument {
            body,
            source_url: url.to_string(),
        })
    }
}

impl FetchHtml for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        let t0 = Instant::now();
        let result = self.get_body(url).await;
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        match &result {
            Ok(doc) => debug!(
                elapsed_ms,
                bytes = doc.body.len(),
                preview = %truncate_for_log(&doc.body, 120),
                "Fetched page"
            ),
            Err(e) => warn!(elapsed_ms, kind = %e.kind, error = %e.message, "Fetch failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;
    use httpmock::prelude::*;

    fn fetcher(timeout: Duration) -> HttpFetcher {
        HttpFetcher::new(DEFAULT_USER_AGENT, timeout).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/").header("user-agent", DEFAULT_USER_AGENT);
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .body("<html><body><span>ARTIKEL TRENDING</span></body></html>");
            })
            .await;

        let url = server.url("/");
        let doc = fetcher(Duration::from_secs(5)).fetch(&url).await.unwrap();
        mock.assert_async().await;

        assert_eq!(doc.source_url, url);
        assert!(doc.body.contains("ARTIKEL TRENDING"));
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_status_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(403).body("forbidden");
            })
            .await;

        let err = fetcher(Duration::from_secs(5))
            .fetch(&server.url("/"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Status(403));
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body("   ");
            })
            .await;

        let err = fetcher(Duration::from_secs(5))
            .fetch(&server.url("/"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::EmptyBody);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200)
                    .body("<html></html>")
                    .delay(Duration::from_secs(2));
            })
            .await;

        let err = fetcher(Duration::from_millis(200))
            .fetch(&server.url("/slow"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        let err = fetcher(Duration::from_secs(2))
            .fetch("http://127.0.0.1:9/")
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Network);
    }
}
