//! Fetching tile images.

use std::future::Future;

use crate::request::redact_token;
use crate::{Cache, Error, NoCache, Result};

/// Source of encoded tile images.
///
/// Implementations must be usable from spawned tasks; the controller holds
/// one behind an `Arc` and shares it between all in-flight requests.
pub trait ImageFetcher: Send + Sync + 'static {
    /// Fetch the encoded image bytes at `url`.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// HTTP fetcher backed by `reqwest`, with an optional response cache.
#[derive(Debug)]
pub struct HttpFetcher<C: Cache = NoCache> {
    http: reqwest::Client,
    cache: C,
}

impl HttpFetcher<NoCache> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache(NoCache)
    }
}

impl Default for HttpFetcher<NoCache> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Cache> HttpFetcher<C> {
    #[must_use]
    pub fn with_cache(cache: C) -> Self {
        Self {
            http: reqwest::Client::new(),
            cache,
        }
    }

    /// Use an existing `reqwest` client (proxies, timeouts, headers).
    #[must_use]
    pub fn with_client(http: reqwest::Client, cache: C) -> Self {
        Self { http, cache }
    }

    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }
}

impl<C: Cache> ImageFetcher for HttpFetcher<C> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = self.cache.get(url) {
            tracing::trace!("Cache hit for {}", redact_token(url));
            return Ok(bytes);
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: redact_token(url),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Http(e.without_url()))?
            .to_vec();
        self.cache.put(url, &bytes);
        tracing::debug!("Fetched {} bytes from {}", bytes.len(), redact_token(url));
        Ok(bytes)
    }
}
