//! The HTTP fetcher
//!
//! `HttpFetcher` turns a `FetchRequest` into a `FetchResponse`:
//! - Per-attempt deadline with bounded, fixed or linear retries
//! - Response cache for successful GETs
//! - User-Agent rotation from a fixed pool
//! - A FIFO semaphore capping the requests in flight

use crate::fetch::cache::{cache_key, ResponseCache};
use crate::fetch::identity::IdentityRotator;
use crate::fetch::transport::{RawResponse, ReqwestTransport, Transport, TransportError, TransportRequest};
use crate::fetch::types::{
    FetchConfig, FetchError, FetchErrorCode, FetchFailure, FetchMethod, FetchRequest,
    FetchResponse, FetchStats, RequestOverrides,
};
use crate::url::parse_http_url;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::Semaphore;

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Decrements the in-flight counter when an attempt ends
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Concurrency-capped, retrying, caching HTTP client
pub struct HttpFetcher {
    transport: Arc<dyn Transport>,
    config: FetchConfig,
    permits: Arc<Semaphore>,
    cache: Mutex<ResponseCache>,
    identity: IdentityRotator,
    total_requests: AtomicU64,
    success_requests: AtomicU64,
    failed_requests: AtomicU64,
    cache_hits: AtomicU64,
    in_flight: Arc<AtomicUsize>,
}

impl HttpFetcher {
    /// Creates a fetcher over the network
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Ready to use
    /// * `Err(reqwest::Error)` - The HTTP client could not be built
    pub fn new(config: FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_transport(config, Arc::new(ReqwestTransport::new()?)))
    }

    /// Creates a fetcher over a custom transport
    pub fn with_transport(config: FetchConfig, transport: Arc<dyn Transport>) -> Self {
        let concurrency = config.concurrency.max(1);
        let cache_capacity = config.cache_capacity;
        Self {
            transport,
            config,
            permits: Arc::new(Semaphore::new(concurrency)),
            cache: Mutex::new(ResponseCache::new(cache_capacity)),
            identity: IdentityRotator::from_os_rng(),
            total_requests: AtomicU64::new(0),
            success_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replaces the random source used for identity rotation and jitter
    pub fn with_identity(mut self, identity: IdentityRotator) -> Self {
        self.identity = identity;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Performs a request
    ///
    /// # Arguments
    ///
    /// * `request` - The request; its overrides are merged over the defaults
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResponse)` - A 2xx response, from the network or the cache
    /// * `Err(FetchError)` - The URL was invalid or every attempt failed
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let config = self.config.merged(request.config.as_ref());
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = parse_http_url(&request.url) {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Rejected request for {}: {}", request.url, e);
            return Err(FetchError {
                code: FetchErrorCode::InvalidRequest,
                url: request.url.clone(),
                retry_count: 0,
                cause: FetchFailure::InvalidUrl(e.to_string()),
            });
        }

        let cacheable = config.enable_cache && request.method == FetchMethod::Get;
        let key = cache_key(request.method, &request.url, &request.headers);

        if cacheable {
            if let Some(mut hit) = self.lock_cache().get(&key) {
                hit.from_cache = true;
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                self.success_requests.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Cache hit for {}", request.url);
                return Ok(hit);
            }
        }

        let attempts = config.retries.saturating_add(1);
        let mut last_failure = FetchFailure::Network("no attempt made".to_string());

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = config.backoff.delay_for(attempt - 1, config.retry_delay)
                    + self.identity.jitter(config.retry_jitter);
                tracing::debug!(
                    "Retrying {} (attempt {}/{}) in {:?}",
                    request.url,
                    attempt,
                    attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(request, &config).await {
                Ok(response) => {
                    self.success_requests.fetch_add(1, Ordering::Relaxed);
                    if cacheable {
                        self.lock_cache().insert(key, response.clone());
                    }
                    return Ok(response);
                }
                Err(failure) => {
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        attempts,
                        request.url,
                        failure
                    );
                    last_failure = failure;
                }
            }
        }

        self.failed_requests.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            "Giving up on {} after {} attempt(s): {}",
            request.url,
            attempts,
            last_failure
        );

        Err(FetchError {
            code: FetchErrorCode::MaxRetriesExceeded,
            url: request.url.clone(),
            retry_count: attempts,
            cause: last_failure,
        })
    }

    /// One network attempt under a concurrency permit and a deadline
    async fn attempt(
        &self,
        request: &FetchRequest,
        config: &FetchConfig,
    ) -> Result<FetchResponse, FetchFailure> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;
        let _in_flight = InFlight::enter(&self.in_flight);

        let transport_request = TransportRequest {
            url: request.url.clone(),
            method: request.method,
            headers: self.build_headers(request, config),
            body: request.body.clone(),
        };

        let started = Instant::now();
        let raw = match tokio::time::timeout(config.timeout, self.transport.send(transport_request)).await {
            Err(_) => return Err(FetchFailure::Timeout(config.timeout)),
            Ok(Err(TransportError::Timeout)) => return Err(FetchFailure::Timeout(config.timeout)),
            Ok(Err(e)) => return Err(FetchFailure::Network(e.to_string())),
            Ok(Ok(raw)) => raw,
        };

        into_response(raw, started.elapsed().as_millis() as u64)
    }

    /// Default headers, caller headers on top, then the identity
    fn build_headers(&self, request: &FetchRequest, config: &FetchConfig) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), DEFAULT_ACCEPT.to_string());
        headers.insert("Accept-Language".to_string(), DEFAULT_ACCEPT_LANGUAGE.to_string());
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());
        headers.insert("Pragma".to_string(), "no-cache".to_string());

        let mut caller_user_agent = None;
        for (name, value) in &request.headers {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            if name.eq_ignore_ascii_case("user-agent") {
                caller_user_agent = Some(value.clone());
                continue;
            }
            headers.insert(name.clone(), value.clone());
        }

        let user_agent = match caller_user_agent {
            Some(ua) if !config.rotate_user_agent => ua,
            _ if config.rotate_user_agent => self.identity.next_user_agent(),
            _ => self.identity.default_user_agent().to_string(),
        };
        headers.insert("User-Agent".to_string(), user_agent);

        headers
    }

    /// Fetches a URL with GET and returns the body
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.fetch(&FetchRequest::get(url)).await.map(|r| r.content)
    }

    /// Checks whether a URL answers a HEAD request with 2xx
    ///
    /// One attempt, never cached; every error maps to `false`.
    pub async fn is_accessible(&self, url: &str) -> bool {
        let request = FetchRequest::head(url).with_config(RequestOverrides {
            retries: Some(0),
            use_cache: Some(false),
            ..RequestOverrides::default()
        });

        match self.fetch(&request).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("{} is not accessible: {}", url, e);
                false
            }
        }
    }

    pub fn stats(&self) -> FetchStats {
        FetchStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            success_requests: self.success_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            current_concurrency: self.in_flight.load(Ordering::SeqCst),
        }
    }

    /// Zeroes the counters; the in-flight gauge is left alone
    pub fn reset_stats(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.success_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
        tracing::debug!("Response cache cleared");
    }

    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Converts a raw response, treating any non-2xx status as a failure
fn into_response(raw: RawResponse, response_time_ms: u64) -> Result<FetchResponse, FetchFailure> {
    if !(200..300).contains(&raw.status) {
        return Err(FetchFailure::HttpStatus {
            status: raw.status,
            status_text: raw.status_text,
        });
    }

    Ok(FetchResponse {
        status: raw.status,
        status_text: raw.status_text,
        headers: raw.headers,
        content: raw.body,
        final_url: raw.final_url,
        from_cache: false,
        response_time_ms,
    })
}
