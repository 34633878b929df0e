//! HTTP fetch layer
//!
//! This module handles:
//! - Per-attempt timeouts with bounded retries
//! - The LRU response cache
//! - User-Agent rotation and retry jitter
//! - Capping the requests in flight

mod cache;
mod client;
mod identity;
mod transport;
mod types;

pub use cache::{cache_key, ResponseCache};
pub use client::HttpFetcher;
pub use identity::{IdentityRotator, USER_AGENTS};
pub use transport::{build_http_client, RawResponse, ReqwestTransport, Transport, TransportError, TransportRequest};
pub use types::{
    Backoff, FetchConfig, FetchError, FetchErrorCode, FetchFailure, FetchMethod, FetchRequest,
    FetchResponse, FetchStats, RequestOverrides,
};
