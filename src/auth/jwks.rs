// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - Only the key set is cached, never a verification outcome
//! - Cache lifetime follows the endpoint's `Cache-Control: max-age`
//!   (Google rotates the secure-token keys and advertises the lifetime there)
//! - An unknown `kid` triggers a forced refresh to pick up rotated keys, at
//!   most once per [`MIN_REFRESH_INTERVAL`]
//! - Fetches are serialized: concurrent misses share one request

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header::CACHE_CONTROL, HeaderMap};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes) when the endpoint sends no max-age.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum age of the cached set before an unknown `kid` may refetch it.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout for a single JWKS request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// JWKS manager with caching.
#[derive(Clone)]
pub struct JwksManager {
    /// JWKS URL
    jwks_url: String,
    /// TTL used when the response carries no max-age
    default_ttl: Duration,
    /// Minimum age of the cache before a forced refresh
    min_refresh_interval: Duration,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// Held for the duration of every fetch
    fetch_lock: Arc<Mutex<()>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager for `jwks_url`.
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::InternalError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            default_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: MIN_REFRESH_INTERVAL,
            cache: Arc::new(RwLock::new(None)),
            fetch_lock: Arc::new(Mutex::new(())),
            client,
        })
    }

    /// Override the TTL used when the endpoint sends no max-age.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Override the minimum cache age for an unknown-`kid` refresh.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        if let Some(jwks) = self.fresh_jwks().await {
            return Ok(jwks);
        }

        let _fetching = self.fetch_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(jwks) = self.fresh_jwks().await {
            return Ok(jwks);
        }
        self.fetch_and_store().await
    }

    async fn fresh_jwks(&self) -> Option<JwkSet> {
        let cache = self.cache.read().await;
        (*cache)
            .as_ref()
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.jwks.clone())
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<(JwkSet, Duration), AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let ttl = max_age(response.headers()).unwrap_or(self.default_ttl);

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        Ok((jwks, ttl))
    }

    /// Get a decoding key for the given key ID.
    ///
    /// A miss refetches the set only when the cached copy is older than the
    /// minimum refresh interval.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = find_key(&jwks, kid) {
            return jwk_to_decoding_key(jwk);
        }

        let _fetching = self.fetch_lock.lock().await;
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if let Some(jwk) = find_key(&entry.jwks, kid) {
                    return jwk_to_decoding_key(jwk);
                }
                if entry.fetched_at.elapsed() < self.min_refresh_interval {
                    return Err(AuthError::NoMatchingKey);
                }
            }
        }

        tracing::debug!(kid, "Unknown signing key, refreshing JWKS");
        let jwks = self.fetch_and_store().await?;
        let jwk = find_key(&jwks, kid).ok_or(AuthError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<JwkSet, AuthError> {
        let _fetching = self.fetch_lock.lock().await;
        self.fetch_and_store().await
    }

    /// Fetch and replace the cache. Callers hold `fetch_lock`.
    async fn fetch_and_store(&self) -> Result<JwkSet, AuthError> {
        let (jwks, ttl) = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
            ttl,
        });
        Ok(jwks)
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        (*cache).as_ref().is_some_and(CacheEntry::is_fresh)
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

/// `max-age` directive of a `Cache-Control` header.
fn max_age(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::InternalError(format!("Failed to create RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };

            Ok((key, alg))
        }
        _ => Err(AuthError::InternalError(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}
