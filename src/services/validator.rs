//! API key validation.
//!
//! Resolves the raw `X-API-Key` value to its stored record and decides
//! whether the key may be used. Validated records sit in a small TTL
//! cache to keep hot keys off the store; a cached record is re-checked
//! against its active flag and expiry on every hit, so a key that
//! expires while cached is still rejected on time. A key revoked by an
//! admin out-of-band can be served from cache for at most the TTL;
//! in-process admin mutations call [`KeyValidator::invalidate`] and take
//! effect immediately.

use crate::error::GatewayError;
use crate::models::api_key::{ApiKeyRecord, fingerprint};
use crate::services::usage::UsageTracker;
use crate::store::{KeyStore, keys};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

const CACHE_CAPACITY: u64 = 10_000;

/// Validates raw API keys against the store, with a bounded
/// read-through cache and fire-and-forget usage counting.
pub struct KeyValidator {
    store: Arc<dyn KeyStore>,
    cache: Cache<String, ApiKeyRecord>,
    usage: Arc<UsageTracker>,
}

impl KeyValidator {
    pub fn new(store: Arc<dyn KeyStore>, usage: Arc<UsageTracker>, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(cache_ttl)
            .build();
        Self {
            store,
            cache,
            usage,
        }
    }

    /// Resolve `raw_key` to a usable key record.
    ///
    /// Fails with `AuthInvalid` when no record exists for the key and
    /// with `KeyExpired` when the record is inactive or past its
    /// expiry. On success the day's usage counters are bumped in the
    /// background before the record is returned.
    pub async fn validate(&self, raw_key: &str) -> Result<ApiKeyRecord, GatewayError> {
        let record = match self.cache.get(raw_key).await {
            Some(record) => record,
            None => {
                let raw = self
                    .store
                    .get(&keys::api_key(raw_key))
                    .await?
                    .ok_or(GatewayError::AuthInvalid)?;
                let record: ApiKeyRecord = serde_json::from_str(&raw)?;
                if record.is_usable() {
                    self.cache.insert(raw_key.to_string(), record.clone()).await;
                }
                record
            }
        };

        // Cached or fresh, the liveness check always runs: expiry can
        // pass while a record sits in the cache.
        if !record.is_usable() {
            self.cache.invalidate(raw_key).await;
            tracing::debug!(key = %fingerprint(raw_key), "rejected expired or inactive key");
            return Err(GatewayError::KeyExpired);
        }

        self.usage.record(&record.client_id, raw_key);
        Ok(record)
    }

    /// Drop a key from the cache so the next validation re-reads the
    /// store. Called by admin key update and delete.
    pub async fn invalidate(&self, raw_key: &str) {
        self.cache.invalidate(raw_key).await;
    }
}
