//! Best-effort daily usage counters.
//!
//! Every validated request bumps two counters, one per client and one
//! per key, bucketed by calendar day. Recording is fire-and-forget: the
//! write runs in a detached task and a failure is logged, never
//! surfaced to the request that triggered it. Counters are plain
//! integers with a ~90 day TTL, so the store cleans them up on its own.

use crate::models::api_key::fingerprint;
use crate::store::{KeyStore, StoreError, keys};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Records and reads per-day request counters.
pub struct UsageTracker {
    store: Arc<dyn KeyStore>,
    ttl: Duration,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn KeyStore>, ttl_days: u64) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(ttl_days * 24 * 60 * 60),
        }
    }

    /// Count one request for `client_id` and `key` against today's
    /// buckets. Returns immediately; the store writes happen in a
    /// detached task whose failure is only logged.
    pub fn record(&self, client_id: &str, key: &str) {
        let store = Arc::clone(&self.store);
        let ttl = self.ttl;
        let date = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let client_counter = keys::usage(client_id, &date);
        let key_counter = keys::key_usage(key, &date);
        let key_print = fingerprint(key);

        tokio::spawn(async move {
            for counter in [key_counter, client_counter] {
                if let Err(error) = bump(store.as_ref(), &counter, ttl).await {
                    tracing::warn!(%error, key = %key_print, "usage counter update failed");
                }
            }
        });
    }

    /// Requests counted for a client on `date`. Absent counters read as
    /// zero.
    pub async fn daily(&self, client_id: &str, date: NaiveDate) -> Result<u64, StoreError> {
        let counter = keys::usage(client_id, &date.format("%Y-%m-%d").to_string());
        let raw = self.store.get(&counter).await?;
        Ok(raw.and_then(|value| value.trim().parse().ok()).unwrap_or(0))
    }
}

/// Read-increment-write one counter. Counters are telemetry, so the
/// non-atomic increment is acceptable; undercounting beats blocking the
/// request path.
async fn bump(store: &dyn KeyStore, counter: &str, ttl: Duration) -> Result<(), StoreError> {
    let current: u64 = store
        .get(counter)
        .await?
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0);
    store
        .put_with_ttl(counter, &(current + 1).to_string(), ttl)
        .await
}
