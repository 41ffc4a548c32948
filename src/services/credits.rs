//! Credit ledger: balance checks, debits, and admin adjustments.
//!
//! The balance under `credits:<clientId>` is the only record multiple
//! requests mutate concurrently. The store offers no compare-and-swap,
//! so every read-modify-write goes through a per-client async mutex;
//! two requests for the same client debit strictly one after the other,
//! which keeps the balance from ever going negative. Requests for
//! different clients never contend.

use crate::error::GatewayError;
use crate::models::credits::{CreditBalance, DebitOutcome};
use crate::store::{KeyStore, keys};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Serialized access to per-client credit balances.
pub struct CreditLedger {
    store: Arc<dyn KeyStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CreditLedger {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, client_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(client_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn read_balance(&self, client_id: &str) -> Result<u64, GatewayError> {
        let raw = self.store.get(&keys::credits(client_id)).await?;
        Ok(raw.map(|value| CreditBalance::parse(&value)).unwrap_or(0))
    }

    async fn write_balance(&self, client_id: &str, balance: u64) -> Result<(), GatewayError> {
        let record = serde_json::to_string(&CreditBalance::new(balance))?;
        self.store.put(&keys::credits(client_id), &record).await?;
        Ok(())
    }

    /// Attempt to take `cost` credits from a client's balance.
    ///
    /// When the balance covers the cost, the new balance is written back
    /// and the outcome reports `success` with the remainder. When it
    /// does not, nothing is written and the outcome carries the
    /// untouched balance. An absent balance reads as zero.
    pub async fn debit(&self, client_id: &str, cost: u64) -> Result<DebitOutcome, GatewayError> {
        let lock = self.lock_for(client_id);
        let _guard = lock.lock().await;

        let balance = self.read_balance(client_id).await?;
        if balance < cost {
            return Ok(DebitOutcome {
                success: false,
                remaining: balance,
                used: 0,
            });
        }

        let remaining = balance - cost;
        self.write_balance(client_id, remaining).await?;
        Ok(DebitOutcome {
            success: true,
            remaining,
            used: cost,
        })
    }

    /// Current balance; absent reads as zero.
    pub async fn balance(&self, client_id: &str) -> Result<u64, GatewayError> {
        let lock = self.lock_for(client_id);
        let _guard = lock.lock().await;
        self.read_balance(client_id).await
    }

    /// Unconditionally set the balance. Admin correction path, no cost
    /// checking.
    pub async fn set(&self, client_id: &str, balance: u64) -> Result<u64, GatewayError> {
        let lock = self.lock_for(client_id);
        let _guard = lock.lock().await;
        self.write_balance(client_id, balance).await?;
        Ok(balance)
    }

    /// Add credits on top of the current balance and return the new
    /// total. Admin top-up path.
    pub async fn add(&self, client_id: &str, amount: u64) -> Result<u64, GatewayError> {
        let lock = self.lock_for(client_id);
        let _guard = lock.lock().await;

        let balance = self.read_balance(client_id).await?.saturating_add(amount);
        self.write_balance(client_id, balance).await?;
        Ok(balance)
    }

    /// Drop a client's balance record entirely. Used by the client
    /// delete cascade.
    ///
    /// The lock entry stays in the map: an in-flight debit may still
    /// hold a clone of it, and minting a replacement mutex for the same
    /// id would let that debit's write interleave with traffic for a
    /// re-created client.
    pub async fn remove(&self, client_id: &str) -> Result<(), GatewayError> {
        let lock = self.lock_for(client_id);
        let _guard = lock.lock().await;

        self.store.delete(&keys::credits(client_id)).await?;
        Ok(())
    }
}
