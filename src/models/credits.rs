//! Credit balance model and the outcome of a debit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured balance record stored under `credits:<clientId>`.
///
/// Two stored shapes exist in the wild: this record, and a bare integer
/// string written by earlier tooling. [`CreditBalance::parse`] accepts
/// both; all writes use the structured form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    /// Remaining credits; never negative
    pub balance: u64,

    /// When the balance last changed
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl CreditBalance {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            last_updated: Utc::now(),
        }
    }

    /// Parse a stored balance value, tolerating the legacy bare-number
    /// form (`100` or `"100"`). Unreadable values count as zero.
    pub fn parse(raw: &str) -> u64 {
        if let Ok(record) = serde_json::from_str::<CreditBalance>(raw) {
            return record.balance;
        }
        match raw.trim().trim_matches('"').parse::<u64>() {
            Ok(balance) => balance,
            Err(_) => {
                tracing::warn!(raw, "unreadable credit balance treated as zero");
                0
            }
        }
    }
}

/// Result of one debit attempt against a client's balance.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DebitOutcome {
    /// Whether the balance covered the cost and was debited
    pub success: bool,

    /// Balance after the attempt (unchanged when `success` is false)
    pub remaining: u64,

    /// Credits actually taken: the cost on success, zero otherwise
    pub used: u64,
}
