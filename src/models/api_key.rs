//! API key model for gateway authentication.
//!
//! Keys are stored under `apikey:<key>`, keyed by the raw secret itself,
//! so validation is a single exact-match lookup. The raw key never
//! appears in logs; use [`fingerprint`] there instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Represents an API key record stored under `apikey:<key>`.
///
/// The record binds a secret to its owning client and to exactly one
/// routing target. The gateway never mutates these records; admin
/// endpoints own their lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    /// The opaque secret string, also the lookup key
    pub key: String,

    /// Id of the client that owns this key
    pub client_id: String,

    /// Id of the single target this key may route to
    pub target_id: String,

    /// Optional human label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether this key is currently active
    ///
    /// Inactive keys are rejected during validation. This revokes access
    /// without deleting the record.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Absolute expiry timestamp; absent means the key never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Timestamp when this key was created
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl ApiKeyRecord {
    /// A key is usable iff it is active and not past its expiry.
    ///
    /// An expiry exactly at the current instant counts as expired.
    pub fn is_usable(&self) -> bool {
        self.active && self.expires_at.is_none_or(|expires_at| expires_at > Utc::now())
    }
}

/// Short SHA-256 fingerprint of a raw key, safe to put in logs.
pub fn fingerprint(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}
