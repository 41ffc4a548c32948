//! Client model: the billable tenant that owns API keys and a credit balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a client record stored under `client:<id>`.
///
/// A client owns zero or more API keys (tracked in the `client:keys:<id>`
/// index) and exactly one credit balance (`credits:<id>`). Deleting a
/// client cascades to both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    /// Unique identifier for this client. Immutable after creation.
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Contact email, stored lower-cased and globally unique
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Billing plan; determines the initial credit grant at creation
    #[serde(default)]
    pub plan: Plan,

    /// What kind of consumer this client is
    #[serde(rename = "type", default)]
    pub client_type: ClientType,

    /// Opaque operator-defined metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Timestamp when the client was created. Immutable after creation.
    pub created_at: DateTime<Utc>,
}

/// Billing plan of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Basic,
    Premium,
}

impl Plan {
    /// Credits granted once when a client is created on this plan.
    pub fn initial_grant(self) -> u64 {
        match self {
            Plan::Free => 100,
            Plan::Basic => 1_000,
            Plan::Premium => 10_000,
        }
    }
}

/// Category of API consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    #[default]
    Service,
    Application,
    Personal,
}

/// Request body for creating a client.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Acme Ingest",
///   "email": "Ops@Acme.example",
///   "plan": "basic",
///   "type": "service"
/// }
/// ```
///
/// `id` is generated when not supplied. The email is normalized to
/// lower case before the uniqueness check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    /// Explicit id; a UUID is generated when absent
    #[serde(default)]
    pub id: Option<String>,

    /// Name for the new client
    pub name: String,

    /// Contact email (optional)
    #[serde(default)]
    pub email: Option<String>,

    /// Billing plan (defaults to free)
    #[serde(default)]
    pub plan: Plan,

    /// Consumer category (defaults to service)
    #[serde(rename = "type", default)]
    pub client_type: ClientType,

    /// Opaque metadata attached verbatim to the record
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Request body for updating a client. Absent fields are left unchanged;
/// `id` and `createdAt` cannot be changed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub plan: Option<Plan>,

    #[serde(rename = "type", default)]
    pub client_type: Option<ClientType>,

    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}
