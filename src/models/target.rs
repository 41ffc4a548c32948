//! Routing target model: where matched requests are forwarded and under
//! what policy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A routing and policy unit, loaded into the in-process routing table
/// at startup and mirrored under `target:<id>` for inspection.
///
/// `pattern` is interpreted three ways:
/// - `isRegex: true` - a full regular expression tested against the path
/// - trailing `*` - prefix wildcard (`/api/*` matches `/api`, `/api/`,
///   `/api/x`, not `/apix`)
/// - otherwise - exact path match, with a lone trailing slash tolerated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
    /// Unique identifier, referenced from API key records
    pub id: String,

    /// Path pattern inbound requests must match
    pub pattern: String,

    /// Interpret `pattern` as a regular expression
    #[serde(default)]
    pub is_regex: bool,

    /// Backend base URL requests are forwarded to
    pub target_url: String,

    /// Credits debited per matched request, unless a cost rule overrides it
    #[serde(default = "default_cost")]
    pub cost: u64,

    /// Extra headers injected into the outbound request
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_headers: HashMap<String, String>,

    /// Forward the caller's X-API-Key to the backend
    #[serde(default)]
    pub forward_api_key: bool,

    /// Annotate responses with X-Credits-Remaining / X-Credits-Used
    #[serde(default = "default_true")]
    pub add_credits_header: bool,
}

fn default_cost() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

/// One entry of the static pattern-to-cost table.
///
/// Rules are regular expressions checked in order against the request
/// path; the first match wins and overrides the target's own cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRule {
    pub pattern: String,
    pub cost: u64,
}
