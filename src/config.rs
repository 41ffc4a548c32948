//! Application configuration management.
//!
//! Configuration comes from environment variables, deserialized with
//! the `envy` crate into a type-safe struct. Everything has a default
//! except the admin key, which stays unset unless provided (disabling
//! the admin surface).

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `PORT` (optional): HTTP listen port, defaults to 3000
/// - `ADMIN_KEY` (optional): static key for the admin surface; unset
///   disables all `/admin` routes
/// - `TARGETS_FILE` (optional): path to a JSON array of target
///   descriptors loaded into the routing table at startup
/// - `COST_RULES_FILE` (optional): path to a JSON array of
///   `{pattern, cost}` rules
/// - `UPSTREAM_TIMEOUT_SECS` (optional): backend fetch timeout,
///   defaults to 30
/// - `KEY_CACHE_TTL_SECS` (optional): validated-key cache TTL,
///   defaults to 60
/// - `USAGE_TTL_DAYS` (optional): retention of daily usage counters,
///   defaults to 90
/// - `MAX_BODY_BYTES` (optional): largest request body the gateway
///   buffers for forwarding, defaults to 10 MiB
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub admin_key: Option<String>,

    #[serde(default)]
    pub targets_file: Option<String>,

    #[serde(default)]
    pub cost_rules_file: Option<String>,

    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    #[serde(default = "default_key_cache_ttl_secs")]
    pub key_cache_ttl_secs: u64,

    #[serde(default = "default_usage_ttl_days")]
    pub usage_ttl_days: u64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    3000
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_key_cache_ttl_secs() -> u64 {
    60
}

fn default_usage_ttl_days() -> u64 {
    90
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first when present (development
    /// convenience), then the environment is deserialized into the
    /// struct. Field names map to upper-case variables, `port` -> `PORT`.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
    }
}

// The admin key must not end up in logs via debug-printed config.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("admin_key", &self.admin_key.as_ref().map(|_| "[REDACTED]"))
            .field("targets_file", &self.targets_file)
            .field("cost_rules_file", &self.cost_rules_file)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("key_cache_ttl_secs", &self.key_cache_ttl_secs)
            .field("usage_ttl_days", &self.usage_ttl_days)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}
