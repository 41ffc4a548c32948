//! Logical key layout for the key-value store.
//!
//! All records share one flat keyspace, namespaced by prefix:
//!
//! - `client:<id>` - client record
//! - `apikey:<key>` - API key record, keyed by the raw key string
//! - `credits:<clientId>` - credit balance
//! - `target:<id>` - routing target mirror; `targets:list` - ordered ids
//! - `client:keys:<clientId>` - index of keys owned by a client
//! - `usage:<clientId>:<date>` / `keyusage:<key>:<date>` - daily counters

/// Prefix shared by client records and the per-client key index.
pub const CLIENT_PREFIX: &str = "client:";

/// Prefix of the per-client key index. Also matches [`CLIENT_PREFIX`],
/// so scans over client records must exclude it, see [`is_client_record_key`].
pub const CLIENT_KEYS_PREFIX: &str = "client:keys:";

/// Key holding the ordered list of target ids.
pub const TARGETS_LIST: &str = "targets:list";

pub fn client(id: &str) -> String {
    format!("client:{id}")
}

pub fn api_key(key: &str) -> String {
    format!("apikey:{key}")
}

pub fn credits(client_id: &str) -> String {
    format!("credits:{client_id}")
}

pub fn target(id: &str) -> String {
    format!("target:{id}")
}

pub fn client_keys(client_id: &str) -> String {
    format!("client:keys:{client_id}")
}

pub fn usage(client_id: &str, date: &str) -> String {
    format!("usage:{client_id}:{date}")
}

pub fn key_usage(key: &str, date: &str) -> String {
    format!("keyusage:{key}:{date}")
}

/// True for `client:<id>` keys, false for `client:keys:<id>` index keys
/// that share the same prefix.
pub fn is_client_record_key(key: &str) -> bool {
    key.starts_with(CLIENT_PREFIX) && !key.starts_with(CLIENT_KEYS_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_record_keys_exclude_the_key_index() {
        assert!(is_client_record_key("client:abc"));
        assert!(!is_client_record_key("client:keys:abc"));
        assert!(!is_client_record_key("apikey:abc"));
    }
}
