//! Static routing table and path matching.
//!
//! Targets are loaded once at startup into an in-process table keyed by
//! id; resolving the target bound to an API key is a plain map lookup
//! with no I/O. Pattern matching against the request path and the
//! pattern-to-cost table live here as well.

use crate::models::target::{CostRule, TargetDescriptor};
use crate::store::{KeyStore, StoreError, keys};
use regex::Regex;
use std::collections::HashMap;

/// Error loading target or cost-rule configuration files.
#[derive(Debug, thiserror::Error)]
pub enum TargetLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// In-process routing table: target descriptors by id plus the compiled
/// cost rules. Immutable after startup.
pub struct TargetTable {
    routes: HashMap<String, TargetDescriptor>,
    order: Vec<String>,
    cost_rules: Vec<(Regex, u64)>,
}

impl TargetTable {
    /// Build the table from loaded descriptors and cost rules.
    ///
    /// Descriptors with an unparseable `targetUrl` are dropped with a
    /// warning; later descriptors win duplicate ids. Cost rules that do
    /// not compile are dropped with a warning, preserving the order of
    /// the rest.
    pub fn new(descriptors: Vec<TargetDescriptor>, rules: Vec<CostRule>) -> Self {
        let mut routes = HashMap::new();
        let mut order = Vec::new();

        for descriptor in descriptors {
            if let Err(error) = url::Url::parse(&descriptor.target_url) {
                tracing::warn!(
                    target = %descriptor.id,
                    url = %descriptor.target_url,
                    %error,
                    "dropping target with invalid backend URL"
                );
                continue;
            }
            if descriptor.is_regex && Regex::new(&descriptor.pattern).is_err() {
                // Kept in the table: an unmatchable pattern means the
                // target never routes, same as the matcher's behavior.
                tracing::warn!(
                    target = %descriptor.id,
                    pattern = %descriptor.pattern,
                    "target pattern is not a valid regex and will never match"
                );
            }
            if !routes.contains_key(&descriptor.id) {
                order.push(descriptor.id.clone());
            }
            routes.insert(descriptor.id.clone(), descriptor);
        }

        let cost_rules = rules
            .into_iter()
            .filter_map(|rule| match Regex::new(&rule.pattern) {
                Ok(regex) => Some((regex, rule.cost)),
                Err(error) => {
                    tracing::warn!(pattern = %rule.pattern, %error, "dropping invalid cost rule");
                    None
                }
            })
            .collect();

        Self {
            routes,
            order,
            cost_rules,
        }
    }

    /// Look up a target by id. O(1), no I/O.
    pub fn target(&self, target_id: &str) -> Option<&TargetDescriptor> {
        self.routes.get(target_id)
    }

    /// All targets in registration order.
    pub fn all(&self) -> Vec<&TargetDescriptor> {
        self.order
            .iter()
            .filter_map(|id| self.routes.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Credits to debit for a request to `path` routed at `descriptor`.
    ///
    /// The cost-rule table is consulted first (first match wins); the
    /// descriptor's own cost applies otherwise.
    pub fn cost_for(&self, path: &str, descriptor: &TargetDescriptor) -> u64 {
        for (regex, cost) in &self.cost_rules {
            if regex.is_match(path) {
                return *cost;
            }
        }
        descriptor.cost
    }
}

/// Read a JSON array of target descriptors from `path`.
pub fn read_descriptors(path: &str) -> Result<Vec<TargetDescriptor>, TargetLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TargetLoadError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| TargetLoadError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Read a JSON array of cost rules from `path`.
pub fn read_cost_rules(path: &str) -> Result<Vec<CostRule>, TargetLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TargetLoadError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| TargetLoadError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Mirror the routing table into the store under `target:<id>` and
/// `targets:list`, for operator inspection. The gateway itself only ever
/// reads the in-process table.
pub async fn mirror_to_store(store: &dyn KeyStore, table: &TargetTable) -> Result<(), StoreError> {
    let mut ids = Vec::with_capacity(table.len());
    for descriptor in table.all() {
        let raw = serde_json::to_string(descriptor)
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        store.put(&keys::target(&descriptor.id), &raw).await?;
        ids.push(descriptor.id.clone());
    }
    let list = serde_json::to_string(&ids).map_err(|err| StoreError::Backend(err.to_string()))?;
    store.put(keys::TARGETS_LIST, &list).await
}

/// Test a request path against a target pattern.
///
/// Deterministic and total: every path either matches or does not.
/// - regex patterns match when the expression tests true against the
///   full path; an invalid expression is a logged non-match
/// - a trailing `*` turns everything before it into a prefix; the path
///   matches when it equals the prefix (with or without one trailing
///   slash) or extends it
/// - a trailing `/` matches the pattern itself or the pattern with the
///   slash stripped
/// - anything else is exact string equality
pub fn matches_pattern(path: &str, pattern: &str, is_regex: bool) -> bool {
    if is_regex {
        return match Regex::new(pattern) {
            Ok(regex) => regex.is_match(path),
            Err(error) => {
                tracing::warn!(pattern, %error, "invalid route regex treated as non-match");
                false
            }
        };
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        let bare = prefix.strip_suffix('/').unwrap_or(prefix);
        return path == prefix || path == bare || path.starts_with(prefix);
    }

    if let Some(bare) = pattern.strip_suffix('/') {
        return path == pattern || path == bare;
    }

    path == pattern
}

/// Suffix of `path` after the prefix of a wildcard pattern, used to
/// build the backend URL.
///
/// The root of the suffix is `/`, never the empty string, and a
/// trailing slash is stripped unless the suffix is exactly `/`.
pub fn relative_path(path: &str, pattern: &str) -> String {
    let base = pattern.trim_end_matches('*').trim_end_matches('/');
    let suffix = path.strip_prefix(base).unwrap_or(path);

    let mut relative = if suffix.starts_with('/') {
        suffix.to_string()
    } else {
        format!("/{suffix}")
    };
    if relative.len() > 1 && relative.ends_with('/') {
        relative.pop();
    }
    relative
}
