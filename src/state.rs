//! Shared application state.

use crate::config::Config;
use crate::services::credits::CreditLedger;
use crate::services::targets::TargetTable;
use crate::services::usage::UsageTracker;
use crate::services::validator::KeyValidator;
use crate::store::KeyStore;
use std::sync::Arc;
use std::time::Duration;

/// Everything handlers need, cloned cheaply per request.
///
/// The services share one store handle; the HTTP client is reused for
/// all outbound backend fetches and carries the upstream timeout and a
/// no-redirect policy (the gateway relays 3xx responses instead of
/// following them).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn KeyStore>,
    pub validator: Arc<KeyValidator>,
    pub targets: Arc<TargetTable>,
    pub ledger: Arc<CreditLedger>,
    pub usage: Arc<UsageTracker>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn KeyStore>,
        targets: TargetTable,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let usage = Arc::new(UsageTracker::new(Arc::clone(&store), config.usage_ttl_days));
        let validator = Arc::new(KeyValidator::new(
            Arc::clone(&store),
            Arc::clone(&usage),
            Duration::from_secs(config.key_cache_ttl_secs),
        ));
        let ledger = Arc::new(CreditLedger::new(Arc::clone(&store)));

        Ok(Self {
            config: Arc::new(config),
            store,
            validator,
            targets: Arc::new(targets),
            ledger,
            usage,
            http,
        })
    }
}
