//! Cache/network arbitration strategies.
//!
//! ### Strategies
//! - **Cache first**: serve a stored entry, else fetch and store on 2xx.
//! - **Network first**: fetch and stamp on 2xx; on network failure serve a
//!   stored entry only while it is fresh.
//! - **Stale while revalidate**: serve a stored entry at once and refresh it
//!   in the background.
//! - **Cache with fallback TTL**: serve a fresh stored entry without touching
//!   the network, else fetch; a network failure yields 404.
//!
//! ### Failure handling
//! - Storage errors are logged and treated as a miss or a no-op write.
//! - Network errors surface only as the `Offline` (503) or
//!   `<resource> unavailable` (404) sentinels.
//! - Stored and returned responses are always independent copies.

mod cache_first;
mod fallback_ttl;
mod network_first;
mod stale_while_revalidate;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::fetch::Network;
use depot_core::ttl::{self, Clock};
use depot_core::{CacheStorage, PolicyRule, Request, RequestKey, Response, StoreName, StrategyKind};

pub use cache_first::CacheFirst;
pub use fallback_ttl::CacheWithFallbackTtl;
pub use network_first::NetworkFirst;
pub use stale_while_revalidate::StaleWhileRevalidate;

/// Where a response handed to the page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    Synthetic,
    /// Forwarded without interception.
    Passthrough,
}

/// A strategy's answer.
#[derive(Debug)]
pub struct StrategyOutcome {
    pub response: Response,
    pub source: ResponseSource,
}

impl StrategyOutcome {
    fn network(response: Response) -> Self {
        Self { response, source: ResponseSource::Network }
    }

    fn cache(response: Response) -> Self {
        Self { response, source: ResponseSource::Cache }
    }

    fn synthetic(response: Response) -> Self {
        Self { response, source: ResponseSource::Synthetic }
    }
}

/// Shared capabilities handed to every strategy.
#[derive(Clone)]
pub struct StrategyContext {
    pub storage: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub clock: Arc<dyn Clock>,
}

impl StrategyContext {
    pub fn new(storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, network, clock }
    }

    /// Stored response, treating storage errors as a miss.
    pub(crate) async fn lookup(&self, store: &StoreName, key: &RequestKey) -> Option<Response> {
        match self.storage.match_entry(&store.to_string(), key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(store = %store, key = %key, error = %e, "cache match failed");
                None
            }
        }
    }

    /// Stored response that is still within `max_age` of its stamp.
    pub(crate) async fn lookup_fresh(&self, store: &StoreName, key: &RequestKey, max_age: Duration) -> Option<Response> {
        let hit = self.lookup(store, key).await?;
        if ttl::is_fresh(&hit, max_age, self.clock.now_millis()) {
            Some(hit)
        } else {
            tracing::debug!(store = %store, key = %key, "cached entry expired");
            None
        }
    }

    /// Write a copy of `response`, logging and swallowing storage errors.
    pub(crate) async fn persist(&self, store: &StoreName, key: &RequestKey, response: &Response) {
        if let Err(e) = self.storage.put(&store.to_string(), key, response.duplicate()).await {
            tracing::warn!(store = %store, key = %key, error = %e, "cache put failed");
        }
    }

    /// Write a stamped copy of `response` for TTL-bound classes.
    pub(crate) async fn persist_stamped(&self, store: &StoreName, key: &RequestKey, response: &Response) {
        let stamped = ttl::stamp_now(response, self.clock.now_millis());
        if let Err(e) = self.storage.put(&store.to_string(), key, stamped).await {
            tracing::warn!(store = %store, key = %key, error = %e, "cache put failed");
        }
    }
}

/// One cache/network arbitration policy.
///
/// Implementations are stateless and safe to run concurrently for the same
/// key; concurrent writers race benignly and the last write wins.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn respond(&self, ctx: &StrategyContext, request: &Request, rule: &PolicyRule) -> StrategyOutcome;
}

/// The implementation for a policy's strategy kind.
pub fn strategy_for(kind: StrategyKind) -> &'static dyn Strategy {
    match kind {
        StrategyKind::CacheFirst => &CacheFirst,
        StrategyKind::NetworkFirst => &NetworkFirst,
        StrategyKind::StaleWhileRevalidate => &StaleWhileRevalidate,
        StrategyKind::CacheWithFallbackTtl => &CacheWithFallbackTtl,
    }
}
