use async_trait::async_trait;

use super::{Strategy, StrategyContext, StrategyOutcome};
use depot_core::{PolicyRule, Request, RequestKey, Response, StrategyKind};

/// Prefer the network; fall back to a fresh stored entry on failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkFirst;

#[async_trait]
impl Strategy for NetworkFirst {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NetworkFirst
    }

    async fn respond(&self, ctx: &StrategyContext, request: &Request, rule: &PolicyRule) -> StrategyOutcome {
        let key = RequestKey::for_request(request);

        let error = match ctx.network.fetch(request).await {
            Ok(response) => {
                if rule.admits(&response) {
                    ctx.persist_stamped(&rule.store, &key, &response).await;
                }
                return StrategyOutcome::network(response);
            }
            Err(e) => e,
        };

        tracing::warn!(key = %key, error = %error, "network failed, trying store");

        let Some(max_age) = rule.max_age else {
            return StrategyOutcome::synthetic(Response::offline());
        };

        match ctx.lookup_fresh(&rule.store, &key, max_age).await {
            Some(hit) => StrategyOutcome::cache(hit),
            None => StrategyOutcome::synthetic(Response::offline()),
        }
    }
}
