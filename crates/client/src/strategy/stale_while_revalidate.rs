use async_trait::async_trait;

use super::{Strategy, StrategyContext, StrategyOutcome};
use depot_core::{PolicyRule, Request, RequestKey, Response, StrategyKind};

/// Serve the stored entry immediately and refresh it in the background.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaleWhileRevalidate;

#[async_trait]
impl Strategy for StaleWhileRevalidate {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StaleWhileRevalidate
    }

    async fn respond(&self, ctx: &StrategyContext, request: &Request, rule: &PolicyRule) -> StrategyOutcome {
        let key = RequestKey::for_request(request);

        if let Some(hit) = ctx.lookup(&rule.store, &key).await {
            tracing::debug!(store = %rule.store, key = %key, "serving stored entry, revalidating");
            revalidate(ctx.clone(), request.clone(), rule.clone(), key);
            return StrategyOutcome::cache(hit);
        }

        match ctx.network.fetch(request).await {
            Ok(response) => {
                if rule.admits(&response) {
                    ctx.persist(&rule.store, &key, &response).await;
                }
                StrategyOutcome::network(response)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "network failed with nothing stored");
                StrategyOutcome::synthetic(Response::offline())
            }
        }
    }
}

/// Detached refresh. Always resolves; failures are only logged.
fn revalidate(ctx: StrategyContext, request: Request, rule: PolicyRule, key: RequestKey) {
    tokio::spawn(async move {
        let store = &rule.store;
        match ctx.network.fetch(&request).await {
            Ok(response) if rule.admits(&response) => {
                ctx.persist(store, &key, &response).await;
                tracing::debug!(store = %store, key = %key, "revalidated");
            }
            Ok(response) => {
                tracing::debug!(store = %store, key = %key, status = response.status, "revalidation kept stored entry");
            }
            Err(e) => {
                tracing::warn!(store = %store, key = %key, error = %e, "revalidation failed");
            }
        }
    });
}
