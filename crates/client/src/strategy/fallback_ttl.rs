use async_trait::async_trait;

use super::{Strategy, StrategyContext, StrategyOutcome};
use depot_core::{PolicyRule, Request, RequestKey, Response, StrategyKind};

/// Serve a fresh stored entry without touching the network; otherwise
/// fetch, and answer `<label> unavailable` (404) when that fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheWithFallbackTtl;

#[async_trait]
impl Strategy for CacheWithFallbackTtl {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CacheWithFallbackTtl
    }

    async fn respond(&self, ctx: &StrategyContext, request: &Request, rule: &PolicyRule) -> StrategyOutcome {
        let key = RequestKey::for_request(request);

        if let Some(max_age) = rule.max_age
            && let Some(hit) = ctx.lookup_fresh(&rule.store, &key, max_age).await
        {
            tracing::debug!(store = %rule.store, key = %key, "fresh cache hit");
            return StrategyOutcome::cache(hit);
        }

        match ctx.network.fetch(request).await {
            Ok(response) => {
                if rule.admits(&response) {
                    ctx.persist_stamped(&rule.store, &key, &response).await;
                }
                StrategyOutcome::network(response)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, resource = %rule.label, "network failed, resource unavailable");
                StrategyOutcome::synthetic(Response::unavailable(&rule.label))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::ResponseSource;
    use super::super::testing::*;
    use super::*;
    use depot_core::StoreRole;

    const URL: &str = "https://cdn11.metasync.com/vehicles/123/front.jpg";
    const DAY: u64 = 86_400_000;

    #[tokio::test]
    async fn test_fresh_hit_skips_network() {
        let fx = fixture();
        let rule = rule(StrategyKind::CacheWithFallbackTtl, StoreRole::Dynamic, Some(DAY));
        fx.network.respond(URL, 200, "jpeg");

        CacheWithFallbackTtl.respond(&fx.ctx, &get(URL), &rule).await;
        fx.clock.set(T0 + DAY as i64);
        let outcome = CacheWithFallbackTtl.respond(&fx.ctx, &get(URL), &rule).await;

        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(fx.network.calls_for(URL), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetched() {
        let fx = fixture();
        let rule = rule(StrategyKind::CacheWithFallbackTtl, StoreRole::Dynamic, Some(DAY));
        fx.network.respond(URL, 200, "old");
        CacheWithFallbackTtl.respond(&fx.ctx, &get(URL), &rule).await;

        fx.clock.set(T0 + DAY as i64 + 1);
        fx.network.respond(URL, 200, "new");
        let outcome = CacheWithFallbackTtl.respond(&fx.ctx, &get(URL), &rule).await;

        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.body().as_ref(), b"new");
        assert_eq!(fx.network.calls_for(URL), 2);
    }

    #[tokio::test]
    async fn test_failure_without_entry_is_unavailable() {
        let fx = fixture();
        let rule = rule(StrategyKind::CacheWithFallbackTtl, StoreRole::Dynamic, Some(DAY));
        fx.network.fail(URL);

        let outcome = CacheWithFallbackTtl.respond(&fx.ctx, &get(URL), &rule).await;
        assert_eq!(outcome.source, ResponseSource::Synthetic);
        assert_eq!(outcome.response.status, 404);
        assert_ne!(outcome.response.status, Response::offline().status);
        assert_eq!(outcome.response.body().as_ref(), b"Image unavailable");
    }

    #[tokio::test]
    async fn test_failure_with_expired_entry_is_unavailable() {
        let fx = fixture();
        let rule = rule(StrategyKind::CacheWithFallbackTtl, StoreRole::Dynamic, Some(DAY));
        fx.network.respond(URL, 200, "old");
        CacheWithFallbackTtl.respond(&fx.ctx, &get(URL), &rule).await;

        fx.clock.set(T0 + 2 * DAY as i64);
        fx.network.fail(URL);
        let outcome = CacheWithFallbackTtl.respond(&fx.ctx, &get(URL), &rule).await;
        assert_eq!(outcome.response.status, 404);
    }
}
