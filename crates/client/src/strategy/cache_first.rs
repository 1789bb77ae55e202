use async_trait::async_trait;

use super::{Strategy, StrategyContext, StrategyOutcome};
use depot_core::{PolicyRule, Request, RequestKey, Response, StrategyKind};

/// Serve from the target store, falling back to the network on a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheFirst;

#[async_trait]
impl Strategy for CacheFirst {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CacheFirst
    }

    async fn respond(&self, ctx: &StrategyContext, request: &Request, rule: &PolicyRule) -> StrategyOutcome {
        let key = RequestKey::for_request(request);

        if let Some(hit) = ctx.lookup(&rule.store, &key).await {
            tracing::debug!(store = %rule.store, key = %key, "cache hit");
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
                tracing::warn!(key = %key, error = %e, "network failed on cache miss");
                StrategyOutcome::synthetic(Response::offline())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::ResponseSource;
    use super::super::testing::*;
    use super::*;
    use depot_core::{CacheStorage, Headers, StoreRole};

    const URL: &str = "https://shop.example/assets/index.css";

    #[tokio::test]
    async fn test_second_call_served_from_store() {
        let fx = fixture();
        fx.network.respond(URL, 200, "body{}");
        let rule = rule(StrategyKind::CacheFirst, StoreRole::Static, None);

        let first = CacheFirst.respond(&fx.ctx, &get(URL), &rule).await;
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(first.response.body().as_ref(), b"body{}");
        assert_eq!(fx.storage.len("static-v1").await, 1);

        let second = CacheFirst.respond(&fx.ctx, &get(URL), &rule).await;
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.status, 200);
        assert_eq!(second.response.body().as_ref(), b"body{}");

        assert_eq!(fx.network.calls_for(URL), 1);
        assert_eq!(fx.storage.len("static-v1").await, 1);
    }

    #[tokio::test]
    async fn test_non_ok_not_stored() {
        let fx = fixture();
        fx.network.respond(URL, 500, "boom");
        let rule = rule(StrategyKind::CacheFirst, StoreRole::Static, None);

        let outcome = CacheFirst.respond(&fx.ctx, &get(URL), &rule).await;
        assert_eq!(outcome.response.status, 500);
        assert_eq!(fx.storage.len("static-v1").await, 0);
    }

    #[tokio::test]
    async fn test_network_failure_on_miss_is_offline() {
        let fx = fixture();
        fx.network.fail(URL);
        let rule = rule(StrategyKind::CacheFirst, StoreRole::Static, None);

        let outcome = CacheFirst.respond(&fx.ctx, &get(URL), &rule).await;
        assert_eq!(outcome.source, ResponseSource::Synthetic);
        assert_eq!(outcome.response.status, 503);
        assert_eq!(outcome.response.body().as_ref(), b"Offline");
    }

    #[tokio::test]
    async fn test_only_target_store_consulted() {
        let fx = fixture();
        let key = RequestKey::for_request(&get(URL));
        fx.storage
            .put("dynamic-v1", &key, Response::text(200, "OK", "elsewhere"))
            .await
            .unwrap();
        fx.network.respond(URL, 200, "fresh");
        let rule = rule(StrategyKind::CacheFirst, StoreRole::Static, None);

        let outcome = CacheFirst.respond(&fx.ctx, &get(URL), &rule).await;
        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.body().as_ref(), b"fresh");
    }

    #[tokio::test]
    async fn test_concurrent_misses_leave_one_entry() {
        let fx = fixture();
        fx.network.respond(URL, 200, "body{}");
        let rule = rule(StrategyKind::CacheFirst, StoreRole::Static, None);

        let (req_a, req_b) = (get(URL), get(URL));
        let (a, b) = tokio::join!(
            CacheFirst.respond(&fx.ctx, &req_a, &rule),
            CacheFirst.respond(&fx.ctx, &req_b, &rule),
        );
        assert_eq!(a.response.status, 200);
        assert_eq!(b.response.status, 200);
        assert_eq!(fx.storage.len("static-v1").await, 1);

        let key = RequestKey::for_request(&get(URL));
        let stored = fx.storage.match_entry("static-v1", &key).await.unwrap().unwrap();
        assert_eq!(stored.body().as_ref(), b"body{}");
    }

    #[tokio::test]
    async fn test_script_stored_only_with_javascript_content_type() {
        const SCRIPT: &str = "https://shop.example/node_modules/.vite/deps/react.js";
        let fx = fixture();
        let rule = PolicyRule {
            require_content_type: Some("javascript".into()),
            ..rule(StrategyKind::CacheFirst, StoreRole::Js, None)
        };

        let mut html = Headers::new();
        html.set("Content-Type", "text/html; charset=utf-8");
        fx.network
            .respond_with_headers(SCRIPT, 200, html, "<!doctype html>");

        let outcome = CacheFirst.respond(&fx.ctx, &get(SCRIPT), &rule).await;
        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.body().as_ref(), b"<!doctype html>");
        assert_eq!(fx.storage.len("js-v1").await, 0);

        let mut js = Headers::new();
        js.set("Content-Type", "text/javascript");
        fx.network.respond_with_headers(SCRIPT, 200, js, "export {}");

        CacheFirst.respond(&fx.ctx, &get(SCRIPT), &rule).await;
        let cached = CacheFirst.respond(&fx.ctx, &get(SCRIPT), &rule).await;
        assert_eq!(cached.source, ResponseSource::Cache);
        assert_eq!(cached.response.body().as_ref(), b"export {}");
        assert_eq!(fx.network.calls_for(SCRIPT), 2);
    }
}
