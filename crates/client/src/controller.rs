//! The fetch event handler.
//!
//! Every request is classified first. Requests the policy table has no rule
//! for, and every request before activation, go straight to the network
//! with no cache reads, writes or deletes.

use std::sync::Arc;

use crate::fetch::{Network, is_same_origin};
use crate::lifecycle::{InstallReport, Lifecycle};
use crate::strategy::{ResponseSource, StrategyContext, strategy_for};
use depot_core::{CacheSettings, CacheStorage, Clock, Error, Request, ResourceClass, Response, SystemClock};

/// A handled fetch: the response plus how it was produced.
#[derive(Debug)]
pub struct Handled {
    pub class: ResourceClass,
    pub source: ResponseSource,
    pub response: Response,
}

pub struct Controller {
    settings: Arc<CacheSettings>,
    ctx: StrategyContext,
    lifecycle: Lifecycle,
}

impl Controller {
    pub fn new(settings: CacheSettings, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self::with_clock(settings, storage, network, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: CacheSettings, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = Arc::new(settings);
        let lifecycle = Lifecycle::new(settings.clone(), storage.clone(), network.clone());
        let ctx = StrategyContext::new(storage, network, clock);
        Self { settings, ctx, lifecycle }
    }

    /// Install, and activate when skip-waiting is enabled.
    pub async fn start(&self) -> InstallReport {
        self.lifecycle.install().await
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.ctx.storage
    }

    pub fn classify(&self, request: &Request) -> ResourceClass {
        self.settings.classifier.classify(request)
    }

    /// Answer one intercepted request.
    ///
    /// # Errors
    ///
    /// Only pass-through requests can fail, with the network's own error.
    /// Intercepted requests always resolve to a response.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Handled, Error> {
        let class = self.classify(request);

        let rule = if self.lifecycle.is_active() { self.settings.policy.rule_for(class) } else { None };

        let Some(rule) = rule else {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                class = class.as_str(),
                "passing through"
            );
            let response = self.ctx.network.fetch(request).await?;
            return Ok(Handled { class, source: ResponseSource::Passthrough, response });
        };

        let outcome = strategy_for(rule.strategy).respond(&self.ctx, request, rule).await;

        tracing::debug!(
            url = %request.url,
            class = class.as_str(),
            strategy = ?rule.strategy,
            store = %rule.store,
            same_origin = is_same_origin(&self.settings.origin, &request.url),
            source = ?outcome.source,
            status = outcome.response.status,
            "handled fetch"
        );

        Ok(Handled { class, source: outcome.source, response: outcome.response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockNetwork;
    use async_trait::async_trait;
    use depot_core::{AppConfig, ManualClock, MemoryStorage, RequestKey};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    /// Storage wrapper counting every read and write.
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        touches: AtomicUsize,
    }

    impl CountingStorage {
        fn touches(&self) -> usize {
            self.touches.load(Ordering::SeqCst)
        }

        fn touch(&self) {
            self.touches.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CacheStorage for CountingStorage {
        fn name(&self) -> &'static str {
            "counting"
        }
        async fn open(&self, store: &str) -> Result<(), Error> {
            self.inner.open(store).await
        }
        async fn has(&self, store: &str) -> Result<bool, Error> {
            self.inner.has(store).await
        }
        async fn match_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
            self.touch();
            self.inner.match_entry(store, key).await
        }
        async fn put(&self, store: &str, key: &RequestKey, response: Response) -> Result<(), Error> {
            self.touch();
            self.inner.put(store, key, response).await
        }
        async fn delete_entry(&self, store: &str, key: &RequestKey) -> Result<bool, Error> {
            self.touch();
            self.inner.delete_entry(store, key).await
        }
        async fn delete(&self, store: &str) -> Result<bool, Error> {
            self.touch();
            self.inner.delete(store).await
        }
        async fn keys(&self) -> Result<Vec<String>, Error> {
            self.inner.keys().await
        }
        async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
            self.inner.entry_keys(store).await
        }
    }

    struct Harness {
        controller: Controller,
        storage: Arc<CountingStorage>,
        network: Arc<MockNetwork>,
    }

    async fn active() -> Harness {
        let config = AppConfig {
            origin: "https://shop.example".into(),
            critical_manifest: Vec::new(),
            font_manifest: Vec::new(),
            ..Default::default()
        };
        let settings = CacheSettings::from_config(&config).unwrap();
        let storage = Arc::new(CountingStorage::default());
        let network = Arc::new(MockNetwork::new());
        let controller = Controller::with_clock(
            settings,
            storage.clone(),
            network.clone(),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        );
        controller.start().await;
        assert!(controller.lifecycle().is_active());
        Harness { controller, storage, network }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_non_get_passes_through_untouched() {
        let h = active().await;
        h.network.respond("https://shop.example/api/orders", 201, "created");
        let before = h.storage.touches();

        let request = Request::new("POST", url("https://shop.example/api/orders"));
        let handled = h.controller.handle_fetch(&request).await.unwrap();

        let bare = h.network.fetch(&request).await.unwrap();
        assert_eq!(handled.response, bare);
        assert_eq!(handled.source, ResponseSource::Passthrough);
        assert_eq!(handled.class, ResourceClass::Uncacheable);
        assert_eq!(h.storage.touches(), before);
    }

    #[tokio::test]
    async fn test_dynamic_pages_never_touch_cache() {
        let h = active().await;
        let before = h.storage.touches();

        let detail = Request::get(url("https://shop.example/vehiculos/seat-ibiza-123"));
        let root_html = Request::get(url("https://shop.example/")).with_header("Accept", "text/html,*/*");
        let api_html = Request::get(url("https://shop.example/api/parts")).with_header("accept", "text/html");

        for request in [detail, root_html, api_html] {
            let handled = h.controller.handle_fetch(&request).await.unwrap();
            assert_eq!(handled.class, ResourceClass::DynamicPage);
            assert_eq!(handled.source, ResponseSource::Passthrough);
        }
        assert_eq!(h.storage.touches(), before);
    }

    #[tokio::test]
    async fn test_passthrough_error_surfaces_unchanged() {
        let h = active().await;
        h.network.fail("https://shop.example/piezas/42");

        let result = h
            .controller
            .handle_fetch(&Request::get(url("https://shop.example/piezas/42")))
            .await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_api_request_uses_network_first() {
        let h = active().await;
        h.network.respond("https://shop.example/api/vehicles", 200, "[]");

        let request = Request::get(url("https://shop.example/api/vehicles"));
        let handled = h.controller.handle_fetch(&request).await.unwrap();
        assert_eq!(handled.class, ResourceClass::ApiDynamic);
        assert_eq!(handled.source, ResponseSource::Network);

        h.network.set_offline(true);
        let offline = h.controller.handle_fetch(&request).await.unwrap();
        assert_eq!(offline.source, ResponseSource::Cache);
        assert_eq!(offline.response.body().as_ref(), b"[]");
    }

    #[tokio::test]
    async fn test_cdn_media_offline_is_image_unavailable() {
        let h = active().await;
        h.network.set_offline(true);

        let request = Request::get(url("https://cdn11.metasync.com/img/9.jpg"));
        let handled = h.controller.handle_fetch(&request).await.unwrap();
        assert_eq!(handled.class, ResourceClass::CdnMedia);
        assert_eq!(handled.response.status, 404);
        assert_eq!(handled.response.body().as_ref(), b"Image unavailable");
    }

    #[tokio::test]
    async fn test_no_interception_before_activation() {
        let config = AppConfig {
            origin: "https://shop.example".into(),
            critical_manifest: Vec::new(),
            font_manifest: Vec::new(),
            skip_waiting: false,
            ..Default::default()
        };
        let storage = Arc::new(CountingStorage::default());
        let network = Arc::new(MockNetwork::new());
        network.respond("https://shop.example/src/main.tsx", 200, "code");
        let controller =
            Controller::new(CacheSettings::from_config(&config).unwrap(), storage.clone(), network.clone());
        controller.start().await;

        let handled = controller
            .handle_fetch(&Request::get(url("https://shop.example/src/main.tsx")))
            .await
            .unwrap();
        assert_eq!(handled.class, ResourceClass::CriticalStatic);
        assert_eq!(handled.source, ResponseSource::Passthrough);
        assert_eq!(storage.touches(), 0);

        controller.lifecycle().activate().await;
        let handled = controller
            .handle_fetch(&Request::get(url("https://shop.example/src/main.tsx")))
            .await
            .unwrap();
        assert_eq!(handled.source, ResponseSource::Network);
        assert!(storage.touches() > 0);
    }
}
