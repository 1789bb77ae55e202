//! Install-time warm-up and activate-time reclamation.
//!
//! ### States
//! `Parsed -> Installing -> (Waiting ->) Activating -> Active`
//!
//! ### Install
//! - Fetch every critical manifest entry into the static store and every
//!   font manifest entry into the fonts store.
//! - Entries settle independently: a failure or non-2xx response is logged
//!   and counted, never fatal to the rest.
//! - With `skip_waiting` the manager proceeds straight to activation,
//!   otherwise it parks in `Waiting`.
//!
//! ### Activate
//! - Delete every store name outside the current generation's declared set.
//! - A failed delete is retried once, then logged and reported.
//! - Claim open clients and enter `Active`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::Network;
use depot_core::{CacheSettings, CacheStorage, Request, RequestKey, StoreName, StoreRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Parsed,
    Installing,
    Waiting,
    Activating,
    Active,
}

/// One manifest entry that did not make it into its store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarmFailure {
    pub url: String,
    pub store: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    /// URLs stored during warm-up.
    pub cached: Vec<String>,
    pub failed: Vec<WarmFailure>,
    /// Present when installation continued straight into activation.
    pub activated: Option<ActivationReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    pub retained: Vec<String>,
    pub failed: Vec<String>,
}

/// Drives one controller generation through install and activate.
pub struct Lifecycle {
    settings: Arc<CacheSettings>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: RwLock<LifecycleState>,
    clients_claimed: AtomicBool,
}

impl Lifecycle {
    pub fn new(settings: Arc<CacheSettings>, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            settings,
            storage,
            network,
            state: RwLock::new(LifecycleState::Parsed),
            clients_claimed: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// Whether activation has taken control of already-open clients.
    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    fn transition(&self, next: LifecycleState) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!(from = ?*state, to = ?next, generation = %self.settings.generation, "lifecycle transition");
        *state = next;
    }

    /// Warm the static and fonts stores, then activate when skip-waiting
    /// is enabled.
    pub async fn install(&self) -> InstallReport {
        self.transition(LifecycleState::Installing);

        let generation = &self.settings.generation;
        let static_store = StoreName::new(StoreRole::Static, generation.as_str());
        let fonts_store = StoreName::new(StoreRole::Fonts, generation.as_str());

        for store in [&static_store, &fonts_store] {
            if let Err(e) = self.storage.open(&store.to_string()).await {
                tracing::warn!(store = %store, error = %e, "failed to open store");
            }
        }

        let jobs = self
            .settings
            .critical_manifest
            .iter()
            .map(|url| (url, &static_store))
            .chain(self.settings.font_manifest.iter().map(|url| (url, &fonts_store)))
            .map(|(url, store)| self.warm(url, store));

        let mut report = InstallReport::default();
        for result in join_all(jobs).await {
            match result {
                Ok(url) => report.cached.push(url),
                Err(failure) => report.failed.push(failure),
            }
        }

        tracing::info!(
            cached = report.cached.len(),
            failed = report.failed.len(),
            "install warm-up settled"
        );

        if self.settings.skip_waiting {
            report.activated = Some(self.activate().await);
        } else {
            self.transition(LifecycleState::Waiting);
        }

        report
    }

    async fn warm(&self, url: &Url, store: &StoreName) -> Result<String, WarmFailure> {
        let failure = |reason: String| WarmFailure { url: url.to_string(), store: store.to_string(), reason };

        let request = Request::get(url.clone());
        let response = self.network.fetch(&request).await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "warm-up fetch failed");
            failure(e.to_string())
        })?;

        if !response.ok() {
            tracing::warn!(url = %url, status = response.status, "warm-up got non-2xx response");
            return Err(failure(format!("status {}", response.status)));
        }

        let key = RequestKey::for_request(&request);
        self.storage
            .put(&store.to_string(), &key, response)
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, store = %store, error = %e, "warm-up put failed");
                failure(e.to_string())
            })?;

        Ok(url.to_string())
    }

    /// Reclaim stale stores, claim clients and enter `Active`.
    pub async fn activate(&self) -> ActivationReport {
        self.transition(LifecycleState::Activating);

        let plan = self.plan_reclaim().await;
        let mut report = ActivationReport { retained: plan.retained, ..Default::default() };

        for name in plan.deleted {
            if self.delete_with_retry(&name).await {
                report.deleted.push(name);
            } else {
                report.failed.push(name);
            }
        }

        self.clients_claimed.store(true, Ordering::SeqCst);
        self.transition(LifecycleState::Active);

        tracing::info!(
            deleted = report.deleted.len(),
            retained = report.retained.len(),
            failed = report.failed.len(),
            "activated"
        );

        report
    }

    async fn delete_with_retry(&self, name: &str) -> bool {
        for attempt in 1..=2 {
            match self.storage.delete(name).await {
                Ok(_) => return true,
                Err(e) => tracing::warn!(store = name, attempt, error = %e, "store delete failed"),
            }
        }
        false
    }

    /// What activation would delete and retain, without deleting anything.
    pub async fn plan_reclaim(&self) -> ActivationReport {
        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "failed to enumerate stores");
                Vec::new()
            }
        };

        let mut plan = ActivationReport::default();
        for name in names {
            if self.is_reclaimable(&name) {
                plan.deleted.push(name);
            } else {
                plan.retained.push(name);
            }
        }
        plan
    }

    fn is_reclaimable(&self, name: &str) -> bool {
        if self.settings.is_declared(name) {
            return false;
        }
        self.settings.reclaim_foreign_stores || StoreName::parse(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockNetwork;
    use async_trait::async_trait;
    use depot_core::{AppConfig, Error, MemoryStorage, Response};
    use std::sync::atomic::AtomicUsize;

    fn settings(config: AppConfig) -> Arc<CacheSettings> {
        Arc::new(CacheSettings::from_config(&config).unwrap())
    }

    fn config(generation: &str) -> AppConfig {
        AppConfig {
            generation: generation.into(),
            origin: "https://shop.example".into(),
            critical_manifest: vec!["/".into(), "/src/main.tsx".into(), "/manifest.json".into()],
            font_manifest: vec!["https://fonts.gstatic.com/s/inter/v12/a.woff2".into()],
            ..Default::default()
        }
    }

    async fn seed(storage: &MemoryStorage, names: &[&str]) {
        for name in names {
            storage.open(name).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_activate_reclaims_old_generations() {
        let storage = Arc::new(MemoryStorage::new());
        seed(&storage, &["static-v1", "static-v2", "fonts-v1"]).await;
        let lifecycle = Lifecycle::new(settings(config("v2")), storage.clone(), Arc::new(MockNetwork::new()));

        let report = lifecycle.activate().await;

        assert_eq!(report.deleted, vec!["fonts-v1".to_string(), "static-v1".to_string()]);
        assert_eq!(report.retained, vec!["static-v2".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(storage.keys().await.unwrap(), vec!["static-v2".to_string()]);
        assert!(lifecycle.is_active());
        assert!(lifecycle.clients_claimed());
    }

    #[tokio::test]
    async fn test_foreign_stores_kept_when_reclaim_disabled() {
        let storage = Arc::new(MemoryStorage::new());
        seed(&storage, &["static-v1", "workbox-precache", "static-v2"]).await;
        let cfg = AppConfig { reclaim_foreign_stores: false, ..config("v2") };
        let lifecycle = Lifecycle::new(settings(cfg), storage.clone(), Arc::new(MockNetwork::new()));

        let report = lifecycle.activate().await;
        assert_eq!(report.deleted, vec!["static-v1".to_string()]);
        assert!(report.retained.contains(&"workbox-precache".to_string()));
    }

    #[tokio::test]
    async fn test_plan_reclaim_deletes_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        seed(&storage, &["static-v1", "dynamic-v2"]).await;
        let lifecycle = Lifecycle::new(settings(config("v2")), storage.clone(), Arc::new(MockNetwork::new()));

        let plan = lifecycle.plan_reclaim().await;
        assert_eq!(plan.deleted, vec!["static-v1".to_string()]);
        assert_eq!(storage.keys().await.unwrap().len(), 2);
        assert_eq!(lifecycle.state(), LifecycleState::Parsed);
    }

    #[tokio::test]
    async fn test_install_settles_all_entries() {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(MockNetwork::new());
        network
            .respond("https://shop.example/", 200, "<html>")
            .fail("https://shop.example/src/main.tsx")
            .respond("https://fonts.gstatic.com/s/inter/v12/a.woff2", 200, "font");
        // /manifest.json is unrouted and answers 404

        let lifecycle = Lifecycle::new(settings(config("v2")), storage.clone(), network.clone());
        let report = lifecycle.install().await;

        assert_eq!(report.cached.len(), 2);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(storage.len("static-v2").await, 1);
        assert_eq!(storage.len("fonts-v2").await, 1);
        assert_eq!(network.calls(), 4);
        assert!(report.activated.is_some());
        assert!(lifecycle.is_active());
    }

    #[tokio::test]
    async fn test_install_waits_without_skip_waiting() {
        let storage = Arc::new(MemoryStorage::new());
        let cfg = AppConfig { skip_waiting: false, ..config("v2") };
        let lifecycle = Lifecycle::new(settings(cfg), storage, Arc::new(MockNetwork::new()));

        let report = lifecycle.install().await;
        assert!(report.activated.is_none());
        assert_eq!(lifecycle.state(), LifecycleState::Waiting);
        assert!(!lifecycle.clients_claimed());
    }

    /// Store whose first delete of every name fails.
    struct FlakyDelete {
        inner: MemoryStorage,
        failures: AtomicUsize,
        fail_always: bool,
    }

    #[async_trait]
    impl CacheStorage for FlakyDelete {
        fn name(&self) -> &'static str {
            "flaky"
        }
        async fn open(&self, store: &str) -> Result<(), Error> {
            self.inner.open(store).await
        }
        async fn has(&self, store: &str) -> Result<bool, Error> {
            self.inner.has(store).await
        }
        async fn match_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
            self.inner.match_entry(store, key).await
        }
        async fn put(&self, store: &str, key: &RequestKey, response: Response) -> Result<(), Error> {
            self.inner.put(store, key, response).await
        }
        async fn delete_entry(&self, store: &str, key: &RequestKey) -> Result<bool, Error> {
            self.inner.delete_entry(store, key).await
        }
        async fn delete(&self, store: &str) -> Result<bool, Error> {
            let n = self.failures.fetch_add(1, Ordering::SeqCst);
            if self.fail_always || n == 0 {
                return Err(Error::StoreNotFound(format!("locked: {store}")));
            }
            self.inner.delete(store).await
        }
        async fn keys(&self) -> Result<Vec<String>, Error> {
            self.inner.keys().await
        }
        async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
            self.inner.entry_keys(store).await
        }
    }

    #[tokio::test]
    async fn test_failed_delete_retried_once() {
        let inner = MemoryStorage::new();
        seed(&inner, &["static-v1"]).await;
        let storage = Arc::new(FlakyDelete { inner, failures: AtomicUsize::new(0), fail_always: false });
        let lifecycle = Lifecycle::new(settings(config("v2")), storage.clone(), Arc::new(MockNetwork::new()));

        let report = lifecycle.activate().await;
        assert_eq!(report.deleted, vec!["static-v1".to_string()]);
        assert_eq!(storage.failures.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persistent_delete_failure_reported() {
        let inner = MemoryStorage::new();
        seed(&inner, &["static-v1"]).await;
        let storage = Arc::new(FlakyDelete { inner, failures: AtomicUsize::new(0), fail_always: true });
        let lifecycle = Lifecycle::new(settings(config("v2")), storage.clone(), Arc::new(MockNetwork::new()));

        let report = lifecycle.activate().await;
        assert_eq!(report.failed, vec!["static-v1".to_string()]);
        assert_eq!(storage.failures.load(Ordering::SeqCst), 2);
        assert!(lifecycle.is_active());
    }
}
