//! In-process storage backend.
//!
//! Uses a HashMap of stores behind a tokio RwLock for concurrent access.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::key::RequestKey;
use super::store::CacheStorage;
use crate::Error;
use crate::http::Response;

type Store = HashMap<RequestKey, Response>;

/// Volatile store backend, mainly for tests and ephemeral hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    stores: Arc<RwLock<HashMap<String, Store>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in `store`, zero when it does not exist.
    pub async fn len(&self, store: &str) -> usize {
        self.stores.read().await.get(store).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn open(&self, store: &str) -> Result<(), Error> {
        self.stores.write().await.entry(store.to_string()).or_default();
        Ok(())
    }

    async fn has(&self, store: &str) -> Result<bool, Error> {
        Ok(self.stores.read().await.contains_key(store))
    }

    async fn match_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let stores = self.stores.read().await;
        Ok(stores
            .get(store)
            .and_then(|entries| entries.get(key))
            .map(Response::duplicate))
    }

    async fn put(&self, store: &str, key: &RequestKey, response: Response) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        stores.entry(store.to_string()).or_default().insert(key.clone(), response);
        Ok(())
    }

    async fn delete_entry(&self, store: &str, key: &RequestKey) -> Result<bool, Error> {
        let mut stores = self.stores.write().await;
        Ok(stores
            .get_mut(store)
            .is_some_and(|entries| entries.remove(key).is_some()))
    }

    async fn delete(&self, store: &str) -> Result<bool, Error> {
        Ok(self.stores.write().await.remove(store).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.stores.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        let stores = self.stores.read().await;
        let mut keys: Vec<RequestKey> = stores
            .get(store)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(keys)
    }
}
