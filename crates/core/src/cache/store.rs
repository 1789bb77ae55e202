//! Cache store abstraction.
//!
//! A storage backend holds any number of named stores, each mapping
//! request keys to response snapshots. Entries are replaced wholesale,
//! never patched, and are only reachable while their store exists.

use async_trait::async_trait;

use super::key::RequestKey;
use crate::Error;
use crate::http::Response;

/// Named, versioned request→response stores.
///
/// Implementations must tolerate concurrent callers. Two writers racing on
/// the same key both succeed and the last write wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Backend name for tracing (e.g. "memory", "sqlite").
    fn name(&self) -> &'static str;

    /// Create the store if it does not exist yet.
    async fn open(&self, store: &str) -> Result<(), Error>;

    async fn has(&self, store: &str) -> Result<bool, Error>;

    /// Stored response for `key`, or `None` on a miss or a missing store.
    async fn match_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Store `response` under `key`, creating the store when needed and
    /// replacing any previous entry.
    async fn put(&self, store: &str, key: &RequestKey, response: Response) -> Result<(), Error>;

    /// Remove one entry. Returns whether an entry was removed.
    async fn delete_entry(&self, store: &str, key: &RequestKey) -> Result<bool, Error>;

    /// Remove a store and every entry in it. Returns whether it existed.
    async fn delete(&self, store: &str) -> Result<bool, Error>;

    /// Names of every existing store, sorted.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Keys of every entry in `store`.
    async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error>;
}
