//! cache_get tool implementation.
//!
//! Reads one stored entry without going through a strategy.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::require_store;
use crate::error::ToolError;
use depot_client::{Controller, fetch::resolve};
use depot_core::{Error, RequestKey, ttl};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Store name, e.g. "static-v1.4".
    pub store: String,

    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method of the stored request (default: GET).
    #[serde(default = "crate::tools::default_method")]
    pub method: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    /// SHA-256 digest of the request key.
    pub key: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// Store time as RFC 3339, when the entry carries a stamp.
    pub stored_at: Option<String>,
    pub bytes: usize,
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(controller: &Controller, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let store = require_store(&params.store)?;
    let url = resolve(&controller.settings().origin, &params.url).map_err(ToolError::from)?;
    let key = RequestKey::new(&params.method, &url);

    let storage = controller.storage();
    if !storage.has(store).await? {
        return Err(Error::StoreNotFound(store.to_string()).into());
    }

    let response = storage
        .match_entry(store, &key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let output = CacheGetOutput {
        store: store.to_string(),
        key: key.digest(),
        url: url.to_string(),
        status: response.status,
        status_text: response.status_text.clone(),
        headers: response
            .headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        stored_at: ttl::stored_at(&response)
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|at| at.to_rfc3339()),
        bytes: response.body().len(),
        body: String::from_utf8_lossy(response.body()).into_owned(),
    };

    super::super::json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::super::super::testing::*;
    use super::*;
    use depot_client::MockNetwork;
    use depot_core::{CacheStorage, MemoryStorage, Response};
    use rmcp::model::ErrorCode;
    use std::sync::Arc;
    use url::Url;

    fn params(store: &str, url: &str) -> CacheGetParams {
        CacheGetParams { store: store.into(), url: url.into(), method: "GET".into() }
    }

    #[tokio::test]
    async fn test_get_impl_missing_store() {
        let controller = controller(Arc::new(MockNetwork::new()), Arc::new(MemoryStorage::new()));
        let err = get_impl(&controller, params("static-v9", "/")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode(-32004));
    }

    #[tokio::test]
    async fn test_get_impl_miss() {
        let storage = Arc::new(MemoryStorage::new());
        storage.open("static-v2").await.unwrap();
        let controller = controller(Arc::new(MockNetwork::new()), storage);

        let err = get_impl(&controller, params("static-v2", "/nope.css")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode(-32001));
    }

    #[tokio::test]
    async fn test_get_impl_found_with_stamp() {
        let storage = Arc::new(MemoryStorage::new());
        let url = Url::parse("https://shop.example/api/vehicles").unwrap();
        let stamped = ttl::stamp_now(&Response::text(200, "OK", "[]"), 0);
        storage
            .put("dynamic-v2", &RequestKey::new("GET", &url), stamped)
            .await
            .unwrap();
        let controller = controller(Arc::new(MockNetwork::new()), storage);

        let output: CacheGetOutput = parse(&get_impl(&controller, params("dynamic-v2", "/api/vehicles")).await.unwrap());
        assert_eq!(output.status, 200);
        assert_eq!(output.body, "[]");
        assert_eq!(output.stored_at.as_deref(), Some("1970-01-01T00:00:00+00:00"));
        assert_eq!(output.key.len(), 64);
    }

    #[tokio::test]
    async fn test_get_impl_empty_store_name() {
        let controller = controller(Arc::new(MockNetwork::new()), Arc::new(MemoryStorage::new()));
        let err = get_impl(&controller, params(" ", "/")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode(-32602));
    }
}
