//! cache_purge tool implementation.
//!
//! Deletes one entry when a URL is given, otherwise the whole store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::require_store;
use crate::error::ToolError;
use depot_client::{Controller, fetch::resolve};
use depot_core::RequestKey;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Store name, e.g. "dynamic-v1.4".
    pub store: String,

    /// Entry to delete. When absent the whole store is deleted.
    #[serde(default)]
    pub url: Option<String>,

    /// HTTP method of the stored request (default: GET).
    #[serde(default = "crate::tools::default_method")]
    pub method: String,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub store: String,
    /// The entry URL, or `None` when the store itself was targeted.
    pub url: Option<String>,
    pub deleted: bool,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(controller: &Controller, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let store = require_store(&params.store)?;
    let storage = controller.storage();

    let output = match params.url.as_deref() {
        Some(raw) => {
            let url = resolve(&controller.settings().origin, raw).map_err(ToolError::from)?;
            let deleted = storage
                .delete_entry(store, &RequestKey::new(&params.method, &url))
                .await?;
            CachePurgeOutput { store: store.to_string(), url: Some(url.to_string()), deleted }
        }
        None => {
            let deleted = storage.delete(store).await?;
            CachePurgeOutput { store: store.to_string(), url: None, deleted }
        }
    };

    tracing::info!(store = %output.store, url = ?output.url, deleted = output.deleted, "purge");

    super::super::json_result(&output)
}
