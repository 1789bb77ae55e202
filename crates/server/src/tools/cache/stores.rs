//! cache_stores tool implementation.
//!
//! Lists every store with its entry count and whether it belongs to the
//! current generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use depot_client::{Controller, LifecycleState};
use depot_core::{StoreName, StoreRole};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    /// Role parsed from the name prefix, if it is a known one.
    pub role: Option<StoreRole>,
    pub entries: usize,
    /// Whether the store belongs to the current generation.
    pub declared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    pub generation: String,
    pub lifecycle: LifecycleState,
    pub stores: Vec<StoreSummary>,
}

pub async fn stores_impl(controller: &Controller) -> Result<CallToolResult, McpError> {
    let storage = controller.storage();
    let settings = controller.settings();

    let mut stores = Vec::new();
    for name in storage.keys().await? {
        let entries = storage.entry_keys(&name).await?.len();
        let role = StoreName::parse(&name).map(|parsed| parsed.role);
        let declared = settings.is_declared(&name);
        stores.push(StoreSummary { name, role, entries, declared });
    }

    let output = CacheStoresOutput {
        generation: settings.generation.clone(),
        lifecycle: controller.lifecycle().state(),
        stores,
    };

    super::super::json_result(&output)
}
