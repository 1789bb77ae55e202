//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, CachePurgeParams, get, purge, stores};
use crate::tools::{SwActivateParams, SwFetchParams, sw_activate, sw_fetch, sw_install};
use depot_client::Controller;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for depot.
#[derive(Clone)]
pub struct DepotServer {
    tool_router: ToolRouter<Self>,
    controller: Arc<Controller>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl DepotServer {
    /// Create a new server handler around a started controller.
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { tool_router: Self::tool_router(), controller }
    }

    /// Route a request through the cache controller.
    #[tool(
        description = "Handle a request the way the cache controller would intercept it. Returns the response with its resource class and source (network, cache, synthetic, passthrough)."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        sw_fetch::fetch_impl(&self.controller, params.0).await
    }

    #[tool(description = "Re-run install: warm the static and fonts stores from the manifests, then activate if skip-waiting is enabled.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        sw_install::install_impl(&self.controller).await
    }

    #[tool(description = "Activate the current generation: delete stale stores and start intercepting. Use dry_run to only list what would be deleted.")]
    async fn sw_activate(&self, params: Parameters<SwActivateParams>) -> Result<CallToolResult, McpError> {
        sw_activate::activate_impl(&self.controller, params.0).await
    }

    #[tool(description = "List cache stores with entry counts and whether each belongs to the current generation.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores::stores_impl(&self.controller).await
    }

    #[tool(description = "Read one stored entry by store name and URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get::get_impl(&self.controller, params.0).await
    }

    #[tool(description = "Delete one entry (when url is given) or a whole store.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge::purge_impl(&self.controller, params.0).await
    }
}

impl ServerHandler for DepotServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "depot".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_client::MockNetwork;
    use depot_core::MemoryStorage;

    #[test]
    fn test_all_tools_registered() {
        let controller = crate::tools::testing::controller(Arc::new(MockNetwork::new()), Arc::new(MemoryStorage::new()));
        let server = DepotServer::new(Arc::new(controller));

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec!["cache_get", "cache_purge", "cache_stores", "sw_activate", "sw_fetch", "sw_install"]
        );
    }
}
