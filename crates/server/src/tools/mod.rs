//! MCP tool implementations.
//!
//! This module contains all tools exposed by the depot server.

pub mod cache;
pub mod sw_activate;
pub mod sw_fetch;
pub mod sw_install;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use depot_core::Error;

pub use sw_activate::SwActivateParams;
pub use sw_fetch::SwFetchParams;

/// Pretty JSON tool result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn default_method() -> String {
    "GET".into()
}
