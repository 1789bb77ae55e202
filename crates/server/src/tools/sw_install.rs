//! sw_install tool implementation.
//!
//! Re-runs the install warm-up for the current generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};

use depot_client::Controller;

pub async fn install_impl(controller: &Controller) -> Result<CallToolResult, McpError> {
    let report = controller.lifecycle().install().await;
    super::json_result(&report)
}
