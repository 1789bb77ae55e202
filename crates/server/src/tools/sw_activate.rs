//! sw_activate tool implementation.
//!
//! Reclaims stores from previous generations. With `dry_run` it only
//! reports what would be deleted.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use depot_client::Controller;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateParams {
    /// Report the reclaim plan without deleting anything.
    #[serde(default)]
    pub dry_run: bool,
}

pub async fn activate_impl(controller: &Controller, params: SwActivateParams) -> Result<CallToolResult, McpError> {
    let lifecycle = controller.lifecycle();
    let report = if params.dry_run { lifecycle.plan_reclaim().await } else { lifecycle.activate().await };
    super::json_result(&report)
}
