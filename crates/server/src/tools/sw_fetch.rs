//! sw_fetch tool implementation.
//!
//! Routes one request through the controller exactly as an intercepted
//! page fetch would be handled.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use depot_client::{Controller, ResponseSource, fetch::resolve};
use depot_core::{Request, ResourceClass, ttl};

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "super::default_method")]
    pub method: String,

    /// Optional Accept header, e.g. "text/html" for a navigation.
    #[serde(default)]
    pub accept: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub class: ResourceClass,
    pub source: ResponseSource,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    /// Store time in epoch milliseconds, when the entry carries a stamp.
    pub stored_at: Option<i64>,
    pub bytes: usize,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

pub async fn fetch_impl(controller: &Controller, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let method = params.method.trim().to_ascii_uppercase();
    if method.is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve(&controller.settings().origin, &params.url).map_err(ToolError::from)?;

    let mut request = Request::new(method, url);
    if let Some(accept) = params.accept.filter(|a| !a.trim().is_empty()) {
        request = request.with_header("accept", accept);
    }

    let handled = controller.handle_fetch(&request).await?;
    let response = &handled.response;

    let output = SwFetchOutput {
        url: request.url.to_string(),
        class: handled.class,
        source: handled.source,
        status: response.status,
        status_text: response.status_text.clone(),
        content_type: response.content_type().map(str::to_string),
        stored_at: ttl::stored_at(response),
        bytes: response.body().len(),
        body: String::from_utf8_lossy(response.body()).into_owned(),
    };

    super::json_result(&output)
}
