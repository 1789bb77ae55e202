//! Structured errors for tool parameter validation.

use depot_client::fetch::UrlError;
use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., empty store name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be resolved against the configured origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for ToolError {
    fn from(err: UrlError) -> Self {
        match err {
            UrlError::Empty => ToolError::InvalidInput("url cannot be empty".into()),
            UrlError::InvalidUrl(msg) => ToolError::InvalidUrl(msg),
        }
    }
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) => -32602,
            ToolError::InvalidUrl(_) => -32003,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_error_mapping() {
        let err: McpError = ToolError::from(UrlError::Empty).into();
        assert_eq!(err.code, ErrorCode(-32602));

        let err: McpError = ToolError::from(UrlError::InvalidUrl("relative URL without a base".into())).into();
        assert_eq!(err.code, ErrorCode(-32003));
        assert!(err.message.starts_with("INVALID_URL"));
    }
}
