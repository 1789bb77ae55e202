//! Store inspection and maintenance tools.

pub mod get;
pub mod purge;
pub mod stores;

pub use get::CacheGetParams;
pub use purge::CachePurgeParams;

use crate::error::ToolError;

fn require_store(store: &str) -> Result<&str, ToolError> {
    let store = store.trim();
    if store.is_empty() {
        return Err(ToolError::InvalidInput("store cannot be empty".into()));
    }
    Ok(store)
}
