//! Named, versioned response stores.
//!
//! This module provides:
//!
//! - The [`CacheStorage`] abstraction (open, match, put, delete, enumerate)
//! - Versioned store names (`{role}-{generation}`)
//! - Request keys with SHA-256 digests
//! - An in-memory backend and a SQLite backend with migrations

pub mod connection;
pub mod entries;
pub mod key;
pub mod memory;
pub mod migrations;
pub mod name;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::RequestKey;
pub use memory::MemoryStorage;
pub use name::{StoreName, StoreRole};
pub use store::CacheStorage;
