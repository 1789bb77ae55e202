//! Core types and shared functionality for depot.
//!
//! This crate provides:
//! - Request/response model and TTL stamping
//! - Cache store abstraction with in-memory and SQLite backends
//! - Request classification and the strategy policy table
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod http;
pub mod policy;
pub mod ttl;

pub use cache::{CacheDb, CacheStorage, MemoryStorage, RequestKey, StoreName, StoreRole};
pub use classify::{RequestClassifier, ResourceClass};
pub use config::{AppConfig, CacheSettings, ConfigError};
pub use error::Error;
pub use http::{Headers, Request, Response};
pub use policy::{PolicyRule, StrategyKind, StrategyPolicy};
pub use ttl::{Clock, ManualClock, SystemClock};
