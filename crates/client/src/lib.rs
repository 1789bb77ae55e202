//! Client code for depot.
//!
//! This crate provides the network capability, the caching strategies, the
//! lifecycle manager and the fetch controller built on top of them.

pub mod controller;
pub mod fetch;
pub mod lifecycle;
pub mod strategy;

pub use controller::{Controller, Handled};
pub use fetch::{FetchClient, FetchConfig, MockNetwork, Network};
pub use lifecycle::{ActivationReport, InstallReport, Lifecycle, LifecycleState, WarmFailure};
pub use strategy::{ResponseSource, Strategy, StrategyContext, StrategyOutcome, strategy_for};
