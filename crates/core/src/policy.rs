//! Strategy policy table: resource class → (strategy, store, max-age).
//!
//! Built once from configuration and never mutated. Adding a class to the
//! cache layer is a new row here, not new branching in the controller.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::name::StoreName;
use crate::classify::ResourceClass;
use crate::config::{ConfigError, PolicyConfig, RuleConfig};
use crate::http::Response;

/// Cache/network arbitration policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    CacheWithFallbackTtl,
}

impl StrategyKind {
    /// Whether the strategy evaluates entry age.
    pub fn requires_max_age(&self) -> bool {
        matches!(self, StrategyKind::NetworkFirst | StrategyKind::CacheWithFallbackTtl)
    }
}

/// One row of the policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub strategy: StrategyKind,
    pub store: StoreName,
    pub max_age: Option<Duration>,
    /// Resource name used in the "unavailable" sentinel body.
    pub label: String,
    /// Substring a response's `content-type` must contain to be stored.
    pub require_content_type: Option<String>,
}

impl PolicyRule {
    fn from_config(class: ResourceClass, rule: &RuleConfig, generation: &str) -> Result<Self, ConfigError> {
        let field = format!("policy.{}", class.as_str());
        let max_age = rule.max_age_ms.map(Duration::from_millis);

        if rule.strategy.requires_max_age() && max_age.is_none_or(|d| d.is_zero()) {
            return Err(ConfigError::Invalid {
                field: format!("{field}.max_age_ms"),
                reason: "must be greater than 0 for TTL-bound strategies".into(),
            });
        }

        Ok(Self {
            strategy: rule.strategy,
            store: StoreName::new(rule.store, generation),
            max_age,
            label: rule.label.clone().unwrap_or_else(|| "Resource".into()),
            require_content_type: rule.require_content_type.clone(),
        })
    }

    /// Whether a network response may be written to this rule's store.
    pub fn admits(&self, response: &Response) -> bool {
        if !response.ok() {
            return false;
        }
        match &self.require_content_type {
            Some(needle) => response
                .content_type()
                .is_some_and(|ct| ct.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())),
            None => true,
        }
    }
}

/// Immutable mapping from resource class to policy rule.
#[derive(Debug, Clone, Default)]
pub struct StrategyPolicy {
    rules: HashMap<ResourceClass, PolicyRule>,
}

impl StrategyPolicy {
    /// Build the table for one store generation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a TTL-bound rule lacks a positive
    /// max-age.
    pub fn from_config(config: &PolicyConfig, generation: &str) -> Result<Self, ConfigError> {
        let rows = [
            (ResourceClass::CriticalStatic, &config.critical_static),
            (ResourceClass::CdnMedia, &config.cdn_media),
            (ResourceClass::FontAsset, &config.font_asset),
            (ResourceClass::Script, &config.script),
            (ResourceClass::LocalAsset, &config.local_asset),
            (ResourceClass::ApiDynamic, &config.api_dynamic),
        ];

        let mut rules = HashMap::with_capacity(rows.len());
        for (class, rule) in rows {
            rules.insert(class, PolicyRule::from_config(class, rule, generation)?);
        }

        Ok(Self { rules })
    }

    /// Rule for `class`; `None` means the request is forwarded untouched.
    pub fn rule_for(&self, class: ResourceClass) -> Option<&PolicyRule> {
        if !class.is_interceptable() {
            return None;
        }
        self.rules.get(&class)
    }

    /// Every store the table writes to.
    pub fn stores(&self) -> BTreeSet<StoreName> {
        self.rules.values().map(|r| r.store.clone()).collect()
    }
}
