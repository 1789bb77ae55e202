//! Immutable runtime settings derived from a validated `AppConfig`.
//!
//! Built once at startup and shared by every component, so the generation
//! tag, store names and policy table never live in global state.

use url::Url;

use super::{AppConfig, ConfigError};
use crate::cache::name::StoreName;
use crate::classify::RequestClassifier;
use crate::policy::StrategyPolicy;

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub generation: String,
    pub origin: Url,
    pub classifier: RequestClassifier,
    pub policy: StrategyPolicy,
    pub critical_manifest: Vec<Url>,
    pub font_manifest: Vec<Url>,
    pub skip_waiting: bool,
    pub reclaim_foreign_stores: bool,
}

impl CacheSettings {
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails or a manifest entry cannot
    /// be resolved against the origin.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let origin = Url::parse(&config.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;

        let resolve = |field: &str, entries: &[String]| -> Result<Vec<Url>, ConfigError> {
            entries
                .iter()
                .map(|entry| {
                    origin.join(entry.trim()).map_err(|e| ConfigError::Invalid {
                        field: field.into(),
                        reason: format!("{entry}: {e}"),
                    })
                })
                .collect()
        };

        Ok(Self {
            generation: config.generation.clone(),
            classifier: RequestClassifier::from_config(&config.classifier)?,
            policy: StrategyPolicy::from_config(&config.policy, &config.generation)?,
            critical_manifest: resolve("critical_manifest", &config.critical_manifest)?,
            font_manifest: resolve("font_manifest", &config.font_manifest)?,
            skip_waiting: config.skip_waiting,
            reclaim_foreign_stores: config.reclaim_foreign_stores,
            origin,
        })
    }

    /// Store names of every role for the current generation.
    pub fn declared_stores(&self) -> Vec<StoreName> {
        StoreName::declared(&self.generation)
    }

    pub fn is_declared(&self, store: &str) -> bool {
        self.declared_stores().iter().any(|name| name.to_string() == store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_resolves_against_origin() {
        let config = AppConfig { origin: "https://shop.example".into(), ..Default::default() };
        let settings = CacheSettings::from_config(&config).unwrap();

        assert_eq!(settings.critical_manifest[0].as_str(), "https://shop.example/");
        assert_eq!(settings.critical_manifest[1].as_str(), "https://shop.example/src/main.tsx");
        assert_eq!(settings.font_manifest[0].host_str(), Some("fonts.gstatic.com"));
    }

    #[test]
    fn test_declared_stores() {
        let config = AppConfig { generation: "v2".into(), ..Default::default() };
        let settings = CacheSettings::from_config(&config).unwrap();

        assert!(settings.is_declared("static-v2"));
        assert!(settings.is_declared("js-v2"));
        assert!(!settings.is_declared("static-v1"));
        assert!(!settings.is_declared("desguacemurcia-v2"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AppConfig { generation: String::new(), ..Default::default() };
        assert!(CacheSettings::from_config(&config).is_err());
    }
}
