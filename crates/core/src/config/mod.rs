//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DEPOT_*)
//! 2. TOML config file (if DEPOT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::name::StoreRole;
use crate::policy::StrategyKind;

mod settings;
mod validation;

pub use settings::CacheSettings;
pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DEPOT_*, `__` separates nested keys)
/// 2. TOML config file (if DEPOT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Store generation tag. Change it on every deploy to invalidate stores.
    ///
    /// Set via DEPOT_GENERATION environment variable.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Origin that relative URLs and manifest entries resolve against.
    ///
    /// Set via DEPOT_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via DEPOT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Activate right after install instead of waiting.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Delete stores with unknown names at activation, not only stale
    /// generations of known roles.
    #[serde(default = "default_true")]
    pub reclaim_foreign_stores: bool,

    /// Resources cached into the static store at install.
    #[serde(default = "default_critical_manifest")]
    pub critical_manifest: Vec<String>,

    /// Fonts cached into the fonts store at install.
    #[serde(default = "default_font_manifest")]
    pub font_manifest: Vec<String>,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Request classification rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Module-source and framework-internal path prefixes.
    pub module_prefixes: Vec<String>,
    /// Regex matched against the host of cross-origin media.
    pub cdn_host_pattern: String,
    /// Regex matched against the host of web font servers.
    pub font_host_pattern: Option<String>,
    /// Regex matched against the path of same-origin scripts and
    /// prebundled dependencies.
    pub script_pattern: String,
    /// Regex matched against the path of local static assets.
    pub local_asset_pattern: String,
    /// Entity detail page prefixes, never intercepted.
    pub entity_page_prefixes: Vec<String>,
    pub api_prefix: String,
    /// Schemes that are always passed through.
    pub unsupported_schemes: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            module_prefixes: vec!["/src/".into(), "/@".into()],
            cdn_host_pattern: r"cdn11\.metasync\.com".into(),
            font_host_pattern: Some(r"^fonts\.(gstatic|googleapis)\.com$".into()),
            script_pattern: r"(\.js$|\.vite/deps/)".into(),
            local_asset_pattern: r"\.(js|css|woff2|woff|png|jpg|jpeg|svg|webp)$".into(),
            entity_page_prefixes: vec!["/vehiculos/".into(), "/piezas/".into()],
            api_prefix: "/api/".into(),
            unsupported_schemes: vec![
                "chrome-extension".into(),
                "moz-extension".into(),
                "safari-extension".into(),
                "extension".into(),
            ],
        }
    }
}

/// One policy row as configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub strategy: StrategyKind,
    pub store: StoreRole,
    #[serde(default)]
    pub max_age_ms: Option<u64>,
    #[serde(default)]
    pub label: Option<String>,
    /// Only store responses whose `content-type` contains this substring.
    #[serde(default)]
    pub require_content_type: Option<String>,
}

impl RuleConfig {
    fn new(strategy: StrategyKind, store: StoreRole, max_age_ms: Option<u64>) -> Self {
        Self { strategy, store, max_age_ms, label: None, require_content_type: None }
    }
}

/// Policy rows for every interceptable class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub critical_static: RuleConfig,
    pub cdn_media: RuleConfig,
    pub font_asset: RuleConfig,
    pub script: RuleConfig,
    pub local_asset: RuleConfig,
    pub api_dynamic: RuleConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            critical_static: RuleConfig::new(StrategyKind::CacheFirst, StoreRole::Static, None),
            cdn_media: RuleConfig {
                label: Some("Image".into()),
                ..RuleConfig::new(StrategyKind::CacheWithFallbackTtl, StoreRole::Dynamic, Some(86_400_000))
            },
            font_asset: RuleConfig::new(StrategyKind::CacheFirst, StoreRole::Fonts, None),
            script: RuleConfig {
                require_content_type: Some("javascript".into()),
                ..RuleConfig::new(StrategyKind::CacheFirst, StoreRole::Js, None)
            },
            local_asset: RuleConfig::new(StrategyKind::CacheFirst, StoreRole::Static, None),
            api_dynamic: RuleConfig::new(StrategyKind::NetworkFirst, StoreRole::Dynamic, Some(300_000)),
        }
    }
}

fn default_generation() -> String {
    "v1.4".into()
}

fn default_origin() -> String {
    "http://localhost:5000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./depot-cache.sqlite")
}

fn default_user_agent() -> String {
    "depot/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

fn default_critical_manifest() -> Vec<String> {
    [
        "/",
        "/src/main.tsx",
        "/src/App.tsx",
        "/src/components/Header.tsx",
        "/src/index.css",
        "/desguacesmurcia1.png",
        "/@vite/client",
        "/@react-refresh",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_font_manifest() -> Vec<String> {
    vec![
        "https://fonts.gstatic.com/s/montserrat/v30/JTUSjIg1_i6t8kCHKm459WlhyyTh89Y.woff2".into(),
        "https://fonts.gstatic.com/s/opensans/v43/memvYaGs126MiZpBA-UvWbX2vVnXBbObj2OVTS-mu0SC55I.woff2".into(),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: default_generation(),
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            skip_waiting: true,
            reclaim_foreign_stores: true,
            critical_manifest: default_critical_manifest(),
            font_manifest: default_font_manifest(),
            classifier: ClassifierConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DEPOT_`
    /// 2. TOML file from `DEPOT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("DEPOT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("DEPOT_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
