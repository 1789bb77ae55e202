//! Request classification.
//!
//! Maps every request to exactly one [`ResourceClass`] from its method,
//! URL and `Accept` header. Classification is pure: no I/O, no state.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{ClassifierConfig, ConfigError};
use crate::http::Request;

/// Category a request is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    /// Module sources and framework internals.
    CriticalStatic,
    /// Cross-origin media served from the CDN.
    CdnMedia,
    /// Web fonts served from a font host.
    FontAsset,
    /// Same-origin scripts and prebundled dependencies.
    Script,
    /// Same-origin styles, fonts and images.
    LocalAsset,
    /// Entity detail pages and HTML documents. Never intercepted so that
    /// origin-rendered metadata always reaches the client.
    DynamicPage,
    /// Root and API data requests.
    ApiDynamic,
    /// Matched no rule; forwarded untouched.
    Unmatched,
    /// Non-GET or unsupported scheme; forwarded untouched.
    Uncacheable,
}

impl ResourceClass {
    /// Whether the class can ever be served through a caching strategy.
    pub fn is_interceptable(&self) -> bool {
        !matches!(self, ResourceClass::DynamicPage | ResourceClass::Unmatched | ResourceClass::Uncacheable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::CriticalStatic => "critical_static",
            ResourceClass::CdnMedia => "cdn_media",
            ResourceClass::FontAsset => "font_asset",
            ResourceClass::Script => "script",
            ResourceClass::LocalAsset => "local_asset",
            ResourceClass::DynamicPage => "dynamic_page",
            ResourceClass::ApiDynamic => "api_dynamic",
            ResourceClass::Unmatched => "unmatched",
            ResourceClass::Uncacheable => "uncacheable",
        }
    }
}

/// Compiled classification rules.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    module_prefixes: Vec<String>,
    cdn_host: Regex,
    font_host: Option<Regex>,
    script: Regex,
    local_asset: Regex,
    entity_page_prefixes: Vec<String>,
    api_prefix: String,
    unsupported_schemes: Vec<String>,
}

impl RequestClassifier {
    /// Compile the classifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a pattern does not compile.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        let compile = |field: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::Invalid { field: field.into(), reason: e.to_string() })
        };

        Ok(Self {
            module_prefixes: config.module_prefixes.clone(),
            cdn_host: compile("classifier.cdn_host_pattern", &config.cdn_host_pattern)?,
            font_host: config
                .font_host_pattern
                .as_deref()
                .map(|p| compile("classifier.font_host_pattern", p))
                .transpose()?,
            script: compile("classifier.script_pattern", &config.script_pattern)?,
            local_asset: compile("classifier.local_asset_pattern", &config.local_asset_pattern)?,
            entity_page_prefixes: config.entity_page_prefixes.clone(),
            api_prefix: config.api_prefix.clone(),
            unsupported_schemes: config
                .unsupported_schemes
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        })
    }

    /// Whether requests with this URL scheme may be intercepted at all.
    pub fn is_supported_scheme(&self, scheme: &str) -> bool {
        let scheme = scheme.to_ascii_lowercase();
        if self.unsupported_schemes.contains(&scheme) {
            return false;
        }
        matches!(scheme.as_str(), "http" | "https")
    }

    /// Assign a class. Rules apply in priority order; the first match wins.
    pub fn classify(&self, request: &Request) -> ResourceClass {
        if !request.is_get() || !self.is_supported_scheme(request.url.scheme()) {
            return ResourceClass::Uncacheable;
        }

        let path = request.url.path();
        let host = request.url.host_str().unwrap_or("");

        if self.module_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return ResourceClass::CriticalStatic;
        }

        if self.cdn_host.is_match(host) {
            return ResourceClass::CdnMedia;
        }

        if self.font_host.as_ref().is_some_and(|re| re.is_match(host)) {
            return ResourceClass::FontAsset;
        }

        if self.script.is_match(path) {
            return ResourceClass::Script;
        }

        if self.local_asset.is_match(path) {
            return ResourceClass::LocalAsset;
        }

        if self.entity_page_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return ResourceClass::DynamicPage;
        }

        if path == "/" || path.starts_with(self.api_prefix.as_str()) {
            if request.accepts_html() {
                return ResourceClass::DynamicPage;
            }
            return ResourceClass::ApiDynamic;
        }

        ResourceClass::Unmatched
    }
}
