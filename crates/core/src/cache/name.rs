//! Versioned store names: `{role}-{generation}`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a store holds. One store per role is current at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreRole {
    Static,
    Dynamic,
    #[serde(alias = "font")]
    Fonts,
    Js,
}

impl StoreRole {
    pub const ALL: [StoreRole; 4] = [StoreRole::Static, StoreRole::Dynamic, StoreRole::Fonts, StoreRole::Js];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreRole::Static => "static",
            StoreRole::Dynamic => "dynamic",
            StoreRole::Fonts => "fonts",
            StoreRole::Js => "js",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "static" => Some(StoreRole::Static),
            "dynamic" => Some(StoreRole::Dynamic),
            "fonts" | "font" => Some(StoreRole::Fonts),
            "js" => Some(StoreRole::Js),
            _ => None,
        }
    }
}

/// A store name tied to one deployment generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreName {
    pub role: StoreRole,
    pub generation: String,
}

impl StoreName {
    pub fn new(role: StoreRole, generation: impl Into<String>) -> Self {
        Self { role, generation: generation.into() }
    }

    /// Parse `{role}-{generation}`. Names with an unknown role or an empty
    /// generation tag yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let (prefix, generation) = name.split_once('-')?;
        if generation.is_empty() {
            return None;
        }
        let role = StoreRole::from_prefix(prefix)?;
        Some(Self::new(role, generation))
    }

    /// Every role's store name for `generation`.
    pub fn declared(generation: &str) -> Vec<StoreName> {
        StoreRole::ALL
            .iter()
            .map(|role| StoreName::new(*role, generation))
            .collect()
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.role.as_str(), self.generation)
    }
}
