use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub logging: LoggingConfig,
    pub entitlements: EntitlementsConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive (`trace` … `error`).
    pub level: String,
    /// Extra directives, e.g. `tripdesk_entitlements=debug`.
    pub env_filter: Option<String>,
    pub console: bool,
    /// Directory for rolling log files. No file output when unset.
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub max_files: usize,
}

/// What to grant when entitlement data is missing or a plan has no modules attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Everything is accessible until a plan attaches modules.
    #[default]
    AllowAll,
    /// Nothing is accessible without an explicit grant.
    DenyAll,
}

/// Entitlement resolution settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntitlementsConfig {
    pub fallback: FallbackPolicy,
    pub subscriptions: CacheConfig,
    pub plans: CacheConfig,
}

/// Bounds of a read-through cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: u64,
    pub ttl_seconds: u64,
}

// --- Default ---

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            env_filter: None,
            console: true,
            dir: None,
            json: false,
            max_files: 10,
        }
    }
}

impl Default for EntitlementsConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::default(),
            subscriptions: CacheConfig { capacity: 10_000, ttl_seconds: 300 },
            plans: CacheConfig { capacity: 1, ttl_seconds: 600 },
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1_000, ttl_seconds: 300 }
    }
}
