use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `TRIPDESK__ENTITLEMENTS__FALLBACK=deny_all`.
pub const ENV_PREFIX: &str = "TRIPDESK";
/// Config file used when no path is given (extension resolved by the `config` crate).
pub const DEFAULT_CONFIG_FILE: &str = "tripdesk";

/// Custom error type for config loading.
#[tripdesk_derive::tripdesk_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads `T` from a config file overlaid with environment overrides.
///
/// 1. **Base file**: `path`, or `tripdesk` in the working directory. Any format the `config`
///    crate recognises by extension (`.toml`, `.yaml`, `.json`, …).
/// 2. **Environment**: variables prefixed with `TRIPDESK__`; nested keys are separated by `__`
///    (`TRIPDESK__LOGGING__LEVEL` maps to `logging.level`). Numbers and booleans are parsed,
///    so `TRIPDESK__ENTITLEMENTS__PLANS__TTL_SECONDS=60` fills a `u64` field.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing, a source is malformed, or the merged
/// values do not deserialize into `T`.
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    info!("Loading config from {}", effective_path.display());

    Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .convert_case(config::Case::Snake)
                .try_parsing(true),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
