//! Runtime settings.
//!
//! Loaded from built-in defaults overlaid with `REGIONHUB__*` environment
//! variables (`__` separates nesting levels), after an optional `.env` file:
//!
//! | Key | Env var | Default |
//! |-----|---------|---------|
//! | `http.bind_addr` | `REGIONHUB__HTTP__BIND_ADDR` | `0.0.0.0:8080` |
//! | `use_persistent_stores` | `REGIONHUB__USE_PERSISTENT_STORES` | `false` |
//! | `database_url` | `REGIONHUB__DATABASE_URL` | unset |
//! | `redis_url` | `REGIONHUB__REDIS_URL` | unset |
//! | `queue.create_region_channel` | `REGIONHUB__QUEUE__CREATE_REGION_CHANNEL` | `region-insert` |
//! | `cache.absolute_expiration_secs` | `REGIONHUB__CACHE__ABSOLUTE_EXPIRATION_SECS` | `300` |
//! | `cache.sliding_expiration_secs` | `REGIONHUB__CACHE__SLIDING_EXPIRATION_SECS` | `0` |
//! | `cache.key_prefix` | `REGIONHUB__CACHE__KEY_PREFIX` | `regionhub:region:` |
//!
//! An expiration of `0` seconds disables that window.

use std::time::Duration;

use ::config::{Config, Environment};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::CacheEntryOptions;

pub const ENV_PREFIX: &str = "REGIONHUB";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_CREATE_REGION_CHANNEL: &str = "region-insert";
pub const DEFAULT_CACHE_KEY_PREFIX: &str = "regionhub:region:";
pub const DEFAULT_ABSOLUTE_EXPIRATION_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpSettings {
    pub bind_addr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueSettings {
    pub create_region_channel: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheSettings {
    pub absolute_expiration_secs: u64,
    pub sliding_expiration_secs: u64,
    pub key_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub http: HttpSettings,
    pub use_persistent_stores: bool,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub redis_url: Option<String>,
    pub queue: QueueSettings,
    pub cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http: HttpSettings {
                bind_addr: DEFAULT_BIND_ADDR.to_string(),
            },
            use_persistent_stores: false,
            database_url: None,
            redis_url: None,
            queue: QueueSettings {
                create_region_channel: DEFAULT_CREATE_REGION_CHANNEL.to_string(),
            },
            cache: CacheSettings {
                absolute_expiration_secs: DEFAULT_ABSOLUTE_EXPIRATION_SECS,
                sliding_expiration_secs: 0,
                key_prefix: DEFAULT_CACHE_KEY_PREFIX.to_string(),
            },
        }
    }
}

impl Settings {
    /// Load `.env` (if present), then defaults overlaid with the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_env(environment())
    }

    /// Build from defaults overlaid with `env`.
    pub fn from_env(env: Environment) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let settings: Settings = Config::builder()
            .set_default("http.bind_addr", defaults.http.bind_addr)?
            .set_default("use_persistent_stores", defaults.use_persistent_stores)?
            .set_default("queue.create_region_channel", defaults.queue.create_region_channel)?
            .set_default("cache.absolute_expiration_secs", defaults.cache.absolute_expiration_secs)?
            .set_default("cache.sliding_expiration_secs", defaults.cache.sliding_expiration_secs)?
            .set_default("cache.key_prefix", defaults.cache.key_prefix)?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.create_region_channel.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "queue.create_region_channel must not be empty".to_string(),
            ));
        }
        if self.use_persistent_stores {
            if self.database_url.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Invalid(
                    "database_url is required when use_persistent_stores is set".to_string(),
                ));
            }
            if self.redis_url.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Invalid(
                    "redis_url is required when use_persistent_stores is set".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Expiration policy for cache writes.
    pub fn cache_entry_options(&self) -> CacheEntryOptions {
        let window = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        CacheEntryOptions::new(
            window(self.cache.absolute_expiration_secs),
            window(self.cache.sliding_expiration_secs),
        )
    }
}

/// The `REGIONHUB__*` environment source.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use ::config::Map;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_env(environment().source(Some(map)))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let settings = from_vars(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.queue.create_region_channel, "region-insert");
        assert_eq!(settings.cache_entry_options(), CacheEntryOptions::default());
    }

    #[test]
    fn environment_overrides_nested_keys() {
        let settings = from_vars(&[
            ("REGIONHUB__QUEUE__CREATE_REGION_CHANNEL", "regions-new"),
            ("REGIONHUB__HTTP__BIND_ADDR", "127.0.0.1:9000"),
            ("REGIONHUB__CACHE__SLIDING_EXPIRATION_SECS", "30"),
            ("REGIONHUB__CACHE__ABSOLUTE_EXPIRATION_SECS", "0"),
        ])
        .unwrap();

        assert_eq!(settings.queue.create_region_channel, "regions-new");
        assert_eq!(settings.http.bind_addr, "127.0.0.1:9000");
        assert_eq!(
            settings.cache_entry_options(),
            CacheEntryOptions::sliding(Duration::from_secs(30))
        );
    }

    #[test]
    fn persistent_profile_requires_urls() {
        let err = from_vars(&[("REGIONHUB__USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let settings = from_vars(&[
            ("REGIONHUB__USE_PERSISTENT_STORES", "true"),
            ("REGIONHUB__DATABASE_URL", "postgres://localhost/regions"),
            ("REGIONHUB__REDIS_URL", "redis://localhost:6379"),
        ])
        .unwrap();
        assert!(settings.use_persistent_stores);
    }

    #[test]
    fn blank_channel_is_rejected() {
        let err = from_vars(&[("REGIONHUB__QUEUE__CREATE_REGION_CHANNEL", " ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
