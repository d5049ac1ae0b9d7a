//! # Configuration Module
//!
//! Service configuration loaded from a YAML file, with environment variable
//! overrides applied on top.
//!
//! ## Loading order
//! 1. Built-in defaults
//! 2. The YAML file named by `AD_SERVICE_CONFIG_PATH` (skipped if absent)
//! 3. `AD_SERVICE_<SECTION>_<FIELD>` environment variables
//!
//! Durations are written in humantime form (`5s`, `1h`, `48h`) both in the
//! file and in the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::caching::{CacheWritePolicy, RedisCacheConfig};
use crate::core::error::{AdError, AdResult};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "AD_SERVICE_CONFIG_PATH";

/// File read when [`CONFIG_PATH_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/ad-service.yaml";

/// Main service configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub redis: RedisCacheConfig,
    pub cache: CacheConfig,
    pub store: StoreConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,

    /// Overall deadline for one request, across all store and cache calls
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Which cache store backs listings and counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown cache backend: {}", other)),
        }
    }
}

/// Listing cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Namespace token every listing key starts with
    pub namespace: String,

    /// Expiry of cached listings
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Per-call cache store timeout
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,

    pub write_policy: CacheWritePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            namespace: "ads".to_string(),
            ttl: Duration::from_secs(3600),
            operation_timeout: Duration::from_secs(5),
            write_policy: CacheWritePolicy::Ignore,
        }
    }
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Per-call document store timeout
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(10),
        }
    }
}

/// Creation caps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Advertisements that may be created per UTC day
    pub daily_limit: u64,

    /// Advertisements that may be active at once
    pub active_limit: u64,

    /// Namespace of the daily counters. Must not fall under the cache namespace.
    pub counter_namespace: String,

    /// How long a day's counter is kept after its first increment
    #[serde(with = "humantime_serde")]
    pub counter_retention: Duration,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            daily_limit: 3000,
            active_limit: 1000,
            counter_namespace: "adcount".to_string(),
            counter_retention: Duration::from_secs(48 * 3600),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the file named by `AD_SERVICE_CONFIG_PATH`,
    /// falling back to defaults when the file does not exist
    pub async fn load() -> AdResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Self::parse_file(&path).await?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> AdResult<Self> {
        let mut config = Self::parse_file(path).await?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    async fn parse_file<P: AsRef<Path>>(path: P) -> AdResult<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| AdError::config(format!("Failed to read config file: {}", e)))?;

        Ok(serde_yaml::from_str(&content)?)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> AdResult<()> {
        use std::env;

        // Server
        if let Ok(addr) = env::var("AD_SERVICE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(timeout) = env_duration("AD_SERVICE_SERVER_REQUEST_TIMEOUT")? {
            self.server.request_timeout = timeout;
        }

        // Redis
        if let Ok(url) = env::var("AD_SERVICE_REDIS_URL") {
            self.redis.url = url;
        }
        if let Some(timeout) = env_duration("AD_SERVICE_REDIS_CONNECTION_TIMEOUT")? {
            self.redis.connection_timeout = timeout;
        }
        if let Ok(prefix) = env::var("AD_SERVICE_REDIS_KEY_PREFIX") {
            self.redis.key_prefix = prefix;
        }

        // Cache
        if let Some(backend) = env_parse("AD_SERVICE_CACHE_BACKEND")? {
            self.cache.backend = backend;
        }
        if let Ok(namespace) = env::var("AD_SERVICE_CACHE_NAMESPACE") {
            self.cache.namespace = namespace;
        }
        if let Some(ttl) = env_duration("AD_SERVICE_CACHE_TTL")? {
            self.cache.ttl = ttl;
        }
        if let Some(timeout) = env_duration("AD_SERVICE_CACHE_OPERATION_TIMEOUT")? {
            self.cache.operation_timeout = timeout;
        }
        if let Some(policy) = env_parse("AD_SERVICE_CACHE_WRITE_POLICY")? {
            self.cache.write_policy = policy;
        }

        // Store
        if let Some(timeout) = env_duration("AD_SERVICE_STORE_OPERATION_TIMEOUT")? {
            self.store.operation_timeout = timeout;
        }

        // Limits
        if let Some(limit) = env_parse("AD_SERVICE_LIMITS_DAILY_LIMIT")? {
            self.limits.daily_limit = limit;
        }
        if let Some(limit) = env_parse("AD_SERVICE_LIMITS_ACTIVE_LIMIT")? {
            self.limits.active_limit = limit;
        }
        if let Ok(namespace) = env::var("AD_SERVICE_LIMITS_COUNTER_NAMESPACE") {
            self.limits.counter_namespace = namespace;
        }
        if let Some(retention) = env_duration("AD_SERVICE_LIMITS_COUNTER_RETENTION")? {
            self.limits.counter_retention = retention;
        }

        // Logging
        if let Ok(level) = env::var("AD_SERVICE_LOGGING_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_parse("AD_SERVICE_LOGGING_FORMAT")? {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate the configuration, reporting every problem at once
    pub fn validate(&self) -> AdResult<()> {
        let mut errors = Vec::new();

        if self.server.bind_address.is_empty() {
            errors.push("bind_address cannot be empty".to_string());
        }
        if self.server.request_timeout.is_zero() {
            errors.push("request_timeout must be greater than 0".to_string());
        }

        if self.redis.url.is_empty() && self.cache.backend == CacheBackend::Redis {
            errors.push("redis url cannot be empty with the redis cache backend".to_string());
        }

        if self.cache.namespace.is_empty() {
            errors.push("cache namespace cannot be empty".to_string());
        }
        if self.cache.ttl.is_zero() {
            errors.push("cache ttl must be greater than 0".to_string());
        }
        if self.cache.operation_timeout.is_zero() {
            errors.push("cache operation_timeout must be greater than 0".to_string());
        }

        if self.store.operation_timeout.is_zero() {
            errors.push("store operation_timeout must be greater than 0".to_string());
        }

        if self.limits.daily_limit == 0 {
            errors.push("daily_limit must be greater than 0".to_string());
        }
        if self.limits.active_limit == 0 {
            errors.push("active_limit must be greater than 0".to_string());
        }
        if self.limits.counter_namespace.is_empty() {
            errors.push("counter_namespace cannot be empty".to_string());
        } else if self.counters_overlap_cache() {
            errors.push(format!(
                "counter_namespace '{}' falls under cache namespace '{}' and would be invalidated with listings",
                self.limits.counter_namespace, self.cache.namespace
            ));
        }
        if self.limits.counter_retention.is_zero() {
            errors.push("counter_retention must be greater than 0".to_string());
        }

        if !errors.is_empty() {
            return Err(AdError::config(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )));
        }

        Ok(())
    }

    fn counters_overlap_cache(&self) -> bool {
        let counters = format!("{}:", self.limits.counter_namespace);
        counters.starts_with(&format!("{}:", self.cache.namespace))
    }
}

fn env_duration(name: &str) -> AdResult<Option<Duration>> {
    match std::env::var(name) {
        Ok(raw) => humantime::parse_duration(&raw)
            .map(Some)
            .map_err(|e| AdError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

fn env_parse<T>(name: &str) -> AdResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| AdError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}
