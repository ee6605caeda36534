//! Configuration for the sandbox server
//!
//! Values come from the process environment. Invalid numbers and flags are
//! logged and the default kept.

use sandbox_core::{DEFAULT_KEY_PREFIX, DEFAULT_TTL_SECONDS};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Redis connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisSettings {
    /// Use Redis for the context store
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Redis host
    #[serde(default = "default_redis_host")]
    pub host: String,

    /// Redis port
    #[serde(default = "default_redis_port")]
    pub port: u16,

    /// Record lifetime in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Key namespace
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Initial connection timeout
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Attempts per operation before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Redis settings
    #[serde(default)]
    pub redis: RedisSettings,

    /// Context store URL (`memory://` or `redis://`)
    #[serde(default = "default_context_store_url")]
    pub context_store_url: String,

    /// Discovery service base URL
    #[serde(default)]
    pub cds_endpoint: Option<String>,

    /// Discovery call timeout
    #[serde(default = "default_cds_timeout_ms")]
    pub cds_timeout_ms: u64,

    /// Downstream adapter base URL; forwarding is off when unset
    #[serde(default)]
    pub adapter_url: Option<String>,

    /// Adapter call timeout
    #[serde(default = "default_adapter_timeout_ms")]
    pub adapter_timeout_ms: u64,

    /// Forward generated action responses to the adapter
    #[serde(default)]
    pub forward_action_responses: bool,

    /// Domain used when a request names none
    #[serde(default = "default_domain")]
    pub default_domain: String,

    /// Problems found while loading, reported once logging is up
    #[serde(skip)]
    warnings: Vec<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_redis_enabled() -> bool {
    true
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_TTL_SECONDS
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    10
}

fn default_context_store_url() -> String {
    RedisSettings::default().url()
}

fn default_cds_timeout_ms() -> u64 {
    30_000
}

fn default_adapter_timeout_ms() -> u64 {
    10_000
}

fn default_domain() -> String {
    sandbox_core::DEFAULT_DOMAIN.to_string()
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            host: default_redis_host(),
            port: default_redis_port(),
            ttl_seconds: default_ttl_seconds(),
            key_prefix: default_key_prefix(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl RedisSettings {
    /// `redis://host:port`
    pub fn url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            redis: RedisSettings::default(),
            context_store_url: default_context_store_url(),
            cds_endpoint: None,
            cds_timeout_ms: default_cds_timeout_ms(),
            adapter_url: None,
            adapter_timeout_ms: default_adapter_timeout_ms(),
            forward_action_responses: false,
            default_domain: default_domain(),
            warnings: Vec::new(),
        }
    }
}

/// Parse `raw` into `target`, keeping the current value when it does not parse
fn parse_into<T: FromStr>(target: &mut T, name: &str, raw: Option<String>, warnings: &mut Vec<String>) {
    if let Some(raw) = raw {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warnings.push(format!("Invalid {} value: {}", name, raw)),
        }
    }
}

/// Parse a boolean flag; accepts `true`/`false`/`1`/`0`
fn parse_flag(target: &mut bool, name: &str, raw: Option<String>, warnings: &mut Vec<String>) {
    if let Some(raw) = raw {
        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => *target = true,
            "false" | "0" | "no" => *target = false,
            _ => warnings.push(format!("Invalid {} value: {}", name, raw)),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn load() -> ServerResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from `lookup`, which maps variable names to values
    pub fn from_lookup<F>(lookup: F) -> ServerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut warnings = Vec::new();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        parse_into(&mut config.port, "PORT", non_empty("PORT"), &mut warnings);
        if let Some(host) = non_empty("HOST") {
            config.bind_address = host;
        }
        if let Some(level) = non_empty("LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(format) = non_empty("LOG_FORMAT") {
            config.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => {
                    warnings.push(format!("Invalid LOG_FORMAT value: {}, using pretty", format));
                    LogFormat::Pretty
                }
            };
        }

        parse_flag(&mut config.redis.enabled, "REDIS_ENABLED", non_empty("REDIS_ENABLED"), &mut warnings);
        if let Some(host) = non_empty("REDIS_HOST") {
            config.redis.host = host;
        }
        parse_into(&mut config.redis.port, "REDIS_PORT", non_empty("REDIS_PORT"), &mut warnings);
        parse_into(
            &mut config.redis.ttl_seconds,
            "REDIS_TTL_SECONDS",
            non_empty("REDIS_TTL_SECONDS"),
            &mut warnings,
        );
        if let Some(prefix) = non_empty("REDIS_KEY_PREFIX") {
            config.redis.key_prefix = prefix;
        }
        parse_into(
            &mut config.redis.connect_timeout_ms,
            "REDIS_CONNECT_TIMEOUT_MS",
            non_empty("REDIS_CONNECT_TIMEOUT_MS"),
            &mut warnings,
        );
        parse_into(
            &mut config.redis.max_retries,
            "REDIS_MAX_RETRIES",
            non_empty("REDIS_MAX_RETRIES"),
            &mut warnings,
        );

        config.context_store_url = match non_empty("CONTEXT_STORE_URL") {
            Some(url) => url,
            None if config.redis.enabled => config.redis.url(),
            None => "memory://local".to_string(),
        };

        config.cds_endpoint = non_empty("CDS_ENDPOINT").or_else(|| non_empty("CDS_ENDOINT"));
        parse_into(&mut config.cds_timeout_ms, "CDS_TIMEOUT_MS", non_empty("CDS_TIMEOUT_MS"), &mut warnings);
        config.adapter_url = non_empty("ONIX_ADAPTOR").or_else(|| non_empty("BPP_ONIX_ADAPTOR"));
        parse_into(
            &mut config.adapter_timeout_ms,
            "ADAPTER_TIMEOUT_MS",
            non_empty("ADAPTER_TIMEOUT_MS"),
            &mut warnings,
        );
        parse_flag(
            &mut config.forward_action_responses,
            "FORWARD_ACTION_RESPONSES",
            non_empty("FORWARD_ACTION_RESPONSES"),
            &mut warnings,
        );
        if let Some(domain) = non_empty("DEFAULT_DOMAIN") {
            config.default_domain = domain;
        }

        config.validate()?;

        if config.cds_endpoint.is_none() {
            warnings.push("No CDS_ENDPOINT provided, discover requests will be answered with NACK".to_string());
        }
        if config.adapter_url.is_none() && config.forward_action_responses {
            warnings.push("FORWARD_ACTION_RESPONSES is set but no adapter URL is configured".to_string());
        }

        config.warnings = warnings;
        Ok(config)
    }

    /// Problems found while loading
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Log the loading outcome; call after the subscriber is installed
    pub fn log_loaded(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
        info!(
            port = self.port,
            context_store = %self.context_store_url,
            default_domain = %self.default_domain,
            "Loaded server configuration"
        );
    }

    /// Check the values the server cannot start without
    pub fn validate(&self) -> ServerResult<()> {
        if self.default_domain.trim().is_empty() {
            return Err(ServerError::ConfigError("Default domain must not be empty".to_string()));
        }
        if self.redis.ttl_seconds == 0 {
            return Err(ServerError::ConfigError("Context TTL must be positive".to_string()));
        }
        if !self.context_store_url.starts_with("memory://") && !self.context_store_url.starts_with("redis://") {
            return Err(ServerError::ConfigError(format!(
                "Unsupported context store URL: {}",
                self.context_store_url
            )));
        }
        Ok(())
    }
}
