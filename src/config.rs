use std::time::Duration;

use thiserror::Error;

/// Value used for credentials that were not provided.
///
/// Upstream calls made with it are rejected by Feishu, so the service stays up
/// but serves an empty catalog.
pub const PLACEHOLDER: &str = "***";

pub const DEFAULT_API_BASE: &str = "https://open.feishu.cn/open-apis";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Feishu application
    pub app_id: String,
    pub app_secret: String,
    pub base_id: String,
    pub table_id: String,
    pub api_base: String,
    pub token_cache_enabled: bool,

    // Caching and timeouts
    pub record_cache_ttl: Duration,
    pub upstream_timeout: Duration,
    pub file_proxy_timeout: Duration,
    pub extra_proxy_hosts: Vec<String>,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing credentials are not an error: they fall back to [`PLACEHOLDER`]
    /// and are reported by [`Config::missing_credentials`].
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Feishu application
            app_id: env_or_default("FEISHU_APP_ID", PLACEHOLDER),
            app_secret: env_or_default("FEISHU_APP_SECRET", PLACEHOLDER),
            base_id: env_or_default("BASE_ID", PLACEHOLDER),
            table_id: env_or_default("TABLE_ID", PLACEHOLDER),
            api_base: env_or_default("FEISHU_API_BASE", DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            token_cache_enabled: parse_env_bool("FEISHU_TOKEN_CACHE", true)?,

            // Caching and timeouts
            record_cache_ttl: Duration::from_secs(parse_env_u64("RECORD_CACHE_TTL_SECS", 1800)?),
            upstream_timeout: Duration::from_secs(parse_env_u64("UPSTREAM_TIMEOUT_SECS", 30)?),
            file_proxy_timeout: Duration::from_secs(parse_env_u64("FILE_PROXY_TIMEOUT_SECS", 30)?),
            extra_proxy_hosts: parse_env_list("FILE_PROXY_ALLOWED_HOSTS"),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 5000)?,
        })
    }

    /// Configuration pointing at the given API root, for tests.
    #[must_use]
    pub fn for_testing(api_base: &str) -> Self {
        Self {
            app_id: "cli_test".to_string(),
            app_secret: "secret".to_string(),
            base_id: "base123".to_string(),
            table_id: "tbl456".to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token_cache_enabled: true,
            record_cache_ttl: Duration::from_secs(1800),
            upstream_timeout: Duration::from_secs(5),
            file_proxy_timeout: Duration::from_secs(5),
            extra_proxy_hosts: Vec::new(),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "FEISHU_API_BASE".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.record_cache_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "RECORD_CACHE_TTL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.upstream_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "UPSTREAM_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.file_proxy_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "FILE_PROXY_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Names of the credential variables still set to the placeholder.
    #[must_use]
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        [
            ("FEISHU_APP_ID", &self.app_id),
            ("FEISHU_APP_SECRET", &self.app_secret),
            ("BASE_ID", &self.base_id),
            ("TABLE_ID", &self.table_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_str() == PLACEHOLDER)
        .map(|(name, _)| name)
        .collect()
    }

    /// Hosts the file proxy may send the tenant token to.
    ///
    /// Empty when `FILE_PROXY_ALLOWED_HOSTS` is unset, meaning any host.
    /// Otherwise the API host plus the listed hosts.
    #[must_use]
    pub fn file_proxy_hosts(&self) -> Vec<String> {
        if self.extra_proxy_hosts.is_empty() {
            return Vec::new();
        }
        url::Url::parse(&self.api_base)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .into_iter()
            .chain(self.extra_proxy_hosts.iter().cloned())
            .collect()
    }

    /// URL of the tenant access token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/auth/v3/tenant_access_token/internal", self.api_base)
    }

    /// URL of the table records listing endpoint.
    #[must_use]
    pub fn records_url(&self) -> String {
        format!(
            "{}/bitable/v1/apps/{}/tables/{}/records",
            self.api_base, self.base_id, self.table_id
        )
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}
