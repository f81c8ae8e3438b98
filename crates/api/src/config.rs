//! Application configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Development-only signing secret used when `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `text` or `json`
/// - `DATABASE_URL`: PostgreSQL; in-memory repositories when unset
/// - `JWT_SECRET`, `JWT_ISSUER` (default `restaurant`)
/// - `ACCESS_TOKEN_TTL_MINUTES` (15), `REFRESH_TOKEN_TTL_HOURS` (168)
/// - `SESSION_CLEANUP_INTERVAL_SECS` (300)
/// - `DEFAULT_PREP_TIME_SECS` (900)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_ttl: chrono::Duration,
    pub refresh_token_ttl: chrono::Duration,
    pub session_cleanup_interval: Duration,
    pub default_prep_time: Duration,
}

impl Config {
    /// Loads configuration from the process environment, after reading a
    /// `.env` file if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse(&get, "PORT")?.unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match get("LOG_FORMAT").as_deref() {
                None => defaults.log_format,
                Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                Some(v) => {
                    return Err(ConfigError::Invalid {
                        key: "LOG_FORMAT",
                        value: v.to_string(),
                    });
                }
            },
            database_url: get("DATABASE_URL"),
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_issuer: get("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            access_token_ttl: parse(&get, "ACCESS_TOKEN_TTL_MINUTES")?
                .map(chrono::Duration::minutes)
                .unwrap_or(defaults.access_token_ttl),
            refresh_token_ttl: parse(&get, "REFRESH_TOKEN_TTL_HOURS")?
                .map(chrono::Duration::hours)
                .unwrap_or(defaults.refresh_token_ttl),
            session_cleanup_interval: parse(&get, "SESSION_CLEANUP_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_cleanup_interval),
            default_prep_time: parse(&get, "DEFAULT_PREP_TIME_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_prep_time),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn jwt(&self) -> auth::JwtConfig {
        auth::JwtConfig {
            secret: self.jwt_secret.clone(),
            issuer: self.jwt_issuer.clone(),
            access_ttl: self.access_token_ttl,
            refresh_ttl: self.refresh_token_ttl,
        }
    }
}

fn parse<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    get(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value })
        })
        .transpose()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_issuer: "restaurant".to_string(),
            access_token_ttl: chrono::Duration::minutes(15),
            refresh_token_ttl: chrono::Duration::hours(168),
            session_cleanup_interval: Duration::from_secs(300),
            default_prep_time: Duration::from_secs(900),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert!(config.uses_dev_secret());
        assert_eq!(config.jwt_issuer, "restaurant");
        assert_eq!(config.access_token_ttl, chrono::Duration::minutes(15));
        assert_eq!(config.refresh_token_ttl, chrono::Duration::days(7));
        assert_eq!(config.session_cleanup_interval, Duration::from_secs(300));
        assert_eq!(config.default_prep_time, Duration::from_secs(900));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/restaurant"),
            ("JWT_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_MINUTES", "5"),
            ("REFRESH_TOKEN_TTL_HOURS", "24"),
            ("DEFAULT_PREP_TIME_SECS", "600"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/restaurant")
        );
        assert!(!config.uses_dev_secret());
        assert_eq!(config.jwt().access_ttl, chrono::Duration::minutes(5));
        assert_eq!(config.jwt().refresh_ttl, chrono::Duration::hours(24));
        assert_eq!(config.default_prep_time, Duration::from_secs(600));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".into()
            }
        );
        assert!(Config::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = Config::from_lookup(lookup(&[("HOST", "  "), ("DATABASE_URL", "")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
