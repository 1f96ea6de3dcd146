//! Configuration loaded from environment variables with defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RATE_FEED_URL: &str = "https://api.exchangerate-api.com/v4/latest/MUR";
pub const DEFAULT_GEO_URL: &str = "https://ipapi.co/json/";

/// Which persistence store backs the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "BOOKING_STORE",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    pub store: StoreBackend,
    /// Required for the Postgres backend only
    pub database_url: Option<String>,
    /// Upper bound on every persistence store call (default: 5s)
    pub store_timeout: Duration,
    pub rate_feed_url: String,
    pub geo_url: String,
    /// Exchange rate refresh period (default: 1 hour)
    pub rate_refresh: Duration,
    /// Upper bound on every rate feed and geolocation request (default: 10s)
    pub rate_feed_timeout: Duration,
    /// Submissions remembered for de-duplication (default: 100k)
    pub submission_cache_capacity: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store = match lookup("BOOKING_STORE") {
            Some(value) => value.parse()?,
            None => StoreBackend::Postgres,
        };
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            store,
            database_url,
            store_timeout: Duration::from_millis(parse_or(&lookup, "STORE_TIMEOUT_MS", 5_000)?),
            rate_feed_url: lookup("RATE_FEED_URL").unwrap_or_else(|| DEFAULT_RATE_FEED_URL.to_string()),
            geo_url: lookup("GEO_URL").unwrap_or_else(|| DEFAULT_GEO_URL.to_string()),
            rate_refresh: Duration::from_secs(parse_or(&lookup, "RATE_REFRESH_SECS", 3_600)?),
            rate_feed_timeout: Duration::from_millis(parse_or(&lookup, "RATE_FEED_TIMEOUT_MS", 10_000)?),
            submission_cache_capacity: parse_or(
                &lookup,
                "SUBMISSION_CACHE_CAPACITY",
                crate::cache::DEFAULT_SUBMISSION_CAPACITY,
            )?,
        })
    }
}

fn parse_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::Invalid { key, value }),
        },
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
    fn test_memory_backend_uses_defaults() {
        let config = Config::from_lookup(lookup(&[("BOOKING_STORE", "memory")])).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.rate_refresh, Duration::from_secs(3600));
        assert_eq!(config.rate_feed_url, DEFAULT_RATE_FEED_URL);
        assert_eq!(config.submission_cache_capacity, 100_000);
    }

    #[test]
    fn test_submission_cache_capacity_override() {
        let config = Config::from_lookup(lookup(&[
            ("BOOKING_STORE", "memory"),
            ("SUBMISSION_CACHE_CAPACITY", "250000"),
        ]))
        .unwrap();
        assert_eq!(config.submission_cache_capacity, 250_000);
    }

    #[test]
    fn test_postgres_backend_requires_database_url() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/carsrus")])).unwrap();
        assert_eq!(config.store, StoreBackend::Postgres);
    }

    #[test]
    fn test_zero_or_garbage_durations_are_rejected() {
        let err = Config::from_lookup(lookup(&[("BOOKING_STORE", "memory"), ("STORE_TIMEOUT_MS", "0")]));
        assert!(matches!(err, Err(ConfigError::Invalid { key: "STORE_TIMEOUT_MS", .. })));
        let err = Config::from_lookup(lookup(&[("BOOKING_STORE", "memory"), ("RATE_REFRESH_SECS", "soon")]));
        assert!(err.is_err());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
