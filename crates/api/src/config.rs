//! Process configuration (environment variables).

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid CERBERO_BIND_ADDR '{0}'")]
    BindAddr(String),

    #[error("invalid CERBERO_ENV '{0}' (expected 'production' or 'development')")]
    Environment(String),
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    /// Postgres URL; in-memory stores are used when absent.
    pub database_url: Option<String>,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("environment", &self.environment)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            environment: Environment::Development,
            database_url: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match lookup("CERBERO_BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::BindAddr(raw))?,
            None => defaults.bind_addr,
        };

        let environment = match lookup("CERBERO_ENV").as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => return Err(ConfigError::Environment(other.to_string())),
        };

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        Ok(Self {
            bind_addr,
            environment,
            database_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_to_development_on_8080() {
        let cfg = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.environment, Environment::Development);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = ApiConfig::from_lookup(lookup(&[
            ("CERBERO_BIND_ADDR", "127.0.0.1:9000"),
            ("CERBERO_ENV", "production"),
            ("DATABASE_URL", "postgres://u:p@db/cerbero"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert!(cfg.environment.is_production());
        assert!(!format!("{cfg:?}").contains("u:p"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("CERBERO_ENV", "staging")])),
            Err(ConfigError::Environment(_))
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("CERBERO_BIND_ADDR", "nope")])),
            Err(ConfigError::BindAddr(_))
        ));
    }
}
