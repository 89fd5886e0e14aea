use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Server origin, without the `/api` suffix.
    pub base_url: String,
    /// Period of the silent background re-check.
    pub revalidate_interval: Duration,
    pub request_timeout: Duration,
    /// Where denied navigations are sent.
    pub denied_path: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            revalidate_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            denied_path: "/acceso-denegado".to_string(),
        }
    }
}

impl GuardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup("CERBERO_API_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("CERBERO_GUARD_INTERVAL_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Interval(raw))?;
            config.revalidate_interval = Duration::from_secs(secs);
        }
        Ok(config)
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(GuardConfig::from_lookup(lookup(&[])).unwrap(), GuardConfig::default());
    }

    #[test]
    fn reads_url_and_interval() {
        let config = GuardConfig::from_lookup(lookup(&[
            ("CERBERO_API_URL", "https://erp.example.com/"),
            ("CERBERO_GUARD_INTERVAL_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://erp.example.com");
        assert_eq!(config.revalidate_interval, Duration::from_secs(30));
    }

    #[test]
    fn zero_or_garbage_interval_is_rejected() {
        for raw in ["0", "soon"] {
            assert_eq!(
                GuardConfig::from_lookup(lookup(&[("CERBERO_GUARD_INTERVAL_SECS", raw)])),
                Err(ConfigError::Interval(raw.to_string()))
            );
        }
    }
}
