//! Dashboard configuration read from the environment.

use std::path::PathBuf;

use thiserror::Error;

use crate::view::{ViewQuery, DEFAULT_PAGE_SIZE};

/// Public JSONPlaceholder. It does not store writes and answers every create
/// with id 11, so a second add in the same session collides with the first
/// and is rolled back as `IdConflict(11)`. Point `USER_DASHBOARD_API_URL` at
/// the mock server to exercise repeated creates.
pub const DEFAULT_API_URL: &str = "https://jsonplaceholder.typicode.com";

pub const ENV_API_URL: &str = "USER_DASHBOARD_API_URL";
pub const ENV_PAGE_SIZE: &str = "USER_DASHBOARD_PAGE_SIZE";
pub const ENV_SETTINGS: &str = "USER_DASHBOARD_SETTINGS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("USER_DASHBOARD_PAGE_SIZE must be a positive integer, got {0:?}")]
    InvalidPageSize(String),

    #[error("USER_DASHBOARD_API_URL must not be empty")]
    EmptyApiUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub base_url: String,
    pub page_size: usize,
    /// Where theme and current-user preferences are stored; in-memory only
    /// when unset.
    pub settings_path: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            settings_path: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::EmptyApiUrl);
            }
            config.base_url = url.to_string();
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            config.page_size = match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => return Err(ConfigError::InvalidPageSize(raw)),
            };
        }
        config.settings_path = lookup(ENV_SETTINGS)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Initial list query using the configured page size.
    pub fn view_query(&self) -> ViewQuery {
        ViewQuery::with_page_size(self.page_size)
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
    fn defaults_when_nothing_is_set() {
        let config = DashboardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.view_query().page_size, 5);
    }

    #[test]
    fn reads_every_variable() {
        let config = DashboardConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://127.0.0.1:3000"),
            (ENV_PAGE_SIZE, "10"),
            (ENV_SETTINGS, "/tmp/dashboard.json"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.settings_path, Some(PathBuf::from("/tmp/dashboard.json")));
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = DashboardConfig::from_lookup(lookup(&[(ENV_PAGE_SIZE, "0")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPageSize("0".to_string()));
    }

    #[test]
    fn rejects_blank_url() {
        let err = DashboardConfig::from_lookup(lookup(&[(ENV_API_URL, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyApiUrl);
    }
}
