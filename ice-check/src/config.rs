//! Check scheduling parameters.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ConfigError: \"Io\" {0}")]
    Io(#[from] io::Error),
    #[error("ConfigError: \"InvalidValue\" {key} = {value}")]
    InvalidValue { key: String, value: String },
    #[error("ConfigError: \"Json\" {0}")]
    Json(#[from] serde_json::Error),
}

/// Values the external scheduler reads when driving the entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Pacing between two checks of the checklist (Ta).
    pub check_interval_ms: u64,
    /// Checks without response before an entry is declared failed.
    pub max_checks: u32,
    /// Interval between keep-alives on a nominated pair.
    pub keepalive_interval_ms: u64,
    /// Lifetime of a TURN permission before it must be reinstalled.
    pub permission_lifetime_ms: u64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 50,
            max_checks: 7,
            keepalive_interval_ms: 15_000,
            permission_lifetime_ms: 300_000,
        }
    }
}

impl CheckConfig {
    /// Loads a `key = value` file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(CheckConfig::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_kv(&content)
    }

    pub fn from_kv(content: &str) -> Result<Self, ConfigError> {
        let mut cfg = CheckConfig::default();
        let entries = parse_kv(content);

        if let Some(v) = entries.get("check_interval_ms") {
            cfg.check_interval_ms = parse_value("check_interval_ms", v)?;
        }
        if let Some(v) = entries.get("max_checks") {
            cfg.max_checks = parse_value("max_checks", v)?;
        }
        if let Some(v) = entries.get("keepalive_interval_ms") {
            cfg.keepalive_interval_ms = parse_value("keepalive_interval_ms", v)?;
        }
        if let Some(v) = entries.get("permission_lifetime_ms") {
            cfg.permission_lifetime_ms = parse_value("permission_lifetime_ms", v)?;
        }

        Ok(cfg)
    }

    /// Parses a JSON document; absent fields keep their default.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    pub fn permission_lifetime(&self) -> Duration {
        Duration::from_millis(self.permission_lifetime_ms)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_kv(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            map.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let cfg = CheckConfig::load("/nonexistent/ice-check.conf").unwrap();
        assert_eq!(cfg, CheckConfig::default());
    }

    #[test]
    fn test_kv_overrides_and_comments() {
        let cfg = CheckConfig::from_kv(
            "# pacing\ncheck_interval_ms = 20\n\nmax_checks=3\nunknown = 1\n",
        )
        .unwrap();

        assert_eq!(cfg.check_interval(), Duration::from_millis(20));
        assert_eq!(cfg.max_checks, 3);
        assert_eq!(cfg.keepalive_interval_ms, 15_000);
    }

    #[test]
    fn test_kv_invalid_value() {
        let err = CheckConfig::from_kv("max_checks = many").unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, "max_checks");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_json_partial_document() {
        let cfg = CheckConfig::from_json(r#"{"max_checks": 9}"#).unwrap();
        assert_eq!(cfg.max_checks, 9);
        assert_eq!(cfg.permission_lifetime(), Duration::from_secs(300));
    }
}
