// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::model::{Lifetime, DEFAULT_ACCESS_BUDGET, DEFAULT_TIMEOUT};
use crate::soak::SoakConfig;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
pub const TEST: &str = "test";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "managedmap")]
    pub managedmap: MapBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub map: Option<Map>,
    pub soak: Option<Soak>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

/// Default lifetime of map entries. Zero in either field means unbounded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Map {
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(rename = "access_budget")]
    pub access_budget: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Soak {
    pub writers: Option<usize>,
    pub readers: Option<usize>,
    pub removers: Option<usize>,
    pub keys: Option<u64>,
    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,
    #[serde(rename = "report_interval", default, with = "humantime_serde")]
    pub report_interval: Option<Duration>,
    #[serde(rename = "close_timeout", default, with = "humantime_serde")]
    pub close_timeout: Option<Duration>,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn lifetime(&self) -> Lifetime;
    fn soak(&self) -> SoakConfig;
}

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.managedmap.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.managedmap.env == PROD
    }

    fn is_test(&self) -> bool {
        self.managedmap.env == TEST
    }

    fn lifetime(&self) -> Lifetime {
        let map = self.managedmap.map.as_ref();
        let timeout = map.and_then(|m| m.timeout).unwrap_or(DEFAULT_TIMEOUT);
        let budget = map.and_then(|m| m.access_budget).unwrap_or(DEFAULT_ACCESS_BUDGET);
        Lifetime::new(timeout, budget)
    }

    fn soak(&self) -> SoakConfig {
        let defaults = SoakConfig::default();
        let Some(soak) = self.managedmap.soak.as_ref() else {
            return defaults;
        };
        SoakConfig {
            writers: soak.writers.unwrap_or(defaults.writers),
            readers: soak.readers.unwrap_or(defaults.readers),
            removers: soak.removers.unwrap_or(defaults.removers),
            keys: soak.keys.unwrap_or(defaults.keys),
            duration: soak.duration.unwrap_or(defaults.duration),
            report_interval: soak.report_interval.unwrap_or(defaults.report_interval),
            close_timeout: soak.close_timeout.unwrap_or(defaults.close_timeout),
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        // Read file
        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::from_yaml(&data).with_context(|| format!("unmarshal yaml from {:?}", abs_path))
    }

    /// Parses and validates configuration from YAML text.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data)?;

        if let Some(soak) = cfg.managedmap.soak.as_ref() {
            if soak.keys == Some(0) {
                anyhow::bail!("soak.keys must be greater than zero");
            }
            if soak.report_interval == Some(Duration::ZERO) {
                anyhow::bail!("soak.report_interval must be greater than zero");
            }
        }

        Ok(cfg)
    }
}

// Test config is always available for tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
managedmap:
  env: dev
  logs:
    level: info
  map:
    timeout: 5ms
    access_budget: 0
  soak:
    writers: 3
    keys: 64
    duration: 2s
"#;

    #[test]
    fn test_parse_yaml() {
        let cfg = Config::from_yaml(YAML).unwrap();
        assert!(!cfg.is_prod());
        assert_eq!(cfg.logs().and_then(|l| l.level.as_deref()), Some("info"));

        let lifetime = cfg.lifetime();
        assert_eq!(lifetime.timeout(), Some(Duration::from_millis(5)));
        assert_eq!(lifetime.access_budget(), None);

        let soak = cfg.soak();
        assert_eq!(soak.writers, 3);
        assert_eq!(soak.keys, 64);
        assert_eq!(soak.duration, Duration::from_secs(2));
        assert_eq!(soak.readers, SoakConfig::default().readers);
    }

    #[test]
    fn test_missing_map_section_uses_defaults() {
        let cfg = Config::from_yaml("managedmap:\n  env: prod\n").unwrap();
        assert!(cfg.is_prod());
        assert_eq!(cfg.lifetime(), Lifetime::default());
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let cfg = Config::from_yaml("managedmap:\n  env: dev\n  map:\n    timeout: 0s\n").unwrap();
        assert_eq!(cfg.lifetime().timeout(), None);
        assert_eq!(cfg.lifetime().access_budget().map(|n| n.get()), Some(1));
    }

    #[test]
    fn test_rejects_zero_keys() {
        let err = Config::from_yaml("managedmap:\n  env: dev\n  soak:\n    keys: 0\n").unwrap_err();
        assert!(err.to_string().contains("soak.keys"));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load("does/not/exist.yaml").unwrap_err();
        assert!(err.to_string().contains("failed to resolve"));
    }

    #[test]
    fn test_test_config() {
        let cfg = new_test_config();
        assert!(cfg.is_test());
        assert_eq!(cfg.lifetime().timeout(), Some(Duration::from_millis(50)));
    }
}
