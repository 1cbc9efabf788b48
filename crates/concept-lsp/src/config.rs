//! Server configuration.
//!
//! Values come from the environment and are overridden by the client's
//! `initializationOptions`:
//!
//! | Setting               | Environment                        | Option              |
//! |-----------------------|------------------------------------|---------------------|
//! | concept catalog path  | `CONCEPT_CATALOG`                  | `catalogPath`       |
//! | publish interval (ms) | `CONCEPT_LSP_PUBLISH_INTERVAL_MS`  | `publishIntervalMs` |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

pub const CATALOG_ENV: &str = "CONCEPT_CATALOG";
pub const PUBLISH_INTERVAL_ENV: &str = "CONCEPT_LSP_PUBLISH_INTERVAL_MS";

/// Default interval between diagnostics publish passes.
pub const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 300;

/// A configuration value that parsed but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("publish interval must be greater than zero")]
    ZeroPublishInterval,

    #[error("concept catalog path is empty")]
    EmptyCatalogPath,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Catalog file or directory; the built-in catalog when unset
    pub catalog_path: Option<PathBuf>,
    pub publish_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            publish_interval_ms: DEFAULT_PUBLISH_INTERVAL_MS,
        }
    }
}

/// Client-supplied overrides; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct InitializationOptions {
    catalog_path: Option<PathBuf>,
    publish_interval_ms: Option<u64>,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup(CATALOG_ENV).filter(|p| !p.trim().is_empty()) {
            config.catalog_path = Some(PathBuf::from(path));
        }

        if let Some(interval) = lookup(PUBLISH_INTERVAL_ENV) {
            config.publish_interval_ms = interval
                .trim()
                .parse()
                .with_context(|| format!("Invalid {PUBLISH_INTERVAL_ENV} value '{interval}'"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply `initializationOptions` from the `initialize` request.
    pub fn merge_initialization_options(
        mut self,
        options: Option<&serde_json::Value>,
    ) -> Result<Self> {
        let Some(options) = options.filter(|value| !value.is_null()) else {
            return Ok(self);
        };

        let options: InitializationOptions = serde_json::from_value(options.clone())
            .context("Invalid initializationOptions")?;

        if let Some(path) = options.catalog_path {
            self.catalog_path = Some(path);
        }
        if let Some(interval) = options.publish_interval_ms {
            self.publish_interval_ms = interval;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publish_interval_ms == 0 {
            return Err(ConfigError::ZeroPublishInterval);
        }
        if self
            .catalog_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyCatalogPath);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.publish_interval(), Duration::from_millis(300));
    }

    #[test]
    fn test_environment_values() {
        let config = ServerConfig::from_lookup(lookup(&[
            (CATALOG_ENV, "/etc/concepts"),
            (PUBLISH_INTERVAL_ENV, " 50 "),
        ]))
        .unwrap();
        assert_eq!(config.catalog_path, Some(PathBuf::from("/etc/concepts")));
        assert_eq!(config.publish_interval_ms, 50);
    }

    #[test]
    fn test_invalid_interval() {
        let err = ServerConfig::from_lookup(lookup(&[(PUBLISH_INTERVAL_ENV, "soon")])).unwrap_err();
        assert!(err.to_string().contains(PUBLISH_INTERVAL_ENV));
        let err = ServerConfig::from_lookup(lookup(&[(PUBLISH_INTERVAL_ENV, "0")])).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroPublishInterval)
        );
    }

    #[test]
    fn test_empty_catalog_option_rejected() {
        let err = ServerConfig::default()
            .merge_initialization_options(Some(&json!({ "catalogPath": "" })))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::EmptyCatalogPath));
    }

    #[test]
    fn test_initialization_options_override() {
        let options = json!({ "catalogPath": "concepts.yaml", "publishIntervalMs": 1000 });
        let config = ServerConfig::default()
            .merge_initialization_options(Some(&options))
            .unwrap();
        assert_eq!(config.catalog_path, Some(PathBuf::from("concepts.yaml")));
        assert_eq!(config.publish_interval_ms, 1000);
    }

    #[test]
    fn test_partial_and_missing_options() {
        let base = ServerConfig {
            catalog_path: Some(PathBuf::from("env.yaml")),
            publish_interval_ms: 200,
        };
        let merged = base
            .clone()
            .merge_initialization_options(Some(&json!({ "publishIntervalMs": 100 })))
            .unwrap();
        assert_eq!(merged.catalog_path, Some(PathBuf::from("env.yaml")));
        assert_eq!(merged.publish_interval_ms, 100);

        assert_eq!(base.clone().merge_initialization_options(None).unwrap(), base);
        assert_eq!(
            base.clone()
                .merge_initialization_options(Some(&serde_json::Value::Null))
                .unwrap(),
            base
        );
        assert!(base
            .merge_initialization_options(Some(&json!({ "publishIntervalMs": "fast" })))
            .is_err());
    }
}
