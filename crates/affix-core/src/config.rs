//! affix.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::naming::{DEFAULT_GROUP_DELIMITER, DEFAULT_STORAGE_DELIMITER, DelimiterConvention};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AffixConfig {
    pub inventory: InventoryConfig,
    pub naming: NamingConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InventoryConfig {
    /// Path of the inventory database.
    pub path: PathBuf,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("affix.redb"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NamingConfig {
    pub group_delimiter: char,
    pub storage_delimiter: char,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            group_delimiter: DEFAULT_GROUP_DELIMITER,
            storage_delimiter: DEFAULT_STORAGE_DELIMITER,
        }
    }
}

impl NamingConfig {
    pub fn convention(&self) -> DelimiterConvention {
        DelimiterConvention::new(self.group_delimiter, self.storage_delimiter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on workloads evaluated in parallel.
    pub concurrency: usize,
    /// Check that rewritten destination names exist before resolving them.
    pub prevalidate_destinations: bool,
    /// Cluster used when the command line names none.
    pub default_cluster: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            prevalidate_destinations: true,
            default_cluster: None,
        }
    }
}

impl AffixConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AffixConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "engine.concurrency must be at least 1".to_string(),
            ));
        }
        if self.naming.group_delimiter.is_alphanumeric()
            || self.naming.storage_delimiter.is_alphanumeric()
        {
            return Err(ConfigError::Invalid(
                "naming delimiters must not be alphanumeric".to_string(),
            ));
        }
        Ok(())
    }

    /// Scaffold a config for a single cluster.
    pub fn scaffold(default_cluster: Option<&str>) -> Self {
        AffixConfig {
            engine: EngineConfig {
                default_cluster: default_cluster.map(str::to_string),
                ..EngineConfig::default()
            },
            ..AffixConfig::default()
        }
    }
}
