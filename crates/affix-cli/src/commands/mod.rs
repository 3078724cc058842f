pub mod balance;
pub mod config;
pub mod detect;
pub mod inventory;
pub mod remediate;
pub mod rogue;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tracing::debug;

use affix_core::AffixConfig;
use affix_inventory::InventoryStore;
use affix_placement::{Engine, EngineSettings};

const DEFAULT_CONFIG_FILE: &str = "affix.toml";

/// Configuration and inventory location shared by every command.
pub struct Context {
    pub config: AffixConfig,
    pub inventory_path: PathBuf,
}

impl Context {
    /// Read `config_path`, or `./affix.toml` when it exists, or fall back to
    /// defaults. `inventory` overrides the configured database path.
    pub fn load(config_path: Option<&Path>, inventory: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => AffixConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                AffixConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => AffixConfig::default(),
        };
        let inventory_path = inventory.unwrap_or_else(|| config.inventory.path.clone());
        debug!(inventory = %inventory_path.display(), "configuration loaded");
        Ok(Self {
            config,
            inventory_path,
        })
    }

    pub fn open_inventory(&self) -> anyhow::Result<InventoryStore> {
        InventoryStore::open(&self.inventory_path)
            .with_context(|| format!("opening inventory {}", self.inventory_path.display()))
    }

    pub fn engine(&self) -> anyhow::Result<Engine> {
        let inventory = self.open_inventory()?;
        Ok(Engine::new(
            Arc::new(inventory),
            Arc::new(self.config.naming.convention()),
            EngineSettings::from(&self.config.engine),
        ))
    }

    /// The cluster named on the command line, else the configured default.
    pub fn cluster(&self, cluster: Option<String>) -> anyhow::Result<String> {
        cluster
            .or_else(|| self.config.engine.default_cluster.clone())
            .context("no cluster given; pass --cluster or set [engine].default_cluster")
    }
}
