use std::path::{Path, PathBuf};

use anyhow::Result;
use common::config::{LoadFromTomlFile, SaveToTomlFile};
use getset::Getters;
use serde::{Deserialize, Serialize};
use simplelog::{info, warn};

use crate::storage::Storage;

const DEFAULT_BUS_ADDRESS: &str = "127.0.0.1:3101";

#[derive(Serialize, Deserialize, Getters)]
pub struct Config {
    #[getset(get = "pub")]
    database: PathBuf,
    /// Initial bucket rules. Left empty, the configuration is requested over the bus.
    #[serde(default)]
    #[getset(get = "pub")]
    ranges: Vec<RangeRule>,
    #[getset(get = "pub")]
    bus: BusConfig,
}

#[derive(Serialize, Deserialize, Getters)]
pub struct BusConfig {
    #[getset(get = "pub")]
    address: String,
}

/// Routes devices whose id matches `regex` to the postmarks `[from, to]`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RangeRule {
    pub regex: String,
    pub from: u32,
    pub to: u32,
}

impl Config {
    fn new_empty() -> Self {
        Self {
            database: Storage::postmarks_file(),
            ranges: Vec::new(),
            bus: BusConfig {
                address: DEFAULT_BUS_ADDRESS.to_string(),
            },
        }
    }

    pub fn new_filled(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            warn!("No configuration found at {:?}, writing defaults", path);
            let config = Self::new_empty();
            config.save(path, true)?;
            Ok(config)
        }
    }

    pub fn override_bus(&mut self, address: String) {
        info!("Using message bus at {} instead of the configured one", address);
        self.bus.address = address;
    }
}

impl LoadFromTomlFile for Config {}
impl SaveToTomlFile for Config {}
