use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Result;
use common::config::{LoadFromTomlFile, SaveToTomlFile};
use serde::{Deserialize, Serialize};
use simplelog::{debug, info};

/// Durable mapping from device id to postmark.
pub trait PostmarkStore {
    fn lookup(&self, device: &str) -> Result<Option<u32>>;
    /// Returns `true` if the stored postmark of `device` changed.
    fn upsert(&mut self, device: &str, postmark: u32) -> Result<bool>;
    /// Returns `false` if there was nothing stored for `device`.
    fn remove(&mut self, device: &str) -> Result<bool>;
    fn records(&self) -> Result<Vec<(String, u32)>>;
}

#[derive(Serialize, Deserialize, Default)]
struct StoredPostmarks {
    #[serde(default)]
    postmarks: BTreeMap<String, u32>,
}

impl LoadFromTomlFile for StoredPostmarks {}
impl SaveToTomlFile for StoredPostmarks {}

/// Keeps all records in memory and rewrites the whole file on every change.
pub struct TomlStore {
    path: PathBuf,
    stored: StoredPostmarks,
}

impl TomlStore {
    pub fn open(path: &Path) -> Result<Self> {
        let stored = if path.exists() {
            StoredPostmarks::from_file(path)?
        } else {
            StoredPostmarks::default()
        };
        info!(
            "Loaded {} stored postmarks from {:?}",
            stored.postmarks.len(),
            path
        );
        Ok(Self {
            path: path.to_path_buf(),
            stored,
        })
    }

    fn flush(&self) -> Result<()> {
        debug!("Writing {} postmarks to {:?}", self.stored.postmarks.len(), self.path);
        self.stored.save(&self.path, true)
    }
}

impl PostmarkStore for TomlStore {
    fn lookup(&self, device: &str) -> Result<Option<u32>> {
        Ok(self.stored.postmarks.get(device).copied())
    }

    fn upsert(&mut self, device: &str, postmark: u32) -> Result<bool> {
        if self.stored.postmarks.insert(device.to_string(), postmark) == Some(postmark) {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    fn remove(&mut self, device: &str) -> Result<bool> {
        if self.stored.postmarks.remove(device).is_none() {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    fn records(&self) -> Result<Vec<(String, u32)>> {
        Ok(self
            .stored
            .postmarks
            .iter()
            .map(|(device, postmark)| (device.clone(), *postmark))
            .collect())
    }
}
