use std::{fs, path::Path};

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

pub trait SaveToTomlFile: Serialize {
    /// Writes to a sibling temporary file first and renames it over `path`,
    /// so a crash never leaves a half-written file behind.
    fn save(&self, path: &Path, create_parent: bool) -> Result<()> {
        if create_parent {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        let temporary = path.with_extension("toml.tmp");
        fs::write(&temporary, toml::to_string(self)?)?;
        fs::rename(&temporary, path)?;
        Ok(())
    }
}

pub trait LoadFromTomlFile: DeserializeOwned {
    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config = toml::from_str(&data)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use tempfile::tempdir;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        name: String,
        values: Vec<u32>,
    }

    impl SaveToTomlFile for Sample {}
    impl LoadFromTomlFile for Sample {}

    #[test]
    fn test_save_creates_parent_and_loads_back() {
        let directory = tempdir().unwrap();
        let path = directory.path().join("nested").join("sample.toml");
        let sample = Sample {
            name: "postmarks".to_string(),
            values: vec![1, 2, 3],
        };

        sample.save(&path, true).unwrap();
        assert_eq!(Sample::from_file(&path).unwrap(), sample);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let directory = tempdir().unwrap();
        assert!(Sample::from_file(&directory.path().join("missing.toml")).is_err());
    }
}
