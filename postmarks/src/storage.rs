/*
All the storage related paths are defined here.
This makes it easier to change them in the future
*/

use std::path::PathBuf;

/* Logs */
const LOGS_DIRECTORY: &str = "logs";
const LATEST_LOG_FILE: &str = "latest.log";

/* Configs */
const CONFIG_DIRECTORY: &str = "configs";
const PRIMARY_CONFIG_FILE: &str = "config.toml";

/* Data */
const DATA_DIRECTORY: &str = "data";
const POSTMARKS_FILE: &str = "postmarks.toml";

pub struct Storage;

impl Storage {
    /* Logs */
    pub fn latest_log_file() -> PathBuf {
        PathBuf::from(LOGS_DIRECTORY).join(LATEST_LOG_FILE)
    }

    /* Configs */
    pub fn configs_directory() -> PathBuf {
        PathBuf::from(CONFIG_DIRECTORY)
    }
    pub fn primary_config_file() -> PathBuf {
        Storage::configs_directory().join(PRIMARY_CONFIG_FILE)
    }

    /* Data */
    pub fn data_directory() -> PathBuf {
        PathBuf::from(DATA_DIRECTORY)
    }
    pub fn postmarks_file() -> PathBuf {
        Storage::data_directory().join(POSTMARKS_FILE)
    }
}
