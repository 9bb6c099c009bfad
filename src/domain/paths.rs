//! # Data Paths
//!
//! Centralized definitions for where the bot keeps its files inside the data directory.

use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_CONFIG_FILE: &str = "data/config.yaml";
pub const STICKY_CONFIG_FILE: &str = "sticky.yaml";
pub const SEEN_ITEMS_FILE: &str = "seen_items.json";
pub const SESSION_LOG_FILE: &str = "session.log";

/// Returns the path of the poller configuration (e.g. "data/sticky.yaml")
pub fn sticky_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STICKY_CONFIG_FILE)
}

/// Returns the path of the dedup store file
pub fn seen_items_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SEEN_ITEMS_FILE)
}
