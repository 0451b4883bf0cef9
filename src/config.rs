use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{RelmapError, Result};

/// Name of the configuration file stored inside the `.relmap` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory used to store relmap settings.
pub const RELMAP_DIR: &str = ".relmap";

/// Configuration for a relmap project.
///
/// Points at the schema snapshot to read and filters which collections are
/// scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelmapConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Schema snapshot file, relative to the project root unless absolute.
    pub snapshot_path: String,
    /// Glob patterns for collection names to include when scanning.
    pub include: Vec<String>,
    /// Glob patterns for collection names to exclude when scanning.
    pub exclude: Vec<String>,
    /// Default log filter, used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for RelmapConfig {
    fn default() -> Self {
        Self {
            version: 1,
            snapshot_path: "schema.json".to_string(),
            include: vec!["*".to_string()],
            exclude: vec!["directus_*".to_string()],
            log_level: "info".to_string(),
        }
    }
}

impl RelmapConfig {
    /// Resolves `snapshot_path` against the project root.
    pub fn snapshot_file(&self, project_root: &Path) -> PathBuf {
        let path = Path::new(&self.snapshot_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_root.join(path)
        }
    }
}

/// Returns the path to the `.relmap` directory within the given project root.
pub fn get_relmap_dir(project_root: &Path) -> PathBuf {
    project_root.join(RELMAP_DIR)
}

/// Returns the path to the configuration file (`config.json`) within the `.relmap` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_relmap_dir(project_root).join(CONFIG_FILENAME)
}

/// Loads the configuration from disk.
///
/// If the configuration file does not exist, returns the default configuration.
pub fn load_config(project_root: &Path) -> Result<RelmapConfig> {
    let config_path = get_config_path(project_root);

    if !config_path.exists() {
        return Ok(RelmapConfig::default());
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| RelmapError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    let config: RelmapConfig = serde_json::from_str(&contents).map_err(|e| RelmapError::Config {
        message: format!(
            "failed to parse config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    Ok(config)
}

/// Saves the configuration to disk using an atomic write.
///
/// Writes to a temporary file first and then renames it into place.
pub fn save_config(project_root: &Path, config: &RelmapConfig) -> Result<()> {
    let relmap_dir = get_relmap_dir(project_root);
    fs::create_dir_all(&relmap_dir).map_err(|e| RelmapError::Config {
        message: format!(
            "failed to create relmap directory '{}': {}",
            relmap_dir.display(),
            e
        ),
    })?;

    let config_path = get_config_path(project_root);
    let tmp_path = config_path.with_extension("tmp");

    let json = serde_json::to_string_pretty(config).map_err(|e| RelmapError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, &json).map_err(|e| RelmapError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, &config_path).map_err(|e| RelmapError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            config_path.display(),
            e
        ),
    })?;

    Ok(())
}

/// Determines whether a collection should be scanned based on the
/// configuration's include and exclude glob patterns.
///
/// Exclude patterns take precedence; a collection must match at least one
/// include pattern. Invalid patterns are skipped.
pub fn should_include_collection(collection: &str, config: &RelmapConfig) -> bool {
    let matches = |pattern_str: &String| {
        Pattern::new(pattern_str)
            .map(|pattern| pattern.matches(collection))
            .unwrap_or(false)
    };

    if config.exclude.iter().any(matches) {
        return false;
    }

    config.include.iter().any(matches)
}
