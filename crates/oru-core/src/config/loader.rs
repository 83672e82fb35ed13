//! Configuration file discovery and loading

use super::oru_config::OruConfig;
use crate::error::OruError;
use std::path::{Path, PathBuf};

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, OruError>;

/// Config file names, in discovery priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".orurc.toml",
    ".orurc.json",
    "oru.yaml",
    "oru.yml",
    "oru.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by traversing upward from `start_path`
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| OruError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<OruConfig> {
        OruConfig::load(path)
    }

    /// Load config from an explicit path, or auto-discover, or fall back to defaults
    ///
    /// An explicit path that does not exist is an error; a failed discovery
    /// is not.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<OruConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(OruError::config_error(format!(
                    "Config file not found: {}. Run 'oru config init' to create one.",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(OruConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_auto_discover_from_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("feeds/lab");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "oru.json", r#"{"source": {"topic": "lab"}}"#);

        let found = ConfigLoader::auto_discover(&nested).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), "oru.json");
    }

    #[test]
    fn test_auto_discover_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "oru.json", "{}");
        create_temp_config(temp_dir.path(), "oru.yaml", "{}");
        create_temp_config(temp_dir.path(), ".orurc.toml", "");

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), ".orurc.toml");
    }

    #[test]
    fn test_load_discovered_config() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(
            temp_dir.path(),
            ".orurc.toml",
            "[store]\ncollection = \"Observations\"\n",
        );

        let config = ConfigLoader::load(None, Some(temp_dir.path())).unwrap();
        assert_eq!(config.store.collection, "Observations");
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = ConfigLoader::load(Some(Path::new("does-not-exist.toml")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(temp_dir.path(), "oru.json", "{ invalid json }");
        assert!(ConfigLoader::load_from_file(&path).is_err());
    }
}
