//! Configuration types for oru
//!
//! One explicit value built at startup and handed to the pipeline. The
//! decoder itself takes no configuration.

use crate::error::OruError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct OruConfig {
    pub source: SourceConfiguration,
    pub store: StoreConfiguration,
    pub producer: ProducerConfiguration,
    pub logging: LoggingConfiguration,
}

/// Message queue (spool) configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceConfiguration {
    /// Root directory of the spool queue
    pub spool_dir: PathBuf,
    /// Topic messages are published to and consumed from
    pub topic: String,
    /// Consumer group whose committed offset is tracked
    pub group_id: String,
    /// Delay between polls when the topic is drained
    pub poll_interval_ms: u64,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfiguration {
    pub data_dir: PathBuf,
    pub database: String,
    pub collection: String,
}

/// File-system producer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProducerConfiguration {
    /// Directory whose files are published, one message per file
    pub input_dir: PathBuf,
    /// Capacity of the delivery-report channel
    pub delivery_channel_capacity: usize,
    /// How long to wait for outstanding delivery reports
    pub flush_timeout_secs: u64,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfiguration {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    pub format: LogFormat,
}

impl Default for SourceConfiguration {
    fn default() -> Self {
        Self {
            spool_dir: PathBuf::from("spool"),
            topic: "hl7".to_string(),
            group_id: "hl7-ingest".to_string(),
            poll_interval_ms: 500,
        }
    }
}

impl Default for StoreConfiguration {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database: "Hl7MessagesDatabase".to_string(),
            collection: "MessagesCollection".to_string(),
        }
    }
}

impl Default for ProducerConfiguration {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("msghl7"),
            delivery_channel_capacity: 64,
            flush_timeout_secs: 15,
        }
    }
}

impl Default for LoggingConfiguration {
    fn default() -> Self {
        Self {
            filter: "oru=info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Values that override the loaded configuration (CLI flags / environment)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub spool_dir: Option<PathBuf>,
    pub topic: Option<String>,
    pub group_id: Option<String>,
    pub store_dir: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
}

impl OruConfig {
    /// Load from a file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self, OruError> {
        let content = fs::read_to_string(path).map_err(|e| OruError::io_error(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        let parsed = match ext {
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            _ => Err("unsupported file extension (expected .toml, .json, .yaml or .yml)".to_string()),
        };

        parsed.map_err(|message| {
            OruError::config_error(format!("Failed to parse '{}': {}", path.display(), message))
        })
    }

    /// Apply overrides in place
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(spool_dir) = overrides.spool_dir {
            self.source.spool_dir = spool_dir;
        }
        if let Some(topic) = overrides.topic {
            self.source.topic = topic;
        }
        if let Some(group_id) = overrides.group_id {
            self.source.group_id = group_id;
        }
        if let Some(store_dir) = overrides.store_dir {
            self.store.data_dir = store_dir;
        }
        if let Some(input_dir) = overrides.input_dir {
            self.producer.input_dir = input_dir;
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), OruError> {
        let names = [
            ("source.topic", &self.source.topic),
            ("source.groupId", &self.source.group_id),
            ("store.database", &self.store.database),
            ("store.collection", &self.store.collection),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(OruError::config_error(format!("{key} must not be empty")));
            }
            if value.contains(['/', '\\']) || value == "." || value == ".." {
                return Err(OruError::config_error(format!(
                    "{key} must be a plain name, got '{value}'"
                )));
            }
        }

        if self.source.poll_interval_ms == 0 {
            return Err(OruError::config_error(
                "source.pollIntervalMs must be at least 1",
            ));
        }

        if self.producer.delivery_channel_capacity == 0 {
            return Err(OruError::config_error(
                "producer.deliveryChannelCapacity must be at least 1",
            ));
        }

        Ok(())
    }

    /// Serialize as TOML
    pub fn to_toml(&self) -> Result<String, OruError> {
        toml::to_string_pretty(self).map_err(|e| OruError::config_error(e.to_string()))
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String, OruError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = OruConfig::default();
        assert_eq!(config.source.topic, "hl7");
        assert_eq!(config.store.database, "Hl7MessagesDatabase");
        assert_eq!(config.store.collection, "MessagesCollection");
        assert_eq!(config.producer.flush_timeout_secs, 15);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".orurc.toml");
        fs::write(
            &path,
            r#"
[source]
topic = "lab-results"
pollIntervalMs = 50

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = OruConfig::load(&path).unwrap();
        assert_eq!(config.source.topic, "lab-results");
        assert_eq!(config.source.poll_interval_ms, 50);
        assert_eq!(config.source.group_id, "hl7-ingest");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.store, StoreConfiguration::default());
    }

    #[test]
    fn test_load_json_and_yaml() {
        let temp_dir = TempDir::new().unwrap();

        let json = temp_dir.path().join("oru.json");
        fs::write(&json, r#"{"store": {"collection": "Results"}}"#).unwrap();
        assert_eq!(OruConfig::load(&json).unwrap().store.collection, "Results");

        let yaml = temp_dir.path().join("oru.yaml");
        fs::write(&yaml, "source:\n  groupId: nightly\n").unwrap();
        assert_eq!(OruConfig::load(&yaml).unwrap().source.group_id, "nightly");
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("oru.ini");
        fs::write(&path, "topic=x").unwrap();
        let err = OruConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported file extension"));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = OruConfig::default();
        config.apply_overrides(ConfigOverrides {
            topic: Some("adt".to_string()),
            store_dir: Some(PathBuf::from("/var/lib/oru")),
            ..Default::default()
        });
        assert_eq!(config.source.topic, "adt");
        assert_eq!(config.store.data_dir, PathBuf::from("/var/lib/oru"));
        assert_eq!(config.source.group_id, "hl7-ingest");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = OruConfig::default();
        config.source.topic = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = OruConfig::default();
        config.store.collection = "../escape".to_string();
        assert!(config.validate().is_err());

        let mut config = OruConfig::default();
        config.producer.delivery_channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let config: OruConfig = toml::from_str("[source]\npollIntervalMs = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source.pollIntervalMs"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = OruConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: OruConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
