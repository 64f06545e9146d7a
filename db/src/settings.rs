//! Run settings for merge and repair passes.
//!
//! Defines the YAML-serializable settings that control how fragments are
//! merged, whether unmet dependencies are repaired, and how `.config` lines
//! are prefixed. Every field is optional; missing fields take their defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! fix_dependencies: true
//! max_rounds: 32
//! merge_strategy: prefer-overlay
//! config_prefix: CONFIG_
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use confmerge_core::{DEFAULT_MAX_ROUNDS, MergeStrategy, ProcessOptions};
use serde::{Deserialize, Serialize};

use crate::config_file::DEFAULT_PREFIX;
use crate::error::Result;

/// Settings for one merge-and-check run.
///
/// # Examples
///
/// ```
/// # use confmerge_db::RunSettings;
/// let settings: RunSettings = serde_yaml::from_str("fix_dependencies: true").unwrap();
/// assert!(settings.fix_dependencies);
/// assert_eq!(settings.max_rounds, 64);
/// assert_eq!(settings.config_prefix, "CONFIG_");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Repair unmet dependencies instead of only reporting them.
    pub fix_dependencies: bool,
    /// Round cap for the repair engine.
    pub max_rounds: usize,
    /// Which fragment wins when two assign the same symbol.
    pub merge_strategy: MergeStrategy,
    /// Prefix in front of symbol names in `.config` files.
    pub config_prefix: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            fix_dependencies: false,
            max_rounds: DEFAULT_MAX_ROUNDS,
            merge_strategy: MergeStrategy::default(),
            config_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl RunSettings {
    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let settings = serde_yaml::from_reader(reader)?;
        Ok(settings)
    }

    /// Saves the settings as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Options for [`confmerge_core::process`].
    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            attempt_repair: self.fix_dependencies,
            max_rounds: self.max_rounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_complete() {
        let yaml = r#"
fix_dependencies: true
max_rounds: 8
merge_strategy: prefer-overlay
config_prefix: BR2_
"#;
        let settings: RunSettings = serde_yaml::from_str(yaml).unwrap();
        assert!(settings.fix_dependencies);
        assert_eq!(settings.max_rounds, 8);
        assert_eq!(settings.merge_strategy, MergeStrategy::PreferOverlay);
        assert_eq!(settings.config_prefix, "BR2_");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: RunSettings = serde_yaml::from_str("max_rounds: 3").unwrap();
        assert_eq!(
            settings,
            RunSettings {
                max_rounds: 3,
                ..RunSettings::default()
            }
        );
    }

    #[test]
    fn test_process_options() {
        let settings = RunSettings {
            fix_dependencies: true,
            max_rounds: 5,
            ..RunSettings::default()
        };
        let options = settings.process_options();
        assert!(options.attempt_repair);
        assert_eq!(options.max_rounds, 5);
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yml");

        let original = RunSettings {
            fix_dependencies: true,
            merge_strategy: MergeStrategy::PreferOverlay,
            ..RunSettings::default()
        };
        original.save(&path).unwrap();

        assert_eq!(RunSettings::load(&path).unwrap(), original);
    }
}
