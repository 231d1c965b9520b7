//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/twentyq/twentyq.toml`
//! 3. Environment variables: `TWENTYQ_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Default number of buckets in the question index.
pub const DEFAULT_INDEX_BUCKETS: usize = 128;

/// Unified configuration for twentyq.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Knowledge file (default: <data dir>/twentyq/knowledge.atl)
    pub data_file: PathBuf,
    /// Bucket count of the question index, fixed for the session
    pub index_buckets: usize,
    /// Load `data_file` when a session starts
    pub autoload: bool,
    /// Save to `data_file` when a session ends
    pub autosave: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            index_buckets: DEFAULT_INDEX_BUCKETS,
            autoload: true,
            autosave: false,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub index_buckets: Option<usize>,
    pub autoload: Option<bool>,
    pub autosave: Option<bool>,
}

fn default_data_file() -> PathBuf {
    ProjectDirs::from("", "", "twentyq")
        .map(|dirs| dirs.data_dir().join("knowledge.atl"))
        .unwrap_or_else(|| PathBuf::from("~/.twentyq/knowledge.atl"))
}

/// Get the XDG config directory for twentyq.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "twentyq").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("twentyq.toml"))
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~` and `$VAR` in the data file path.
    fn expand_paths(&mut self) {
        let raw = self.data_file.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        self.data_file = PathBuf::from(expanded);
    }

    /// Overlay wins where it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            index_buckets: overlay.index_buckets.unwrap_or(self.index_buckets),
            autoload: overlay.autoload.unwrap_or(self.autoload),
            autosave: overlay.autosave.unwrap_or(self.autosave),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit config file used instead of the global one
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        let file = config_file
            .map(Path::to_path_buf)
            .or_else(global_config_path);
        if let Some(path) = file {
            if path.exists() {
                let raw = load_raw_settings(&path)?;
                current = current.merge_with(&raw);
            } else if config_file.is_some() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply TWENTYQ_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("TWENTYQ").try_parsing(true))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get::<usize>("index_buckets") {
            settings.index_buckets = val;
        }
        if let Ok(val) = config.get_bool("autoload") {
            settings.autoload = val;
        }
        if let Ok(val) = config.get_bool("autosave") {
            settings.autosave = val;
        }
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.index_buckets == 0 {
            return Err(ApplicationError::Config {
                message: "index_buckets must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# twentyq configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/twentyq/twentyq.toml
#   Env:    TWENTYQ_* environment variables (e.g. TWENTYQ_AUTOSAVE=true)

# Knowledge file loaded and saved by the interactive session
# data_file = "~/.local/share/twentyq/knowledge.atl"

# Buckets of the question index (fixed, no rehashing)
# index_buckets = 128

# Load data_file when a session starts
# autoload = true

# Save data_file when a session ends
# autosave = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_then_sensible_values() {
        let settings = Settings::default();
        assert!(settings.data_file.ends_with("knowledge.atl"));
        assert_eq!(settings.index_buckets, DEFAULT_INDEX_BUCKETS);
        assert!(settings.autoload);
        assert!(!settings.autosave);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_only_specified_fields_change() {
        let base = Settings::default();
        let overlay = RawSettings {
            index_buckets: Some(7),
            autosave: Some(true),
            ..Default::default()
        };
        let merged = base.merge_with(&overlay);
        assert_eq!(merged.index_buckets, 7);
        assert!(merged.autosave);
        assert_eq!(merged.data_file, base.data_file);
        assert_eq!(merged.autoload, base.autoload);
    }

    #[test]
    fn given_tilde_in_data_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_file: PathBuf::from("~/kb.atl"),
            ..Default::default()
        };
        settings.expand_paths();
        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.data_file.starts_with(&home));
    }

    #[test]
    fn given_zero_buckets_when_validating_then_config_error() {
        let settings = Settings {
            index_buckets: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Config { .. })
        ));
    }

    #[test]
    fn given_template_when_parsed_then_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.data_file.is_none());
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        let raw: RawSettings = toml::from_str(&text).unwrap();
        assert_eq!(settings.merge_with(&raw), settings);
    }
}
