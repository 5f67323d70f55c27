//! Registry configuration
//!
//! Settings are read from TOML, every key optional:
//!
//! ```toml
//! version = 1
//! path_separator = "."
//! trace_registration = true
//! path_cache = true
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mirror_core::{init, MirrorConfig};
//!
//! let config = MirrorConfig::load_or_create(&mirror_core::config::config_path())?;
//! init(config)?;
//! ```

mod loader;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use loader::{config_path, CONFIG_ENV, CONFIG_FILE};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A setting holds a value the registry cannot use
    #[error("Invalid setting {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Process-wide registry settings, installed with [`crate::init`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Separator between the segments of a property path
    pub path_separator: char,

    /// Log each class registration at debug level (trace level otherwise)
    pub trace_registration: bool,

    /// Cache resolved property paths
    pub path_cache: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            version: 1,
            path_separator: '.',
            trace_registration: true,
            path_cache: true,
        }
    }
}

impl MirrorConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> ConfigResult<()> {
        let sep = self.path_separator;
        if sep.is_alphanumeric() || sep == '_' || sep.is_whitespace() {
            return Err(ConfigError::InvalidValue {
                key: "path_separator",
                reason: format!("'{sep}' can appear inside member names"),
            });
        }
        Ok(())
    }

    /// Load config from `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded registry config from {:?}", path);
        Ok(config)
    }

    /// Load config from `path`, creating a default file if missing.
    pub fn load_or_create(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let default = Self::default();
            default.save(path)?;
            tracing::info!("Created default registry config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to `path`.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml_string()?)?;
        tracing::debug!("Saved registry config to {:?}", path);
        Ok(())
    }

    /// Reload config from `path`.
    ///
    /// Leaves `self` untouched if reading or validation fails.
    pub fn reload(&mut self, path: &Path) -> ConfigResult<()> {
        *self = Self::load(path)?;
        tracing::debug!("Reloaded registry config from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("mirror-config-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_default_values() {
        let config = MirrorConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.path_separator, '.');
        assert!(config.trace_registration);
        assert!(config.path_cache);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MirrorConfig::from_toml_str("path_separator = \"/\"").unwrap();
        assert_eq!(config.path_separator, '/');
        assert!(config.path_cache);
    }

    #[test]
    fn test_serialize() {
        let config = MirrorConfig {
            version: 2,
            path_cache: false,
            ..MirrorConfig::default()
        };

        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("version = 2"));
        assert!(toml_str.contains("path_cache = false"));
        assert_eq!(MirrorConfig::from_toml_str(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_rejects_member_separator() {
        let err = MirrorConfig::from_toml_str("path_separator = \"a\"").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "path_separator",
                ..
            }
        ));
        assert!(matches!(
            MirrorConfig::from_toml_str("path_cache = 3"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_save_load_reload() {
        let path = scratch_file("roundtrip/mirror.toml");
        let created = MirrorConfig::load_or_create(&path).unwrap();
        assert_eq!(created, MirrorConfig::default());

        let changed = MirrorConfig {
            path_separator: ':',
            ..MirrorConfig::default()
        };
        changed.save(&path).unwrap();

        let mut current = created;
        current.reload(&path).unwrap();
        assert_eq!(current.path_separator, ':');

        std::fs::write(&path, "path_separator = \"x\"").unwrap();
        assert!(current.reload(&path).is_err());
        assert_eq!(current.path_separator, ':');

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
