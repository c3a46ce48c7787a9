//! Configuration management for the type registry
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (type-registry.toml)
//! - Environment variables (TYPE_REGISTRY__*)
//!
//! ## Example config file (type-registry.toml):
//! ```toml
//! [registry]
//! enforce_alignment = true
//!
//! [validation]
//! default_policy = "exact"
//!
//! [logging]
//! filter = "foreign_type_registry=debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main configuration for the type registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Registration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Reject alignments that are not a power of two, and sizes that are not
    /// a multiple of their alignment
    #[serde(default = "default_true")]
    pub enforce_alignment: bool,
}

/// Validation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Size rule used when a descriptor has no validation capability
    #[serde(default)]
    pub default_policy: SizePolicy,
}

/// Fallback size rule for `validate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizePolicy {
    /// Buffer size must equal the declared size
    #[default]
    Exact,
    /// Buffer size must be at least the declared size
    AtLeast,
}

impl SizePolicy {
    pub fn accepts(&self, declared: usize, actual: usize) -> bool {
        match self {
            SizePolicy::Exact => actual == declared,
            SizePolicy::AtLeast => actual >= declared,
        }
    }
}

impl fmt::Display for SizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizePolicy::Exact => write!(f, "exact"),
            SizePolicy::AtLeast => write!(f, "at_least"),
        }
    }
}

/// Logging settings for the command-line tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_true() -> bool {
    true
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            enforce_alignment: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "type-registry.toml",
            ".type-registry.toml",
            "config/type-registry.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        let project_dirs = directories::ProjectDirs::from("dev", "familiar", "type-registry");
        if let Some(config_dir) = project_dirs {
            let xdg_config = config_dir.config_dir().join("type-registry.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("TYPE_REGISTRY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
