//! Configuration for the tagging engine
//!
//! A [`TaggingConfig`] is injected into the resolver and reconciler at
//! construction; nothing here is global or mutable at a distance. Hosts can
//! build it in code, or load it from a TOML file they own the path of.

use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::slug::DEFAULT_SEPARATOR;

fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

fn default_locale() -> String {
    "en".to_string()
}

/// Tagging engine configuration
///
/// # Examples
///
/// ```
/// use taggable::config::TaggingConfig;
///
/// let config = TaggingConfig::default().with_default_locale("de");
/// assert_eq!(config.separator, '-');
/// assert_eq!(config.default_locale, "de");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggingConfig {
    /// Separator character used when normalizing slugs
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Locale new tags are created under and current tag sets are diffed in
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            default_locale: default_locale(),
        }
    }
}

impl TaggingConfig {
    /// Override the slug separator.
    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Override the default locale.
    #[must_use]
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let settings = Config::builder()
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created, the
    /// configuration cannot be serialized, or the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}
