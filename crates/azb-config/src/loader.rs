// azblob-manager - Azure Blob Storage convenience layer
// Copyright (C) 2026 azblob-manager Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::Settings;
use crate::validation::Validator;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Connection string override
pub const ENV_CONNECTION_STRING: &str = "AZB_CONNECTION_STRING";
/// Download directory override
pub const ENV_DOWNLOAD_DIR: &str = "AZB_DOWNLOAD_DIR";
/// Comma-separated container list override
pub const ENV_CONTAINERS: &str = "AZB_CONTAINERS";
/// Log level override
pub const ENV_LOG_LEVEL: &str = "AZB_LOG_LEVEL";
/// Log format override
pub const ENV_LOG_FORMAT: &str = "AZB_LOG_FORMAT";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::NoExtension(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration loader
///
/// Settings are validated after every override has been applied, so an override can
/// fill in a field the file leaves empty.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load settings from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Settings> {
        let settings = self.read_file(path.as_ref()).await?;
        self.finish(settings)
    }

    /// Load settings from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Settings> {
        let settings = Self::parse(content, format)?;
        self.finish(settings)
    }

    /// Load settings from a file, then apply `AZB_*` environment overrides
    pub async fn load_with_overrides<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Settings> {
        let mut settings = self.read_file(path.as_ref()).await?;
        self.apply_env_overrides(&mut settings)?;
        self.finish(settings)
    }

    /// Build settings from defaults and `AZB_*` environment variables only
    pub fn from_env(&self) -> ConfigResult<Settings> {
        let mut settings = Settings::default();
        self.apply_env_overrides(&mut settings)?;
        debug!("Configuration loaded from environment");
        self.finish(settings)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&self, settings: &mut Settings) -> ConfigResult<()> {
        self.apply_overrides_from(settings, |name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from<F>(&self, settings: &mut Settings, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CONNECTION_STRING) {
            settings.storage.connection_string = value;
        }
        if let Some(value) = lookup(ENV_DOWNLOAD_DIR) {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid_override(
                    ENV_DOWNLOAD_DIR,
                    "expected a directory path",
                ));
            }
            settings.storage.download_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_CONTAINERS) {
            settings.storage.containers = parse_list(&value);
        }

        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            settings.observability.log_level = value.trim().to_lowercase();
        }
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            settings.observability.log_format = value.trim().to_lowercase();
        }

        Ok(())
    }

    async fn read_file(&self, path: &Path) -> ConfigResult<Settings> {
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).await?;

        info!(
            "Loaded {} configuration file: {}",
            format.name(),
            path.display()
        );

        Self::parse(&content, format)
    }

    fn parse(content: &str, format: ConfigFormat) -> ConfigResult<Settings> {
        let settings: Settings = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        debug!("Configuration parsed from {}", format.name());
        Ok(settings)
    }

    fn finish(&self, settings: Settings) -> ConfigResult<Settings> {
        if self.validate {
            settings.validate()?;
            debug!("Configuration validated successfully");
        }
        Ok(settings)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a comma-separated list, dropping blank entries
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
