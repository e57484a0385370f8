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

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file exists but could not be read
    #[error("cannot read settings file: {0}")]
    Read(#[from] std::io::Error),

    /// TOML settings that do not match the schema
    #[error("invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML settings that do not match the schema
    #[error("invalid YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON settings that do not match the schema
    #[error("invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension other than toml, yaml, yml or json
    #[error("settings file extension '.{0}' is not one of toml, yaml, yml, json")]
    UnsupportedFormat(String),

    /// No file at the given path
    #[error("settings file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// Path without an extension to pick a format from
    #[error("cannot tell the settings format of {} without an extension", .0.display())]
    NoExtension(PathBuf),

    /// An `AZB_*` variable whose value cannot be applied
    #[error("{variable} override rejected: {reason}")]
    InvalidOverride {
        /// Variable name
        variable: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A setting outside its allowed values
    #[error("{field}: {reason}")]
    InvalidSetting {
        /// Dotted path of the setting, e.g. `storage.containers`
        field: String,
        /// What is wrong with the value
        reason: String,
    },

    /// A required setting that is absent or empty
    #[error("{0} must be set")]
    MissingSetting(String),
}

impl ConfigError {
    /// Override variable holding a value that cannot be applied
    pub fn invalid_override(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidOverride {
            variable: variable.into(),
            reason: reason.into(),
        }
    }

    /// Setting holding a value outside its allowed range
    pub fn invalid_setting(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidSetting {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Required setting that is absent or empty
    pub fn missing_setting(field: impl Into<String>) -> Self {
        ConfigError::MissingSetting(field.into())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
