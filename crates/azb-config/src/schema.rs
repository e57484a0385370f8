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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Storage account and containers to manage
    pub storage: StorageSettings,

    /// Logging settings
    pub observability: ObservabilitySettings,
}

/// Storage account settings
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageSettings {
    /// Account connection string; carries the account secret
    pub connection_string: String,

    /// Containers to manage; empty means every container in the account
    pub containers: Vec<String>,

    /// Default directory for downloads
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

impl StorageSettings {
    /// Settings for a connection string with no containers and the default download dir
    pub fn new(connection_string: impl Into<String>) -> Self {
        StorageSettings {
            connection_string: connection_string.into(),
            ..Self::default()
        }
    }

    /// Replace the managed container list
    pub fn with_containers<I, S>(mut self, containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.containers = containers.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the download directory
    pub fn with_download_dir(mut self, download_dir: impl Into<PathBuf>) -> Self {
        self.download_dir = download_dir.into();
        self
    }

    /// Account connection string
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Managed container names
    pub fn containers(&self) -> &[String] {
        &self.containers
    }

    /// Default download directory
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            connection_string: String::new(),
            containers: Vec::new(),
            download_dir: default_download_dir(),
        }
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connection_string = if self.connection_string.is_empty() {
            ""
        } else {
            "<redacted>"
        };

        f.debug_struct("StorageSettings")
            .field("connection_string", &connection_string)
            .field("containers", &self.containers)
            .field("download_dir", &self.download_dir)
            .finish()
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservabilitySettings {
    /// Log filter: a level (trace, debug, info, warn, error, off) or directives
    /// such as `warn,azb_storage=debug`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        ObservabilitySettings {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
