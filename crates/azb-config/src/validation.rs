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
use crate::schema::*;
use std::collections::HashSet;

/// Levels accepted in `observability.log_level` directives
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Log formats accepted by `observability.log_format`
pub const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

/// Validator for configuration settings
pub trait Validator {
    /// Check the settings, returning the first violation found
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Settings {
    fn validate(&self) -> ConfigResult<()> {
        self.storage.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for StorageSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.connection_string.trim().is_empty() {
            return Err(ConfigError::missing_setting("storage.connection_string"));
        }

        let mut seen = HashSet::new();
        for name in &self.containers {
            validate_container_name(name)?;
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::invalid_setting(
                    "storage.containers",
                    format!("duplicate container name: {}", name),
                ));
            }
        }

        if self.download_dir.as_os_str().is_empty() {
            return Err(ConfigError::missing_setting("storage.download_dir"));
        }

        Ok(())
    }
}

impl Validator for ObservabilitySettings {
    fn validate(&self) -> ConfigResult<()> {
        validate_log_filter(&self.log_level)?;

        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ConfigError::invalid_setting(
                "observability.log_format",
                format!("must be one of: {}", LOG_FORMATS.join(", ")),
            ));
        }

        Ok(())
    }
}

/// Check a log filter in `tracing` directive syntax
///
/// Accepts a comma-separated list where each directive is either a bare level or
/// `target=level`, e.g. `warn,azb_storage=debug`. Levels are case-insensitive.
pub fn validate_log_filter(filter: &str) -> ConfigResult<()> {
    let invalid = |reason: String| -> ConfigResult<()> {
        Err(ConfigError::invalid_setting("observability.log_level", reason))
    };

    let directives: Vec<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    if directives.is_empty() {
        return invalid("log filter is empty".to_string());
    }

    for directive in directives {
        let level = match directive.rsplit_once('=') {
            Some((target, level)) => {
                if target.trim().is_empty() {
                    return invalid(format!("'{}' has no target before '='", directive));
                }
                level.trim()
            }
            None => directive,
        };

        if !LOG_LEVELS.iter().any(|known| known.eq_ignore_ascii_case(level)) {
            return invalid(format!(
                "'{}': level must be one of: {}",
                directive,
                LOG_LEVELS.join(", ")
            ));
        }
    }

    Ok(())
}

/// Check a container name against the Azure naming rules
///
/// 3-63 characters of lowercase letters, digits and hyphens, starting and ending
/// with a letter or digit, with no consecutive hyphens.
pub fn validate_container_name(name: &str) -> ConfigResult<()> {
    let invalid = |reason: &str| -> ConfigResult<()> {
        Err(ConfigError::invalid_setting(
            "storage.containers",
            format!("'{}': {}", name, reason),
        ))
    };

    if name.len() < 3 || name.len() > 63 {
        return invalid("container name must be 3-63 characters long");
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return invalid("container name must contain only lowercase letters, digits, and hyphens");
    }

    if name.starts_with('-') || name.ends_with('-') {
        return invalid("container name must start and end with a letter or digit");
    }

    if name.contains("--") {
        return invalid("container name must not contain consecutive hyphens");
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> Settings {
        Settings {
            storage: StorageSettings::new("AccountName=a;AccountKey=b")
                .with_containers(["reports", "raw-data-2024"]),
            observability: ObservabilitySettings::default(),
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_default_settings_require_connection_string() {
        let err = Settings::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting(ref f) if f == "storage.connection_string"));
    }

    #[test]
    fn test_container_name_rules() {
        let longest = "x".repeat(63);
        let too_long = "x".repeat(64);

        for name in ["abc", "a-b-c", "0data", longest.as_str()] {
            assert!(validate_container_name(name).is_ok(), "{}", name);
        }
        for name in ["ab", "Reports", "-abc", "abc-", "a--b", "a_b", too_long.as_str()] {
            assert!(validate_container_name(name).is_err(), "{}", name);
        }
    }

    #[test]
    fn test_duplicate_containers() {
        let mut settings = valid();
        settings.storage.containers.push("reports".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_log_level_validation() {
        let mut settings = valid();
        settings.observability.log_level = "verbose".to_string();
        assert!(settings.validate().is_err());

        settings.observability.log_level = "WARN".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_log_filter_directives() {
        for filter in ["info", "warn,azb_storage=debug", "azb_storage::container=TRACE", "off"] {
            assert!(validate_log_filter(filter).is_ok(), "{}", filter);
        }
        for filter in ["", " , ", "azb_storage=loud", "=debug", "info,verbose"] {
            assert!(validate_log_filter(filter).is_err(), "{}", filter);
        }
    }

    #[test]
    fn test_log_format_validation() {
        let mut settings = valid();
        settings.observability.log_format = "text".to_string();
        assert!(settings.validate().is_err());

        settings.observability.log_format = "json".to_string();
        assert!(settings.validate().is_ok());
    }
}
