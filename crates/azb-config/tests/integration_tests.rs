use azb_config::{ConfigError, ConfigFormat, ConfigLoader, Settings, StorageSettings, Validator};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CONN: &str = "DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=a2V5;EndpointSuffix=core.windows.net";

#[tokio::test]
async fn test_load_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("azb.toml");
    fs::write(
        &path,
        format!(
            r#"
[storage]
connection_string = "{}"
containers = ["reports", "raw-data"]
download_dir = "/srv/downloads"

[observability]
log_level = "debug"
log_format = "compact"
"#,
            CONN
        ),
    )
    .unwrap();

    let settings = ConfigLoader::new().load_file(&path).await.unwrap();
    assert_eq!(settings.storage.connection_string, CONN);
    assert_eq!(settings.storage.containers, vec!["reports", "raw-data"]);
    assert_eq!(settings.storage.download_dir, PathBuf::from("/srv/downloads"));
    assert_eq!(settings.observability.log_level, "debug");
    assert_eq!(settings.observability.log_format, "compact");
}

#[tokio::test]
async fn test_load_yaml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("azb.yml");
    fs::write(
        &path,
        format!("storage:\n  connection_string: \"{}\"\n  containers:\n    - reports\n", CONN),
    )
    .unwrap();

    let settings = ConfigLoader::new().load_file(&path).await.unwrap();
    assert_eq!(settings.storage.containers, vec!["reports"]);
    assert_eq!(settings.observability.log_level, "info");
}

#[tokio::test]
async fn test_load_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("azb.json");
    let settings = Settings {
        storage: StorageSettings::new(CONN).with_containers(["reports"]),
        ..Settings::default()
    };
    fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

    let loaded = ConfigLoader::new().load_file(&path).await.unwrap();
    assert_eq!(loaded, settings);
}

#[tokio::test]
async fn test_missing_file() {
    let err = ConfigLoader::new()
        .load_file("/definitely/not/here/azb.toml")
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[tokio::test]
async fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("azb.ini");
    fs::write(&path, "[storage]").unwrap();

    let err = ConfigLoader::new().load_file(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == "ini"));
}

#[tokio::test]
async fn test_invalid_container_name_in_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("azb.toml");
    fs::write(
        &path,
        format!("[storage]\nconnection_string = \"{}\"\ncontainers = [\"Bad_Name\"]\n", CONN),
    )
    .unwrap();

    let err = ConfigLoader::new().load_file(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSetting { .. }));
}

#[test]
fn test_malformed_toml() {
    let err = ConfigLoader::new()
        .load_from_string("[storage\nconnection_string = ", ConfigFormat::Toml)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn test_overrides_fill_missing_connection_string() {
    let loader = ConfigLoader::without_validation();
    let mut settings = loader
        .load_from_string("[storage]\ncontainers = [\"reports\"]\n", ConfigFormat::Toml)
        .unwrap();
    assert!(settings.validate().is_err());

    loader
        .apply_overrides_from(&mut settings, |name| {
            (name == "AZB_CONNECTION_STRING").then(|| CONN.to_string())
        })
        .unwrap();

    assert!(settings.validate().is_ok());
    assert_eq!(settings.storage.containers, vec!["reports"]);
}

#[test]
fn test_debug_never_prints_secret() {
    let settings = Settings {
        storage: StorageSettings::new(CONN),
        ..Settings::default()
    };
    let debug = format!("{:?}", settings);
    assert!(!debug.contains("a2V5"));
    assert!(!debug.contains("AccountKey"));
}
