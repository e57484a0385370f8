//! Integration tests for the Azure clients using the Azurite emulator
//!
//! # Prerequisites
//!
//! Azurite must be running before executing these tests:
//! ```bash
//! docker run -p 10000:10000 mcr.microsoft.com/azure-storage/azurite azurite-blob --blobHost 0.0.0.0
//! cargo test -p azb-storage --features azure -- --ignored
//! ```
//!
//! # Configuration
//!
//! Tests use `UseDevelopmentStorage=true`, i.e. account `devstoreaccount1` with the
//! well-known emulator key at `http://127.0.0.1:10000`.

#[cfg(test)]
mod azure_azurite_tests {
    use azb_config::StorageSettings;
    use azb_storage::{
        AzureAccountClient, ConnectionString, Payload, StorageAccountManager, UploadRequest,
    };
    use std::io::Read;
    use tempfile::TempDir;

    const AZURITE_CONNECTION_STRING: &str = "UseDevelopmentStorage=true";

    /// Container name for tests
    const TEST_CONTAINER: &str = "azb-test-container";

    async fn create_test_manager(download_dir: &std::path::Path) -> StorageAccountManager {
        let parsed = ConnectionString::parse(AZURITE_CONNECTION_STRING).unwrap();
        AzureAccountClient::from_connection_string(&parsed)
            .unwrap()
            .ensure_container_exists(TEST_CONTAINER)
            .await
            .expect("Failed to create container in Azurite");

        let settings = StorageSettings::new(AZURITE_CONNECTION_STRING)
            .with_containers([TEST_CONTAINER])
            .with_download_dir(download_dir);
        StorageAccountManager::connect(&settings)
            .await
            .expect("Failed to connect to Azurite")
    }

    #[tokio::test]
    #[ignore] // Requires Azurite to be running
    async fn test_azurite_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(dir.path()).await;

        manager
            .upload_blob(
                TEST_CONTAINER,
                UploadRequest::from_payload(Payload::json(serde_json::json!({"mytest": "json"})))
                    .blob_name("mock.json")
                    .json_encode(true)
                    .overwrite(true),
            )
            .await
            .expect("Failed to upload blob to Azurite");

        let container = manager.container(TEST_CONTAINER).unwrap();
        let mut text = String::new();
        container
            .download_bytes("mock.json")
            .await
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();

        let decoded: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, serde_json::json!({"mytest": "json"}));
        assert!(container.has_blob("mock.json").await.unwrap());
    }

    #[tokio::test]
    #[ignore] // Requires Azurite to be running
    async fn test_azurite_no_overwrite() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(dir.path()).await;
        let request = || UploadRequest::from_payload("v1").blob_name("fixed.txt");

        manager
            .upload_blob(TEST_CONTAINER, request().overwrite(true))
            .await
            .unwrap();

        let err = manager
            .upload_blob(TEST_CONTAINER, request())
            .await
            .unwrap_err();
        assert!(err.is_blob_already_exists(), "{}", err);
    }

    #[tokio::test]
    #[ignore] // Requires Azurite to be running
    async fn test_azurite_chunked_upload_and_download() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(dir.path()).await;

        // Above the single-request threshold, so it goes through the block list path
        let data: Vec<u8> = (0..9 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
        manager
            .upload_blob(
                TEST_CONTAINER,
                UploadRequest::from_payload(data.clone())
                    .blob_name("large.bin")
                    .overwrite(true),
            )
            .await
            .unwrap();

        let path = manager
            .container(TEST_CONTAINER)
            .unwrap()
            .download_blob("large.bin", None)
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), data);
    }

    #[tokio::test]
    #[ignore] // Requires Azurite to be running
    async fn test_azurite_sas_url() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(dir.path()).await;
        let container = manager.container(TEST_CONTAINER).unwrap();

        let plain = container.get_blob_url("mock.json", false, 1).await.unwrap();
        let signed = container.get_blob_url("mock.json", true, 1).await.unwrap();

        assert!(plain.starts_with("http://127.0.0.1:10000/devstoreaccount1/"));
        let (base, query) = signed.split_once('?').unwrap();
        assert_eq!(base, plain);
        assert!(query.contains("sig="));
    }

    #[tokio::test]
    #[ignore] // Requires Azurite to be running
    async fn test_azurite_missing_blob() {
        let dir = TempDir::new().unwrap();
        let manager = create_test_manager(dir.path()).await;

        let err = manager
            .container(TEST_CONTAINER)
            .unwrap()
            .download_blob("does-not-exist.txt", None)
            .await
            .unwrap_err();
        assert!(err.is_blob_not_found(), "{}", err);
        assert!(!dir.path().join("does-not-exist.txt").exists());
    }

    #[tokio::test]
    #[ignore] // Requires Azurite to be running
    async fn test_azurite_container_listing() {
        let dir = TempDir::new().unwrap();
        let _ = create_test_manager(dir.path()).await;

        let discovered = StorageAccountManager::connect(&StorageSettings::new(
            AZURITE_CONNECTION_STRING,
        ))
        .await
        .unwrap();
        assert!(discovered.container_names().contains(&TEST_CONTAINER));
    }
}
