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

//! StorageAccountManager behavior over the in-memory client

use azb_config::{ConfigFormat, ConfigLoader, StorageSettings};
use azb_storage::connection_string::{self, ConnectionString};
use azb_storage::mock::MockAccountClient;
use azb_storage::{Payload, StorageAccountManager, StorageError, UploadRequest};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

const CONN: &str = "DefaultEndpointsProtocol=https;AccountName=myaccount;AccountKey=bXlrZXk=;EndpointSuffix=core.windows.net";

async fn manager_with(containers: &[&str]) -> (MockAccountClient, StorageAccountManager) {
    let account = MockAccountClient::new("myaccount");
    let settings = StorageSettings::new(CONN).with_containers(containers.iter().copied());
    let manager = StorageAccountManager::new(Arc::new(account.clone()), &settings)
        .await
        .unwrap();
    (account, manager)
}

#[test]
fn test_account_name_extraction() {
    for (raw, expected) in [
        (CONN, "myaccount"),
        (
            "DefaultEndpointsProtocol=http;AccountName=devstoreaccount1;AccountKey=a2V5==;EndpointSuffix=local",
            "devstoreaccount1",
        ),
    ] {
        let parsed = connection_string::parse(raw).unwrap();
        assert_eq!(connection_string::extract_account_name(&parsed).unwrap(), expected);
    }
}

#[test]
fn test_missing_canonical_field() {
    let fields = [
        "DefaultEndpointsProtocol=https",
        "AccountName=myaccount",
        "AccountKey=bXlrZXk=",
        "EndpointSuffix=core.windows.net",
    ];

    for skip in 0..fields.len() {
        let raw: Vec<&str> = fields
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, f)| *f)
            .collect();
        let err = ConnectionString::parse(&raw.join(";")).unwrap_err();
        assert!(err.is_malformed_connection_string(), "{}", raw.join(";"));
    }
}

#[tokio::test]
async fn test_configured_containers_are_managed() {
    let (_account, manager) = manager_with(&["reports", "raw-data"]).await;

    assert_eq!(manager.account_name(), "myaccount");
    assert_eq!(manager.container_names(), vec!["raw-data", "reports"]);
    assert_eq!(manager.container("reports").unwrap().name(), "reports");
}

#[tokio::test]
async fn test_containers_discovered_when_none_configured() {
    let account = MockAccountClient::new("myaccount");
    account.add_container("alpha", HashMap::new());
    account.add_container(
        "beta",
        HashMap::from([("team".to_string(), "data".to_string())]),
    );

    let manager = StorageAccountManager::new(Arc::new(account), &StorageSettings::new(CONN))
        .await
        .unwrap();

    assert_eq!(manager.container_names(), vec!["alpha", "beta"]);

    let with_metadata = manager.list_containers(true).await.unwrap();
    assert_eq!(with_metadata[1].metadata.as_ref().unwrap()["team"], "data");

    let without = manager.list_containers(false).await.unwrap();
    assert!(without.iter().all(|c| c.metadata.is_none()));
}

#[tokio::test]
async fn test_upload_forwards_to_named_container() {
    let (account, manager) = manager_with(&["reports", "raw-data"]).await;

    let result = manager
        .upload_blob(
            "reports",
            UploadRequest::from_payload(Payload::json(serde_json::json!({"mytest": "json"})))
                .blob_name("mock.json")
                .json_encode(true),
        )
        .await
        .unwrap();

    assert_eq!(result.container_name, "reports");
    assert_eq!(account.container("reports").unwrap().len().await, 1);
    assert!(account.container("raw-data").unwrap().is_empty().await);
    assert!(manager.container("reports").unwrap().has_blob("mock.json").await.unwrap());
}

#[tokio::test]
async fn test_unknown_container() {
    let (_account, mut manager) = manager_with(&["reports"]).await;

    let err = manager
        .upload_blob("archive", UploadRequest::from_payload("x").blob_name("a.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::UnknownContainer(ref name) if name == "archive"));

    assert!(manager.container("archive").unwrap_err().is_unknown_container());
    assert!(manager.container_mut("archive").unwrap_err().is_unknown_container());
}

#[tokio::test]
async fn test_download_dir_from_settings() {
    let dir = TempDir::new().unwrap();
    let settings = StorageSettings::new(CONN)
        .with_containers(["reports"])
        .with_download_dir(dir.path());
    let manager = StorageAccountManager::new(Arc::new(MockAccountClient::new("myaccount")), &settings)
        .await
        .unwrap();

    manager
        .upload_blob("reports", UploadRequest::from_payload("q1").blob_name("q1.csv"))
        .await
        .unwrap();

    let path = manager
        .container("reports")
        .unwrap()
        .download_blob("q1.csv", None)
        .await
        .unwrap();
    assert_eq!(path, dir.path().join("q1.csv"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "q1");
}

#[tokio::test]
async fn test_manager_from_loaded_settings() {
    let toml = format!(
        "[storage]\nconnection_string = \"{}\"\ncontainers = [\"reports\"]\n",
        CONN
    );
    let settings = ConfigLoader::new()
        .load_from_string(&toml, ConfigFormat::Toml)
        .unwrap();

    let manager = StorageAccountManager::new(
        Arc::new(MockAccountClient::new("myaccount")),
        &settings.storage,
    )
    .await
    .unwrap();
    assert_eq!(manager.container_names(), vec!["reports"]);
}

#[tokio::test]
async fn test_sas_connection_string_account() {
    let raw = "BlobEndpoint=https://sasacct.blob.core.windows.net/;SharedAccessSignature=?sv=2021-06-08&sp=rl&sig=abc%3D";
    let parsed = ConnectionString::parse(raw).unwrap();
    let account = MockAccountClient::from_connection_string(&parsed).unwrap();

    let manager = StorageAccountManager::new(
        Arc::new(account),
        &StorageSettings::new(raw).with_containers(["reports"]),
    )
    .await
    .unwrap();

    assert_eq!(manager.account_name(), "sasacct");
    let err = manager
        .container("reports")
        .unwrap()
        .get_blob_url("a.txt", true, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::PermissionDenied(_)));
}
