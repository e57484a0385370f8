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

//! In-memory blob clients for testing
//!
//! [`MockAccountClient`] and [`MockContainerClient`] implement the client traits over
//! shared maps, so clones observe each other's writes. URLs use the public cloud
//! layout and SAS tokens are signed with SHA-256 over the account key, which makes
//! them deterministic for a given validity window.
//!
//! # Examples
//!
//! ```rust,no_run
//! use azb_storage::{mock::MockContainerClient, ContainerClient};
//!
//! #[tokio::main]
//! async fn main() -> azb_storage::StorageResult<()> {
//!     let client = MockContainerClient::new("myaccount", "reports");
//!     client.upload("q1.csv", "a,b\n1,2".into(), false).await?;
//!
//!     assert_eq!(client.len().await, 1);
//!     assert_eq!(&client.download("q1.csv").await?[..], b"a,b\n1,2");
//!     Ok(())
//! }
//! ```

use crate::connection_string::{ConnectionString, Credential};
use crate::error::{StorageError, StorageResult};
use crate::{AccountClient, BlobSummary, ContainerClient, ContainerSummary, UploadResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock as SyncRwLock};
use tokio::sync::RwLock;

/// Signed version stamped into mock SAS tokens
const SAS_VERSION: &str = "2021-06-08";

/// Account key used when none is supplied
pub const MOCK_ACCOUNT_KEY: &str = "bW9jay1hY2NvdW50LWtleQ==";

#[derive(Debug, Clone, Default)]
struct MockBlob {
    data: Bytes,
    tags: HashMap<String, String>,
}

/// In-memory container client
///
/// Thread-safe; clones share the same blob map.
#[derive(Clone)]
pub struct MockContainerClient {
    account_name: String,
    account_key: Option<String>,
    container_name: String,
    blobs: Arc<RwLock<BTreeMap<String, MockBlob>>>,
}

impl MockContainerClient {
    /// Create an empty container that can sign SAS tokens with [`MOCK_ACCOUNT_KEY`]
    pub fn new(account_name: impl Into<String>, container_name: impl Into<String>) -> Self {
        Self::with_key(account_name, container_name, Some(MOCK_ACCOUNT_KEY.to_string()))
    }

    /// Create an empty container with an explicit signing key
    ///
    /// Without a key, [`generate_read_sas`](ContainerClient::generate_read_sas) fails
    /// the way a SAS-authenticated SDK client does.
    pub fn with_key(
        account_name: impl Into<String>,
        container_name: impl Into<String>,
        account_key: Option<String>,
    ) -> Self {
        MockContainerClient {
            account_name: account_name.into(),
            account_key,
            container_name: container_name.into(),
            blobs: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Number of stored blobs
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Whether the container holds no blobs
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// Remove every blob
    pub async fn clear(&self) {
        self.blobs.write().await.clear();
    }

    /// Replace the index tags of an existing blob
    pub async fn set_tags(
        &self,
        blob_name: &str,
        tags: HashMap<String, String>,
    ) -> StorageResult<()> {
        let mut blobs = self.blobs.write().await;
        let blob = blobs
            .get_mut(blob_name)
            .ok_or_else(|| StorageError::blob_not_found(blob_name))?;
        blob.tags = tags;
        Ok(())
    }

    fn sign(&self, string_to_sign: &str) -> StorageResult<String> {
        let key = self.account_key.as_deref().ok_or_else(|| {
            StorageError::permission_denied(
                "SAS generation requires account key credentials",
            )
        })?;

        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(string_to_sign.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

impl fmt::Debug for MockContainerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockContainerClient")
            .field("account_name", &self.account_name)
            .field("container_name", &self.container_name)
            .finish()
    }
}

#[async_trait]
impl ContainerClient for MockContainerClient {
    fn container_name(&self) -> &str {
        &self.container_name
    }

    async fn list_blobs(&self, include_tags: bool) -> StorageResult<Vec<BlobSummary>> {
        let blobs = self.blobs.read().await;
        Ok(blobs
            .iter()
            .map(|(name, blob)| BlobSummary {
                name: name.clone(),
                tags: include_tags.then(|| blob.tags.clone()),
            })
            .collect())
    }

    fn blob_url(&self, blob_name: &str) -> StorageResult<String> {
        if blob_name.is_empty() {
            return Err(StorageError::invalid_arguments("blob name cannot be empty"));
        }
        Ok(format!(
            "https://{}.blob.core.windows.net/{}/{}",
            self.account_name, self.container_name, blob_name
        ))
    }

    async fn generate_read_sas(
        &self,
        blob_name: &str,
        start: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> StorageResult<String> {
        if expiry <= start {
            return Err(StorageError::invalid_arguments(
                "SAS expiry must be after its start",
            ));
        }

        let st = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let se = expiry.to_rfc3339_opts(SecondsFormat::Secs, true);
        let string_to_sign = format!(
            "r\n{}\n{}\n/blob/{}/{}/{}\nhttps\n{}",
            st, se, self.account_name, self.container_name, blob_name, SAS_VERSION
        );
        let sig = self.sign(&string_to_sign)?;

        Ok(format!(
            "sv={}&st={}&se={}&sr=b&sp=r&spr=https&sig={}",
            SAS_VERSION, st, se, sig
        ))
    }

    async fn upload(
        &self,
        blob_name: &str,
        data: Bytes,
        overwrite: bool,
    ) -> StorageResult<UploadResult> {
        if blob_name.is_empty() {
            return Err(StorageError::invalid_arguments("blob name cannot be empty"));
        }

        let mut blobs = self.blobs.write().await;
        if !overwrite && blobs.contains_key(blob_name) {
            return Err(StorageError::blob_already_exists(blob_name));
        }

        let etag = format!("\"0x{}\"", &hex::encode(Sha256::digest(&data))[..16]);
        let content_length = data.len();
        blobs.insert(
            blob_name.to_string(),
            MockBlob {
                data,
                tags: HashMap::new(),
            },
        );

        Ok(UploadResult {
            container_name: self.container_name.clone(),
            blob_name: blob_name.to_string(),
            content_length,
            etag: Some(etag),
        })
    }

    async fn download(&self, blob_name: &str) -> StorageResult<Bytes> {
        let blobs = self.blobs.read().await;
        blobs
            .get(blob_name)
            .map(|blob| blob.data.clone())
            .ok_or_else(|| StorageError::blob_not_found(blob_name))
    }
}

#[derive(Clone)]
struct MockContainer {
    client: MockContainerClient,
    metadata: HashMap<String, String>,
}

/// In-memory account client
///
/// Asking for an unknown container creates it, so managers built over a fresh
/// account work without setup.
#[derive(Clone)]
pub struct MockAccountClient {
    account_name: String,
    account_key: Option<String>,
    containers: Arc<SyncRwLock<BTreeMap<String, MockContainer>>>,
}

impl MockAccountClient {
    /// Create an account with no containers
    pub fn new(account_name: impl Into<String>) -> Self {
        MockAccountClient {
            account_name: account_name.into(),
            account_key: Some(MOCK_ACCOUNT_KEY.to_string()),
            containers: Arc::new(SyncRwLock::new(BTreeMap::new())),
        }
    }

    /// Create an account from a parsed connection string
    ///
    /// SAS credentials yield an account that cannot sign new SAS tokens.
    pub fn from_connection_string(connection_string: &ConnectionString) -> StorageResult<Self> {
        let account_key = match connection_string.credential()? {
            Credential::AccountKey { account_key, .. } => Some(account_key),
            Credential::SharedAccessSignature(_) => None,
        };

        Ok(MockAccountClient {
            account_name: connection_string.account_name()?,
            account_key,
            containers: Arc::new(SyncRwLock::new(BTreeMap::new())),
        })
    }

    /// Create a container with metadata, replacing any existing one of that name
    pub fn add_container(
        &self,
        container_name: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> MockContainerClient {
        let container_name = container_name.into();
        let client = MockContainerClient::with_key(
            self.account_name.clone(),
            container_name.clone(),
            self.account_key.clone(),
        );

        self.containers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                container_name,
                MockContainer {
                    client: client.clone(),
                    metadata,
                },
            );
        client
    }

    /// Existing container client, if any
    pub fn container(&self, container_name: &str) -> Option<MockContainerClient> {
        self.containers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(container_name)
            .map(|c| c.client.clone())
    }
}

impl fmt::Debug for MockAccountClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockAccountClient")
            .field("account_name", &self.account_name)
            .finish()
    }
}

#[async_trait]
impl AccountClient for MockAccountClient {
    fn account_name(&self) -> &str {
        &self.account_name
    }

    async fn list_containers(
        &self,
        include_metadata: bool,
    ) -> StorageResult<Vec<ContainerSummary>> {
        let containers = self
            .containers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        Ok(containers
            .iter()
            .map(|(name, container)| ContainerSummary {
                name: name.clone(),
                metadata: include_metadata.then(|| container.metadata.clone()),
            })
            .collect())
    }

    fn container_client(&self, container_name: &str) -> Arc<dyn ContainerClient> {
        match self.container(container_name) {
            Some(client) => Arc::new(client),
            None => Arc::new(self.add_container(container_name, HashMap::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_upload_and_download() {
        let client = MockContainerClient::new("acct", "box");
        let result = client.upload("a.txt", Bytes::from_static(b"hi"), false).await.unwrap();

        assert_eq!(result.blob_name, "a.txt");
        assert_eq!(result.content_length, 2);
        assert!(result.etag.is_some());
        assert_eq!(&client.download("a.txt").await.unwrap()[..], b"hi");
    }

    #[tokio::test]
    async fn test_upload_without_overwrite_fails_on_existing() {
        let client = MockContainerClient::new("acct", "box");
        client.upload("a.txt", Bytes::from_static(b"1"), false).await.unwrap();

        let err = client
            .upload("a.txt", Bytes::from_static(b"2"), false)
            .await
            .unwrap_err();
        assert!(err.is_blob_already_exists());

        client.upload("a.txt", Bytes::from_static(b"2"), true).await.unwrap();
        assert_eq!(&client.download("a.txt").await.unwrap()[..], b"2");
    }

    #[tokio::test]
    async fn test_download_missing() {
        let client = MockContainerClient::new("acct", "box");
        assert!(client.download("nope.bin").await.unwrap_err().is_blob_not_found());
    }

    #[tokio::test]
    async fn test_tags_only_when_requested() {
        let client = MockContainerClient::new("acct", "box");
        client.upload("a.txt", Bytes::from_static(b"x"), false).await.unwrap();
        client
            .set_tags("a.txt", HashMap::from([("team".to_string(), "data".to_string())]))
            .await
            .unwrap();

        let plain = client.list_blobs(false).await.unwrap();
        assert_eq!(plain[0].tags, None);

        let tagged = client.list_blobs(true).await.unwrap();
        assert_eq!(tagged[0].tags.as_ref().unwrap()["team"], "data");
    }

    #[tokio::test]
    async fn test_sas_is_deterministic_for_window() {
        let client = MockContainerClient::new("acct", "box");
        let start = Utc::now();
        let expiry = start + Duration::hours(1);

        let a = client.generate_read_sas("a.txt", start, expiry).await.unwrap();
        let b = client.generate_read_sas("a.txt", start, expiry).await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("sp=r"));
        assert!(a.contains("sig="));
    }

    #[tokio::test]
    async fn test_sas_requires_key() {
        let client = MockContainerClient::with_key("acct", "box", None);
        let start = Utc::now();
        let err = client
            .generate_read_sas("a.txt", start, start + Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_account_clones_share_containers() {
        let account = MockAccountClient::new("acct");
        let other = account.clone();

        account.add_container("alpha", HashMap::from([("env".to_string(), "dev".to_string())]));
        let listed = other.list_containers(true).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "alpha");
        assert_eq!(listed[0].metadata.as_ref().unwrap()["env"], "dev");
    }

    #[tokio::test]
    async fn test_container_client_creates_on_demand() {
        let account = MockAccountClient::new("acct");
        let client = account.container_client("fresh");
        client.upload("a.txt", Bytes::from_static(b"x"), false).await.unwrap();

        assert_eq!(account.container("fresh").unwrap().len().await, 1);
    }

    #[test]
    fn test_from_sas_connection_string_has_no_key() {
        let parsed = ConnectionString::parse(
            "BlobEndpoint=https://acct.blob.core.windows.net;SharedAccessSignature=sv=1&sig=x",
        )
        .unwrap();
        let account = MockAccountClient::from_connection_string(&parsed).unwrap();
        assert_eq!(account.account_name(), "acct");
        assert!(account.account_key.is_none());
    }
}
