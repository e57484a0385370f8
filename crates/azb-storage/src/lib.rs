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

//! Convenience layer over the Azure Blob Storage client
//!
//! This crate wraps an account-scoped and a container-scoped blob client behind two
//! managers:
//!
//! - [`ContainerManager`]: list, inspect, sign, upload and download blobs in one container
//! - [`StorageAccountManager`]: parses the account connection string, holds one
//!   `ContainerManager` per container of interest and forwards calls by container name
//!
//! The managers never speak the storage protocol themselves. They drive an
//! [`AccountClient`] / [`ContainerClient`] implementation:
//!
//! - `azure::AzureAccountClient` (feature `azure`): the Azure SDK
//! - [`mock::MockAccountClient`]: in-memory, for tests and local experiments
//!
//! # Examples
//!
//! ```no_run
//! use azb_config::StorageSettings;
//! use azb_storage::{mock::MockAccountClient, Payload, StorageAccountManager, UploadRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> azb_storage::StorageResult<()> {
//!     let settings = StorageSettings::new(
//!         "DefaultEndpointsProtocol=https;AccountName=myaccount;AccountKey=a2V5;EndpointSuffix=core.windows.net",
//!     )
//!     .with_containers(["reports"]);
//!
//!     let client = Arc::new(MockAccountClient::new("myaccount"));
//!     let manager = StorageAccountManager::new(client, &settings).await?;
//!
//!     manager
//!         .upload_blob(
//!             "reports",
//!             UploadRequest::from_payload(Payload::json(serde_json::json!({"mytest": "json"})))
//!                 .blob_name("mock.json")
//!                 .json_encode(true),
//!         )
//!         .await?;
//!
//!     let reports = manager.container("reports")?;
//!     assert!(reports.has_blob("mock.json").await?);
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Every operation returns [`StorageResult`]; see [`StorageError`] for the taxonomy.
//! Failures are surfaced immediately: nothing is retried at this layer.

pub mod account;
#[cfg(feature = "azure")]
pub mod azure;
pub mod connection_string;
pub mod container;
pub mod error;
pub mod mock;
pub mod payload;
pub mod upload;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

pub use account::StorageAccountManager;
#[cfg(feature = "azure")]
pub use azure::{AzureAccountClient, AzureContainerClient};
pub use connection_string::{ConnectionString, ConnectionStringKind, Credential};
pub use container::ContainerManager;
pub use error::{StorageError, StorageResult};
pub use payload::{JsonEncodable, Payload};
pub use upload::UploadRequest;

/// One entry of a blob listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSummary {
    /// Full blob name within the container
    pub name: String,
    /// Index tags, present only when requested
    pub tags: Option<HashMap<String, String>>,
}

/// One entry of a container listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Container name
    pub name: String,
    /// User metadata, present only when requested
    pub metadata: Option<HashMap<String, String>>,
}

/// Descriptor of a successfully uploaded blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Container the blob was written to
    pub container_name: String,
    /// Final blob name
    pub blob_name: String,
    /// Number of bytes uploaded
    pub content_length: usize,
    /// Entity tag reported by the service
    pub etag: Option<String>,
}

/// Container-scoped blob client capability
///
/// Implementations map service failures onto [`StorageError`]: a missing blob is
/// `BlobNotFound`, a refused non-overwriting upload is `BlobAlreadyExists`.
#[async_trait]
pub trait ContainerClient: Send + Sync + Debug {
    /// Name of the container this client is bound to
    fn container_name(&self) -> &str;

    /// List every blob in the container, optionally with index tags
    async fn list_blobs(&self, include_tags: bool) -> StorageResult<Vec<BlobSummary>>;

    /// Base URL of a blob, without any query string
    fn blob_url(&self, blob_name: &str) -> StorageResult<String>;

    /// Sign a read-only SAS token for a blob, valid between `start` and `expiry`
    ///
    /// Returns the query string without the leading `?`.
    async fn generate_read_sas(
        &self,
        blob_name: &str,
        start: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> StorageResult<String>;

    /// Write a blob
    async fn upload(
        &self,
        blob_name: &str,
        data: Bytes,
        overwrite: bool,
    ) -> StorageResult<UploadResult>;

    /// Read a blob's full content
    async fn download(&self, blob_name: &str) -> StorageResult<Bytes>;
}

/// Account-scoped blob client capability
#[async_trait]
pub trait AccountClient: Send + Sync + Debug {
    /// Storage account name
    fn account_name(&self) -> &str;

    /// List the containers of the account, optionally with metadata
    async fn list_containers(&self, include_metadata: bool)
        -> StorageResult<Vec<ContainerSummary>>;

    /// Client bound to one container
    fn container_client(&self, container_name: &str) -> Arc<dyn ContainerClient>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_traits_are_object_safe() {
        fn _account(_: &dyn AccountClient) {}
        fn _container(_: &dyn ContainerClient) {}
    }
}
