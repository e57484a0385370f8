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

//! Azure Blob Storage clients
//!
//! Implements [`AccountClient`] and [`ContainerClient`] on top of the Azure SDK:
//! - account key or SAS token credentials taken from a connection string
//! - public cloud, custom `BlobEndpoint` and Azurite development storage
//! - block-list uploads for payloads above 4 MB
//! - service errors mapped onto [`StorageError`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use azb_storage::{azure::AzureAccountClient, AccountClient, ConnectionString};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let conn = ConnectionString::parse(
//!         "DefaultEndpointsProtocol=https;AccountName=myaccount;AccountKey=...;EndpointSuffix=core.windows.net",
//!     )?;
//!     let account = AzureAccountClient::from_connection_string(&conn)?;
//!
//!     for container in account.list_containers(false).await? {
//!         println!("{}", container.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Testing with Azurite
//!
//! ```bash
//! npm install -g azurite
//! azurite
//!
//! export AZB_CONNECTION_STRING="UseDevelopmentStorage=true"
//! ```

use crate::connection_string::{ConnectionString, Credential};
use crate::error::{StorageError, StorageResult};
use crate::{AccountClient, BlobSummary, ContainerClient, ContainerSummary, UploadResult};
use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_core::request_options::IfMatchCondition;
use azure_core::StatusCode;
use azure_storage::shared_access_signature::service_sas::BlobSasPermissions;
use azure_storage::shared_access_signature::{SasProtocol, SasToken};
use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::prelude::*;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;

/// Chunk size for block-list uploads (4 MB)
const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Payloads above this size are uploaded as a block list
const AZURE_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Status and service error code of a failed HTTP exchange, if that is what failed
fn http_failure(err: &azure_core::Error) -> Option<(StatusCode, Option<&str>)> {
    match err.kind() {
        ErrorKind::HttpResponse { status, error_code } => Some((*status, error_code.as_deref())),
        _ => None,
    }
}

/// Map Azure errors onto the storage error taxonomy
///
/// Only HTTP failures are classified. The service error code decides when present;
/// the bare status is used for responses without a body, such as `HEAD`.
fn map_error(err: azure_core::Error, context: &str) -> StorageError {
    let Some((status, error_code)) = http_failure(&err) else {
        return StorageError::backend(format!("{}: {}", context, err));
    };

    match (status, error_code) {
        (_, Some("BlobNotFound")) | (StatusCode::NotFound, None) => {
            StorageError::blob_not_found(context)
        }
        (_, Some("BlobAlreadyExists" | "ConditionNotMet"))
        | (StatusCode::Conflict | StatusCode::PreconditionFailed, None) => {
            StorageError::blob_already_exists(context)
        }
        (_, Some(code)) if code.starts_with("AuthorizationFailure") => {
            StorageError::permission_denied(format!("{}: {}", context, err))
        }
        (StatusCode::Forbidden, _) => {
            StorageError::permission_denied(format!("{}: {}", context, err))
        }
        _ => StorageError::backend(format!("{}: {}", context, err)),
    }
}

fn to_offset_date_time(at: DateTime<Utc>) -> StorageResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(at.timestamp()).map_err(|e| {
        StorageError::invalid_arguments(format!("timestamp out of range: {}", e))
    })
}

/// Resolve where the blob service lives for a connection string
fn cloud_location(connection_string: &ConnectionString, account: &str) -> CloudLocation {
    let public = format!("https://{}.blob.core.windows.net", account);
    let china = format!("https://{}.blob.core.chinacloudapi.cn", account);

    match connection_string.blob_endpoint() {
        Some(uri) if uri == public => CloudLocation::Public {
            account: account.to_string(),
        },
        Some(uri) if uri == china => CloudLocation::China {
            account: account.to_string(),
        },
        Some(uri) => CloudLocation::Custom {
            account: account.to_string(),
            uri,
        },
        None => CloudLocation::Public {
            account: account.to_string(),
        },
    }
}

/// Account-scoped Azure client
///
/// Cheap to clone; the SDK pools connections underneath.
#[derive(Clone)]
pub struct AzureAccountClient {
    account_name: String,
    can_sign: bool,
    client: BlobServiceClient,
}

impl fmt::Debug for AzureAccountClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureAccountClient")
            .field("account_name", &self.account_name)
            .field("can_sign", &self.can_sign)
            .finish()
    }
}

impl AzureAccountClient {
    /// Open a client from a parsed connection string
    ///
    /// No request is sent; credentials are checked by the first operation.
    ///
    /// # Errors
    ///
    /// - [`StorageError::MissingField`] if neither account name nor credential can be
    ///   determined
    /// - [`StorageError::MalformedConnectionString`] if the SAS token is rejected by
    ///   the SDK
    pub fn from_connection_string(connection_string: &ConnectionString) -> StorageResult<Self> {
        let account_name = connection_string.account_name()?;

        let (credentials, can_sign) = match connection_string.credential()? {
            Credential::AccountKey {
                account_name,
                account_key,
            } => (StorageCredentials::access_key(account_name, account_key), true),
            Credential::SharedAccessSignature(token) => {
                let credentials = StorageCredentials::sas_token(token).map_err(|e| {
                    StorageError::malformed(format!("invalid SharedAccessSignature: {}", e))
                })?;
                (credentials, false)
            }
        };

        if let Some(endpoint) = connection_string.blob_endpoint() {
            tracing::debug!("Using blob endpoint {} for account {}", endpoint, account_name);
        }

        let location = cloud_location(connection_string, &account_name);
        let client = ClientBuilder::with_location(location, credentials).blob_service_client();

        tracing::info!(
            "Created Azure Blob Storage client for account {} ({})",
            account_name,
            if can_sign { "account key" } else { "SAS token" }
        );

        Ok(AzureAccountClient {
            account_name,
            can_sign,
            client,
        })
    }

    /// Create a container unless it already exists
    ///
    /// Managers never create containers themselves; this is for provisioning and
    /// emulator setup.
    pub async fn ensure_container_exists(&self, container_name: &str) -> StorageResult<()> {
        let client = self.client.container_client(container_name);

        match client.exists().await {
            Ok(true) => {
                tracing::debug!("Container {} already exists", container_name);
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    "Could not check container existence: {}, attempting to create",
                    e
                );
            }
        }

        match client.create().await {
            Ok(_) => {
                tracing::info!("Created container: {}", container_name);
                Ok(())
            }
            Err(e) if matches!(http_failure(&e), Some((StatusCode::Conflict, _))) => {
                tracing::debug!("Container {} already exists", container_name);
                Ok(())
            }
            Err(e) => Err(map_error(e, container_name)),
        }
    }

    /// Typed container client
    pub fn azure_container_client(&self, container_name: &str) -> AzureContainerClient {
        AzureContainerClient {
            account_name: self.account_name.clone(),
            container_name: container_name.to_string(),
            can_sign: self.can_sign,
            client: Arc::new(self.client.container_client(container_name)),
        }
    }
}

#[async_trait]
impl AccountClient for AzureAccountClient {
    fn account_name(&self) -> &str {
        &self.account_name
    }

    async fn list_containers(
        &self,
        include_metadata: bool,
    ) -> StorageResult<Vec<ContainerSummary>> {
        tracing::debug!("Listing containers of account {}", self.account_name);

        let mut stream = self
            .client
            .list_containers()
            .include_metadata(include_metadata)
            .into_stream();

        let mut results = Vec::new();
        while let Some(page) = stream
            .try_next()
            .await
            .map_err(|e| map_error(e, &self.account_name))?
        {
            for container in page.containers {
                let metadata = include_metadata.then(|| container.metadata.clone());
                results.push(ContainerSummary {
                    name: container.name,
                    metadata,
                });
            }
        }

        tracing::debug!(
            "Found {} containers in account {}",
            results.len(),
            self.account_name
        );
        Ok(results)
    }

    fn container_client(&self, container_name: &str) -> Arc<dyn ContainerClient> {
        Arc::new(self.azure_container_client(container_name))
    }
}

/// Container-scoped Azure client
#[derive(Clone)]
pub struct AzureContainerClient {
    account_name: String,
    container_name: String,
    can_sign: bool,
    client: Arc<azure_storage_blobs::prelude::ContainerClient>,
}

impl fmt::Debug for AzureContainerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureContainerClient")
            .field("account_name", &self.account_name)
            .field("container_name", &self.container_name)
            .finish()
    }
}

impl AzureContainerClient {
    fn validate_blob_name(blob_name: &str) -> StorageResult<()> {
        if blob_name.is_empty() {
            return Err(StorageError::invalid_arguments("blob name cannot be empty"));
        }
        Ok(())
    }

    /// Single-request upload
    async fn put_direct(
        &self,
        blob_name: &str,
        data: Bytes,
        overwrite: bool,
    ) -> StorageResult<Option<String>> {
        tracing::debug!(
            "Uploading {} bytes directly to {} in container {}",
            data.len(),
            blob_name,
            self.container_name
        );

        let blob_client = self.client.blob_client(blob_name);
        let mut builder = blob_client.put_block_blob(data);
        if !overwrite {
            builder = builder.if_match(IfMatchCondition::NotMatch("*".to_string()));
        }

        let response = builder.await.map_err(|e| map_error(e, blob_name))?;
        Ok(Some(response.etag))
    }

    /// Block-list upload of large payloads
    ///
    /// Blocks stay uncommitted until the final block list is put, so a refused
    /// non-overwriting commit leaves the existing blob untouched.
    async fn put_chunked(
        &self,
        blob_name: &str,
        data: Bytes,
        overwrite: bool,
    ) -> StorageResult<Option<String>> {
        let chunk_count = data.len().div_ceil(CHUNK_SIZE);
        tracing::debug!(
            "Uploading {} bytes in {} chunks to {} in container {}",
            data.len(),
            chunk_count,
            blob_name,
            self.container_name
        );

        let blob_client = self.client.blob_client(blob_name);
        let mut block_ids = Vec::with_capacity(chunk_count);

        for (i, offset) in (0..data.len()).step_by(CHUNK_SIZE).enumerate() {
            let end = (offset + CHUNK_SIZE).min(data.len());
            let block_id = BlockId::new(format!("{:08}", i));

            tracing::trace!(
                "Uploading chunk {}/{} ({} bytes)",
                i + 1,
                chunk_count,
                end - offset
            );

            blob_client
                .put_block(block_id.clone(), data.slice(offset..end))
                .await
                .map_err(|e| {
                    map_error(
                        e,
                        &format!("{} (chunk {} of {})", blob_name, i + 1, chunk_count),
                    )
                })?;

            block_ids.push(block_id);
        }

        let block_list = BlockList {
            blocks: block_ids
                .into_iter()
                .map(BlobBlockType::new_uncommitted)
                .collect(),
        };

        let mut builder = blob_client.put_block_list(block_list);
        if !overwrite {
            builder = builder.if_match(IfMatchCondition::NotMatch("*".to_string()));
        }
        let response = builder.await.map_err(|e| map_error(e, blob_name))?;

        Ok(Some(response.etag))
    }
}

#[async_trait]
impl ContainerClient for AzureContainerClient {
    fn container_name(&self) -> &str {
        &self.container_name
    }

    async fn list_blobs(&self, include_tags: bool) -> StorageResult<Vec<BlobSummary>> {
        let mut stream = self
            .client
            .list_blobs()
            .include_tags(include_tags)
            .into_stream();

        let mut results = Vec::new();
        while let Some(page) = stream
            .try_next()
            .await
            .map_err(|e| map_error(e, &self.container_name))?
        {
            for blob in page.blobs.blobs() {
                let tags = if include_tags {
                    Some(
                        blob.tags
                            .clone()
                            .map(HashMap::<String, String>::from)
                            .unwrap_or_default(),
                    )
                } else {
                    None
                };
                results.push(BlobSummary {
                    name: blob.name.clone(),
                    tags,
                });
            }
        }

        Ok(results)
    }

    fn blob_url(&self, blob_name: &str) -> StorageResult<String> {
        Self::validate_blob_name(blob_name)?;
        self.client
            .blob_client(blob_name)
            .url()
            .map(|url| url.to_string())
            .map_err(|e| StorageError::backend(format!("{}: {}", blob_name, e)))
    }

    async fn generate_read_sas(
        &self,
        blob_name: &str,
        start: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> StorageResult<String> {
        Self::validate_blob_name(blob_name)?;
        if expiry <= start {
            return Err(StorageError::invalid_arguments(
                "SAS expiry must be after its start",
            ));
        }
        if !self.can_sign {
            return Err(StorageError::permission_denied(
                "SAS generation requires account key credentials",
            ));
        }

        let permissions = BlobSasPermissions {
            read: true,
            ..Default::default()
        };

        let protocol = if self
            .client
            .url()
            .map(|url| url.scheme() == "https")
            .unwrap_or(true)
        {
            SasProtocol::Https
        } else {
            SasProtocol::HttpHttps
        };

        let sas = self
            .client
            .blob_client(blob_name)
            .shared_access_signature(permissions, to_offset_date_time(expiry)?)
            .await
            .map_err(|e| map_error(e, blob_name))?
            .start(to_offset_date_time(start)?)
            .protocol(protocol);

        sas.token()
            .map_err(|e| StorageError::backend(format!("signing SAS for {}: {}", blob_name, e)))
    }

    async fn upload(
        &self,
        blob_name: &str,
        data: Bytes,
        overwrite: bool,
    ) -> StorageResult<UploadResult> {
        Self::validate_blob_name(blob_name)?;

        let content_length = data.len();
        let etag = if content_length > AZURE_BLOCK_SIZE {
            self.put_chunked(blob_name, data, overwrite).await?
        } else {
            self.put_direct(blob_name, data, overwrite).await?
        };

        tracing::debug!("Successfully uploaded {}", blob_name);
        Ok(UploadResult {
            container_name: self.container_name.clone(),
            blob_name: blob_name.to_string(),
            content_length,
            etag,
        })
    }

    async fn download(&self, blob_name: &str) -> StorageResult<Bytes> {
        Self::validate_blob_name(blob_name)?;

        tracing::debug!(
            "Getting blob from Azure Blob Storage: {}/{}",
            self.container_name,
            blob_name
        );

        let data = self
            .client
            .blob_client(blob_name)
            .get_content()
            .await
            .map_err(|e| map_error(e, blob_name))?;

        tracing::debug!("Successfully retrieved {} ({} bytes)", blob_name, data.len());
        Ok(Bytes::from(data))
    }
}
