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

//! Single-container blob operations
//!
//! ```rust,no_run
//! use azb_storage::{mock::MockContainerClient, ContainerManager, UploadRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> azb_storage::StorageResult<()> {
//!     let client = Arc::new(MockContainerClient::new("myaccount", "reports"));
//!     let reports = ContainerManager::new(client, "./downloads");
//!
//!     reports
//!         .upload_blob(UploadRequest::from_file("uploads/mock.csv").overwrite(true))
//!         .await?;
//!
//!     let url = reports.get_blob_url("mock.csv", true, 1).await?;
//!     println!("share: {}", url);
//!
//!     let local = reports.download_blob("mock.csv", None).await?;
//!     println!("saved to {}", local.display());
//!     Ok(())
//! }
//! ```

use crate::error::{StorageError, StorageResult};
use crate::upload::{base_name, UploadRequest, UploadSource};
use crate::{BlobSummary, ContainerClient, UploadResult};
use bytes::Bytes;
use chrono::{Duration, Utc};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Blob operations scoped to one container
///
/// Cheap to clone: clones share the underlying client.
#[derive(Clone)]
pub struct ContainerManager {
    client: Arc<dyn ContainerClient>,
    name: String,
    download_dir: PathBuf,
}

impl fmt::Debug for ContainerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerManager")
            .field("name", &self.name)
            .field("download_dir", &self.download_dir)
            .finish()
    }
}

impl ContainerManager {
    /// Wrap a container client
    ///
    /// The manager takes its name from the client, so both always refer to the same
    /// container.
    pub fn new(client: Arc<dyn ContainerClient>, download_dir: impl Into<PathBuf>) -> Self {
        let name = client.container_name().to_string();
        ContainerManager {
            client,
            name,
            download_dir: download_dir.into(),
        }
    }

    /// Container name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default directory for [`download_blob`](Self::download_blob)
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Change the default download directory
    pub fn set_download_dir(&mut self, download_dir: impl Into<PathBuf>) {
        self.download_dir = download_dir.into();
    }

    /// Underlying container client
    pub fn client(&self) -> &Arc<dyn ContainerClient> {
        &self.client
    }

    /// List blobs in the container, sorted by name
    ///
    /// Tags are only fetched and returned when `include_tags` is set.
    pub async fn list_blobs(&self, include_tags: bool) -> StorageResult<Vec<BlobSummary>> {
        tracing::debug!(container = %self.name, include_tags, "Listing blobs");

        let mut blobs = self.client.list_blobs(include_tags).await?;
        if !include_tags {
            for blob in &mut blobs {
                blob.tags = None;
            }
        }
        blobs.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!("Found {} blobs in container {}", blobs.len(), self.name);
        Ok(blobs)
    }

    /// Names of all blobs in the container, sorted
    pub async fn list_blob_names(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .list_blobs(false)
            .await?
            .into_iter()
            .map(|blob| blob.name)
            .collect())
    }

    /// URL of a blob, optionally with a read-only SAS token
    ///
    /// The blob is addressed by the base name of `file_name`. With `include_sas`, a
    /// token valid from now for `expiry_hours` hours is appended after `?`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidArguments`] for an empty name, or a zero or
    ///   unrepresentable expiry when a token is requested
    /// - [`StorageError::PermissionDenied`] if the client holds no key to sign with
    pub async fn get_blob_url(
        &self,
        file_name: &str,
        include_sas: bool,
        expiry_hours: u32,
    ) -> StorageResult<String> {
        let blob_name = base_name(file_name);
        if blob_name.is_empty() {
            return Err(StorageError::invalid_arguments("blob name cannot be empty"));
        }

        let url = self.client.blob_url(blob_name)?;
        if !include_sas {
            return Ok(url);
        }

        if expiry_hours == 0 {
            return Err(StorageError::invalid_arguments(
                "SAS expiry must be at least one hour",
            ));
        }

        let start = Utc::now();
        let expiry = Duration::try_hours(i64::from(expiry_hours))
            .and_then(|lifetime| start.checked_add_signed(lifetime))
            .ok_or_else(|| StorageError::invalid_arguments("SAS expiry out of range"))?;
        let token = self
            .client
            .generate_read_sas(blob_name, start, expiry)
            .await?;

        tracing::debug!(
            container = %self.name,
            blob = blob_name,
            expiry = %expiry,
            "Generated read-only SAS URL"
        );

        Ok(format!("{}?{}", url, token))
    }

    /// Whether `file_name`, or its base name, appears in the current blob listing
    ///
    /// A local path such as `out/report.csv` finds the blob `report.csv`, and a
    /// nested blob name such as `reports/2024/summary.json` finds itself.
    /// Scans the full listing on every call.
    pub async fn has_blob(&self, file_name: &str) -> StorageResult<bool> {
        let wanted = base_name(file_name);
        let names = self.list_blob_names().await?;
        Ok(names.iter().any(|name| name == file_name || name == wanted))
    }

    /// Download a blob to a local file and return its path
    ///
    /// Without `download_path` the file lands in
    /// `{download_dir}/{base name of blob_name}`. Existing files are overwritten.
    /// The blob is fetched before the file is created, so a missing blob leaves
    /// nothing behind.
    pub async fn download_blob(
        &self,
        blob_name: &str,
        download_path: Option<&Path>,
    ) -> StorageResult<PathBuf> {
        let path = match download_path {
            Some(path) => path.to_path_buf(),
            None => self.download_dir.join(base_name(blob_name)),
        };

        let data = self.client.download(blob_name).await?;
        tokio::fs::write(&path, &data).await?;

        tracing::debug!(
            "Downloaded {}/{} ({} bytes) to {}",
            self.name,
            blob_name,
            data.len(),
            path.display()
        );
        Ok(path)
    }

    /// Download a blob into memory, positioned at its start
    pub async fn download_bytes(&self, blob_name: &str) -> StorageResult<Cursor<Vec<u8>>> {
        let data = self.client.download(blob_name).await?;
        tracing::debug!("Downloaded {}/{} ({} bytes)", self.name, blob_name, data.len());
        Ok(Cursor::new(data.to_vec()))
    }

    /// Upload a blob from memory or from a local file
    ///
    /// See [`UploadRequest`] for the validation rules, all of which are checked
    /// before anything is sent.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidArguments`] for an invalid parameter combination
    /// - [`StorageError::UnsupportedPayloadType`] / [`StorageError::EncodingFailure`]
    ///   for structured payloads
    /// - [`StorageError::Io`] if the source file cannot be read
    /// - [`StorageError::BlobAlreadyExists`] when the blob exists and overwrite is off
    pub async fn upload_blob(&self, request: UploadRequest) -> StorageResult<UploadResult> {
        let prepared = request.prepare()?;

        let data = match prepared.source {
            UploadSource::Memory(payload) => payload.into_bytes(prepared.json_encode)?,
            UploadSource::File(path) => {
                tracing::debug!("Reading {} for upload", path.display());
                Bytes::from(tokio::fs::read(&path).await?)
            }
        };

        let result = self
            .client
            .upload(&prepared.blob_name, data, prepared.overwrite)
            .await?;

        tracing::info!(
            container = %self.name,
            blob = %result.blob_name,
            bytes = result.content_length,
            "Blob uploaded successfully"
        );
        Ok(result)
    }
}
