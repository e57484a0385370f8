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

//! Storage-account scoped manager
//!
//! [`StorageAccountManager`] owns one [`ContainerManager`] per container of interest.
//! The containers come from [`StorageSettings::containers`]; when that list is empty
//! every container in the account is discovered at construction time.

use crate::connection_string::ConnectionString;
use crate::container::ContainerManager;
use crate::error::{StorageError, StorageResult};
use crate::upload::UploadRequest;
use crate::{AccountClient, ContainerSummary, UploadResult};
use azb_config::StorageSettings;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Manager for a storage account and a fixed set of its containers
pub struct StorageAccountManager {
    client: Arc<dyn AccountClient>,
    account_name: String,
    containers: BTreeMap<String, ContainerManager>,
    download_dir: PathBuf,
}

impl fmt::Debug for StorageAccountManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAccountManager")
            .field("account_name", &self.account_name)
            .field("containers", &self.containers.keys().collect::<Vec<_>>())
            .field("download_dir", &self.download_dir)
            .finish()
    }
}

impl StorageAccountManager {
    /// Build a manager over an already opened account client
    ///
    /// Parses `settings.connection_string` to determine the account name, then creates
    /// one container manager per configured container, or per discovered container if
    /// none are configured.
    ///
    /// # Errors
    ///
    /// - [`StorageError::MalformedConnectionString`] if the connection string is invalid
    /// - [`StorageError::MissingField`] if no account name can be determined
    /// - any error from container discovery
    pub async fn new(
        client: Arc<dyn AccountClient>,
        settings: &StorageSettings,
    ) -> StorageResult<Self> {
        let connection_string = ConnectionString::parse(settings.connection_string())?;
        Self::build(client, &connection_string, settings).await
    }

    /// Open the Azure SDK client from the connection string and build a manager
    ///
    /// ```rust,no_run
    /// use azb_config::ConfigLoader;
    /// use azb_storage::StorageAccountManager;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let settings = ConfigLoader::new().from_env()?;
    ///     let manager = StorageAccountManager::connect(&settings.storage).await?;
    ///     println!("managing {:?}", manager.container_names());
    ///     Ok(())
    /// }
    /// ```
    #[cfg(feature = "azure")]
    pub async fn connect(settings: &StorageSettings) -> StorageResult<Self> {
        let connection_string = ConnectionString::parse(settings.connection_string())?;
        let client = crate::azure::AzureAccountClient::from_connection_string(&connection_string)?;
        Self::build(Arc::new(client), &connection_string, settings).await
    }

    async fn build(
        client: Arc<dyn AccountClient>,
        connection_string: &ConnectionString,
        settings: &StorageSettings,
    ) -> StorageResult<Self> {
        let account_name = connection_string.account_name()?;
        let download_dir = settings.download_dir().to_path_buf();

        let container_names: Vec<String> = if settings.containers().is_empty() {
            let discovered = client.list_containers(false).await?;
            tracing::info!(
                "Discovered {} containers in storage account {}",
                discovered.len(),
                account_name
            );
            discovered.into_iter().map(|c| c.name).collect()
        } else {
            settings.containers().to_vec()
        };

        let containers = container_names
            .into_iter()
            .map(|name| {
                let manager =
                    ContainerManager::new(client.container_client(&name), download_dir.clone());
                (name, manager)
            })
            .collect::<BTreeMap<_, _>>();

        tracing::info!(
            "Created storage account manager for {} with {} containers",
            account_name,
            containers.len()
        );

        Ok(StorageAccountManager {
            client,
            account_name,
            containers,
            download_dir,
        })
    }

    /// Storage account name
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Download directory handed to every container manager
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Underlying account client
    pub fn client(&self) -> &Arc<dyn AccountClient> {
        &self.client
    }

    /// Names of the managed containers, sorted
    pub fn container_names(&self) -> Vec<&str> {
        self.containers.keys().map(String::as_str).collect()
    }

    /// Iterate over the managed containers in name order
    pub fn containers(&self) -> impl Iterator<Item = &ContainerManager> {
        self.containers.values()
    }

    /// Manager of a named container
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownContainer`] if the container is not managed.
    pub fn container(&self, container_name: &str) -> StorageResult<&ContainerManager> {
        self.containers
            .get(container_name)
            .ok_or_else(|| StorageError::unknown_container(container_name))
    }

    /// Mutable manager of a named container, e.g. to change its download directory
    pub fn container_mut(&mut self, container_name: &str) -> StorageResult<&mut ContainerManager> {
        self.containers
            .get_mut(container_name)
            .ok_or_else(|| StorageError::unknown_container(container_name))
    }

    /// List the account's containers, optionally with metadata
    pub async fn list_containers(
        &self,
        include_metadata: bool,
    ) -> StorageResult<Vec<ContainerSummary>> {
        let mut containers = self.client.list_containers(include_metadata).await?;
        if !include_metadata {
            for container in &mut containers {
                container.metadata = None;
            }
        }
        containers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(containers)
    }

    /// Forward an upload to the named container
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownContainer`] if the container is not managed, or
    /// any error of [`ContainerManager::upload_blob`].
    pub async fn upload_blob(
        &self,
        container_name: &str,
        request: UploadRequest,
    ) -> StorageResult<UploadResult> {
        self.container(container_name)?.upload_blob(request).await
    }
}
