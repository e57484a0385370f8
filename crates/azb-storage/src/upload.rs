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

//! Upload request building and validation
//!
//! An upload takes its data from exactly one source: an in-memory [`Payload`] or a
//! local file. Validation runs before any network call, in this order:
//!
//! 1. exactly one of payload and source path is supplied (empty values count as absent)
//! 2. an in-memory payload comes with a blob name
//! 3. every supplied name (blob name, source path) has a non-empty file extension
//!
//! ```
//! use azb_storage::UploadRequest;
//!
//! let request = UploadRequest::from_file("uploads/mock.csv").overwrite(true);
//! assert_eq!(request.validate()?, "mock.csv");
//!
//! let missing_name = UploadRequest::from_payload(b"data");
//! assert!(missing_name.validate().unwrap_err().is_invalid_arguments());
//! # Ok::<(), azb_storage::StorageError>(())
//! ```

use crate::error::{StorageError, StorageResult};
use crate::payload::Payload;
use std::path::{Path, PathBuf};

/// Bundle of upload parameters
#[derive(Debug, Default)]
pub struct UploadRequest {
    payload: Option<Payload>,
    source_path: Option<PathBuf>,
    blob_name: Option<String>,
    overwrite: bool,
    json_encode: bool,
}

/// Where the bytes of a validated upload come from
#[derive(Debug)]
pub(crate) enum UploadSource {
    Memory(Payload),
    File(PathBuf),
}

/// A request that passed validation
#[derive(Debug)]
pub(crate) struct PreparedUpload {
    pub blob_name: String,
    pub source: UploadSource,
    pub overwrite: bool,
    pub json_encode: bool,
}

impl UploadRequest {
    /// Empty request; fails validation until a payload or source path is set
    pub fn new() -> Self {
        Self::default()
    }

    /// Request uploading an in-memory payload
    pub fn from_payload(payload: impl Into<Payload>) -> Self {
        Self::new().payload(payload)
    }

    /// Request uploading a local file
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new().source_path(path)
    }

    /// Set the in-memory payload
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Set the local source file
    pub fn source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Set the destination blob name
    pub fn blob_name(mut self, name: impl Into<String>) -> Self {
        self.blob_name = Some(name.into());
        self
    }

    /// Replace an existing blob of the same name
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// JSON-encode payloads that are not bytes, text or a buffer
    pub fn json_encode(mut self, json_encode: bool) -> Self {
        self.json_encode = json_encode;
        self
    }

    /// Whether overwrite is requested
    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Whether JSON encoding is requested
    pub fn is_json_encode(&self) -> bool {
        self.json_encode
    }

    fn supplied_payload(&self) -> Option<&Payload> {
        self.payload.as_ref().filter(|p| !p.is_empty())
    }

    fn supplied_path(&self) -> Option<&Path> {
        self.source_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    fn supplied_blob_name(&self) -> Option<&str> {
        self.blob_name.as_deref().filter(|n| !n.is_empty())
    }

    /// Validate the parameter combination and return the destination blob name
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArguments`] when the request breaks one of the
    /// rules listed in the module documentation.
    pub fn validate(&self) -> StorageResult<String> {
        let payload = self.supplied_payload();
        let path = self.supplied_path();

        if payload.is_some() == path.is_some() {
            return Err(StorageError::invalid_arguments(
                "specify exactly one of file path or data",
            ));
        }

        let blob_name = self.supplied_blob_name();
        if payload.is_some() && blob_name.is_none() {
            return Err(StorageError::invalid_arguments(
                "blob_name required for in-memory upload",
            ));
        }

        if let Some(name) = blob_name {
            if !has_extension(Path::new(base_name(name))) {
                return Err(missing_extension(name));
            }
        }

        if let Some(path) = path {
            if !has_extension(path) {
                return Err(missing_extension(&path.display().to_string()));
            }
        }

        match (blob_name, path) {
            (Some(name), _) => Ok(name.to_string()),
            (None, Some(path)) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| missing_extension(&path.display().to_string())),
            (None, None) => Err(StorageError::invalid_arguments(
                "specify exactly one of file path or data",
            )),
        }
    }

    /// Validate and split the request into its upload parts
    pub(crate) fn prepare(self) -> StorageResult<PreparedUpload> {
        let blob_name = self.validate()?;

        let source = match (self.payload.filter(|p| !p.is_empty()), self.source_path) {
            (Some(payload), _) => UploadSource::Memory(payload),
            (None, Some(path)) => UploadSource::File(path),
            (None, None) => {
                return Err(StorageError::invalid_arguments(
                    "specify exactly one of file path or data",
                ))
            }
        };

        Ok(PreparedUpload {
            blob_name,
            source,
            overwrite: self.overwrite,
            json_encode: self.json_encode,
        })
    }
}

/// Final `/`-separated component of a blob name
pub(crate) fn base_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn has_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| !ext.is_empty())
}

fn missing_extension(name: &str) -> StorageError {
    StorageError::invalid_arguments(format!("missing file extension: '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neither_source_supplied() {
        let err = UploadRequest::new().blob_name("a.txt").validate().unwrap_err();
        assert!(err.is_invalid_arguments());
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn test_both_sources_supplied() {
        let err = UploadRequest::from_payload(b"data")
            .source_path("file.txt")
            .blob_name("file.txt")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn test_empty_payload_counts_as_absent() {
        let err = UploadRequest::from_payload("").blob_name("a.txt").validate().unwrap_err();
        assert!(err.to_string().contains("exactly one"));

        let ok = UploadRequest::from_payload("")
            .source_path("a.txt")
            .validate()
            .unwrap();
        assert_eq!(ok, "a.txt");
    }

    #[test]
    fn test_payload_requires_blob_name() {
        let err = UploadRequest::from_payload(b"data").validate().unwrap_err();
        assert!(err.to_string().contains("blob_name required"));

        let err = UploadRequest::from_payload(b"data").blob_name("").validate().unwrap_err();
        assert!(err.to_string().contains("blob_name required"));
    }

    #[test]
    fn test_blob_name_requires_extension() {
        for name in ["noext", "file.", ".bashrc", "dir.d/noext"] {
            let err = UploadRequest::from_payload(b"data")
                .blob_name(name)
                .validate()
                .unwrap_err();
            assert!(err.to_string().contains("missing file extension"), "{}", name);
        }
    }

    #[test]
    fn test_source_path_requires_extension() {
        let err = UploadRequest::from_file("uploads/README").validate().unwrap_err();
        assert!(err.to_string().contains("missing file extension"));
    }

    #[test]
    fn test_custom_name_for_file_still_checks_both() {
        let err = UploadRequest::from_file("uploads/mock.json")
            .blob_name("mock_json_custom_name")
            .validate()
            .unwrap_err();
        assert!(err.is_invalid_arguments());

        let name = UploadRequest::from_file("uploads/mock.json")
            .blob_name("mock_json_custom_name.csv")
            .validate()
            .unwrap();
        assert_eq!(name, "mock_json_custom_name.csv");
    }

    #[test]
    fn test_file_defaults_to_base_name() {
        let name = UploadRequest::from_file("uploads/nested/mock.csv").validate().unwrap();
        assert_eq!(name, "mock.csv");
    }

    #[test]
    fn test_nested_blob_name_is_kept() {
        let name = UploadRequest::from_payload(b"x")
            .blob_name("reports/2024/summary.json")
            .validate()
            .unwrap();
        assert_eq!(name, "reports/2024/summary.json");
    }

    #[test]
    fn test_prepare_carries_flags() {
        let prepared = UploadRequest::from_payload("text")
            .blob_name("a.txt")
            .overwrite(true)
            .json_encode(true)
            .prepare()
            .unwrap();
        assert!(prepared.overwrite);
        assert!(prepared.json_encode);
        assert!(matches!(prepared.source, UploadSource::Memory(Payload::Text(_))));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("a/b/c.txt"), "c.txt");
        assert_eq!(base_name("c.txt"), "c.txt");
    }
}
