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

//! Storage error types and utilities

use std::io;
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while parsing credentials or talking to blob storage
#[derive(Error, Debug)]
pub enum StorageError {
    /// The connection string has a malformed field or an unrecognized key layout
    #[error("malformed connection string: {0}")]
    MalformedConnectionString(String),

    /// A field required by the caller is absent from the connection string
    #[error("missing connection string field: {0}")]
    MissingField(String),

    /// Upload or URL parameters were combined incorrectly
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The payload kind cannot be uploaded without JSON encoding
    #[error("unsupported payload type: {0}")]
    UnsupportedPayloadType(String),

    /// The payload could not be serialized to JSON
    #[error("failed to encode payload as JSON: {0}")]
    EncodingFailure(#[source] serde_json::Error),

    /// Blob does not exist in the container
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    /// Blob exists and overwrite was not requested
    #[error("blob already exists: {0}")]
    BlobAlreadyExists(String),

    /// Container is not managed by the account manager
    #[error("unknown container: {0}")]
    UnknownContainer(String),

    /// Permission denied for the requested operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Local filesystem error during download or upload-from-file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage service or client failure not covered by another variant
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Transparent error delegation for wrapped error types
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StorageError {
    /// Create a MalformedConnectionString error with context
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        StorageError::MalformedConnectionString(msg.into())
    }

    /// Create a MissingField error for the named field
    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        StorageError::MissingField(field.into())
    }

    /// Create an InvalidArguments error with context
    pub fn invalid_arguments<S: Into<String>>(msg: S) -> Self {
        StorageError::InvalidArguments(msg.into())
    }

    /// Create a BlobNotFound error for the given blob
    pub fn blob_not_found<S: Into<String>>(name: S) -> Self {
        StorageError::BlobNotFound(name.into())
    }

    /// Create a BlobAlreadyExists error for the given blob
    pub fn blob_already_exists<S: Into<String>>(name: S) -> Self {
        StorageError::BlobAlreadyExists(name.into())
    }

    /// Create an UnknownContainer error for the given container
    pub fn unknown_container<S: Into<String>>(name: S) -> Self {
        StorageError::UnknownContainer(name.into())
    }

    /// Create a PermissionDenied error with context
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        StorageError::PermissionDenied(msg.into())
    }

    /// Create a Backend error with context
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        StorageError::Backend(msg.into())
    }

    /// Check if this is a MalformedConnectionString error
    pub fn is_malformed_connection_string(&self) -> bool {
        matches!(self, StorageError::MalformedConnectionString(_))
    }

    /// Check if this is a MissingField error
    pub fn is_missing_field(&self) -> bool {
        matches!(self, StorageError::MissingField(_))
    }

    /// Check if this is an InvalidArguments error
    pub fn is_invalid_arguments(&self) -> bool {
        matches!(self, StorageError::InvalidArguments(_))
    }

    /// Check if this is a BlobNotFound error
    pub fn is_blob_not_found(&self) -> bool {
        matches!(self, StorageError::BlobNotFound(_))
    }

    /// Check if this is a BlobAlreadyExists error
    pub fn is_blob_already_exists(&self) -> bool {
        matches!(self, StorageError::BlobAlreadyExists(_))
    }

    /// Check if this is an UnknownContainer error
    pub fn is_unknown_container(&self) -> bool {
        matches!(self, StorageError::UnknownContainer(_))
    }
}
