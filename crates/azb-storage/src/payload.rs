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

//! In-memory upload payloads

use crate::error::{StorageError, StorageResult};
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::io::Cursor;

/// A value that can be serialized to a UTF-8 JSON document
///
/// Implemented for every `Serialize + Send + Sync` type.
pub trait JsonEncodable: Send + Sync {
    /// Serialize to JSON bytes
    fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T> JsonEncodable for T
where
    T: Serialize + Send + Sync,
{
    fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Data to upload from memory
///
/// `Bytes`, `Text` and `Buffer` are uploaded as-is. `Encodable` values are only
/// uploaded when the request asks for JSON encoding.
pub enum Payload {
    /// Raw bytes
    Bytes(Bytes),
    /// UTF-8 text
    Text(String),
    /// Byte buffer; the bytes from the current position to the end are uploaded
    Buffer(Cursor<Vec<u8>>),
    /// Structured value that must be JSON-encoded before upload
    Encodable(Box<dyn JsonEncodable>),
}

impl Payload {
    /// Wrap a serializable value
    ///
    /// ```
    /// use azb_storage::Payload;
    /// use std::collections::HashMap;
    ///
    /// let payload = Payload::json(HashMap::from([("mytest", "json")]));
    /// assert_eq!(payload.kind(), "encodable");
    /// ```
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Payload::Encodable(Box::new(value))
    }

    /// Short name of the payload variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Bytes(_) => "bytes",
            Payload::Text(_) => "text",
            Payload::Buffer(_) => "buffer",
            Payload::Encodable(_) => "encodable",
        }
    }

    /// Whether there is nothing to upload
    ///
    /// An encodable value is never empty: even `null` encodes to four bytes.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Bytes(b) => b.is_empty(),
            Payload::Text(s) => s.is_empty(),
            Payload::Buffer(cursor) => remaining(cursor).is_empty(),
            Payload::Encodable(_) => false,
        }
    }

    /// Resolve the payload to the bytes that go over the wire
    ///
    /// # Errors
    ///
    /// - [`StorageError::UnsupportedPayloadType`] for an encodable value when
    ///   `json_encode` is false
    /// - [`StorageError::EncodingFailure`] when JSON serialization fails
    pub fn into_bytes(self, json_encode: bool) -> StorageResult<Bytes> {
        match self {
            Payload::Bytes(b) => Ok(b),
            Payload::Text(s) => Ok(Bytes::from(s)),
            Payload::Buffer(cursor) => {
                let start = cursor.position().min(cursor.get_ref().len() as u64) as usize;
                let mut data = cursor.into_inner();
                data.drain(..start);
                Ok(Bytes::from(data))
            }
            Payload::Encodable(value) if json_encode => {
                tracing::debug!("Encoding payload to JSON before upload");
                value
                    .to_json_bytes()
                    .map(Bytes::from)
                    .map_err(StorageError::EncodingFailure)
            }
            Payload::Encodable(_) => Err(StorageError::UnsupportedPayloadType(
                "payload must be bytes, text or a byte buffer unless JSON encoding is enabled"
                    .to_string(),
            )),
        }
    }
}

fn remaining(cursor: &Cursor<Vec<u8>>) -> &[u8] {
    let data = cursor.get_ref();
    let start = cursor.position().min(data.len() as u64) as usize;
    &data[start..]
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Payload::Text(s) => f.debug_tuple("Text").field(&s.len()).finish(),
            Payload::Buffer(c) => f.debug_tuple("Buffer").field(&remaining(c).len()).finish(),
            Payload::Encodable(_) => f.write_str("Encodable"),
        }
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Bytes(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(value))
    }
}

impl From<&'static [u8]> for Payload {
    fn from(value: &'static [u8]) -> Self {
        Payload::Bytes(Bytes::from_static(value))
    }
}

impl<const N: usize> From<&'static [u8; N]> for Payload {
    fn from(value: &'static [u8; N]) -> Self {
        Payload::Bytes(Bytes::from_static(value))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<Cursor<Vec<u8>>> for Payload {
    fn from(value: Cursor<Vec<u8>>) -> Self {
        Payload::Buffer(value)
    }
}
