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

//! Azure storage connection string parsing
//!
//! A connection string is a `;`-separated list of `Key=Value` fields:
//!
//! ```text
//! DefaultEndpointsProtocol=https;AccountName=myaccount;AccountKey=...;EndpointSuffix=core.windows.net
//! ```
//!
//! [`parse`] turns the raw text into a [`ConnectionString`] and checks that its key
//! layout matches one of the layouts the service accepts:
//!
//! - **Account key**: `DefaultEndpointsProtocol`, `AccountName`, `AccountKey` and
//!   `EndpointSuffix` are all present.
//! - **Shared access signature**: `SharedAccessSignature` is present.
//! - **Custom endpoint**: at least one of `BlobEndpoint`, `QueueEndpoint`,
//!   `FileEndpoint` or `TableEndpoint` is present.
//! - **Development storage**: `UseDevelopmentStorage=true` (Azurite).
//!
//! Values are split at the first `=`, so base64 keys with `==` padding and SAS tokens
//! (`sv=...&sig=...`) survive intact.
//!
//! # Examples
//!
//! ```
//! use azb_storage::connection_string::{self, ConnectionStringKind};
//!
//! let parsed = connection_string::parse(
//!     "DefaultEndpointsProtocol=https;AccountName=myaccount;AccountKey=a2V5==;EndpointSuffix=core.windows.net",
//! )?;
//!
//! assert_eq!(parsed.kind(), ConnectionStringKind::AccountKey);
//! assert_eq!(connection_string::extract_account_name(&parsed)?, "myaccount");
//! assert_eq!(
//!     parsed.blob_endpoint().as_deref(),
//!     Some("https://myaccount.blob.core.windows.net")
//! );
//! # Ok::<(), azb_storage::StorageError>(())
//! ```

use crate::error::{StorageError, StorageResult};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Fields that must all be present for the account-key layout
pub const ACCOUNT_KEY_FIELDS: [&str; 4] = [
    "DefaultEndpointsProtocol",
    "AccountName",
    "AccountKey",
    "EndpointSuffix",
];

/// Per-service endpoint overrides
pub const ENDPOINT_FIELDS: [&str; 4] = [
    "BlobEndpoint",
    "QueueEndpoint",
    "FileEndpoint",
    "TableEndpoint",
];

/// Account name used by the Azurite emulator
pub const DEVELOPMENT_ACCOUNT_NAME: &str = "devstoreaccount1";

/// Well-known account key of the Azurite emulator
pub const DEVELOPMENT_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Default blob service address of the Azurite emulator
pub const DEVELOPMENT_BLOB_URI: &str = "http://127.0.0.1:10000";

const KNOWN_ENDPOINT_SUFFIXES: &[&str] = &[
    "core.windows.net",
    "core.usgovcloudapi.net",
    "core.chinacloudapi.cn",
];

/// Fields outside both canonical groups that a layout may carry
const AUXILIARY_FIELDS: [&str; 3] = [
    "SharedAccessSignature",
    "UseDevelopmentStorage",
    "DevelopmentStorageProxyUri",
];

const SECRET_FIELDS: [&str; 2] = ["AccountKey", "SharedAccessSignature"];

/// Recognized connection string layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStringKind {
    /// All four canonical account-key fields are present
    AccountKey,
    /// Authenticates with a `SharedAccessSignature` token
    SharedAccessSignature,
    /// Addresses the service through explicit `*Endpoint` fields
    CustomEndpoint,
    /// `UseDevelopmentStorage=true`, i.e. the local Azurite emulator
    DevelopmentStorage,
}

/// Credential carried by a connection string
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Shared key authentication
    AccountKey {
        /// Storage account name
        account_name: String,
        /// Base64 account key
        account_key: String,
    },
    /// SAS token authentication, without the leading `?`
    SharedAccessSignature(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::AccountKey { account_name, .. } => f
                .debug_struct("AccountKey")
                .field("account_name", account_name)
                .field("account_key", &"<redacted>")
                .finish(),
            Credential::SharedAccessSignature(_) => {
                f.debug_tuple("SharedAccessSignature").field(&"<redacted>").finish()
            }
        }
    }
}

/// A parsed and validated connection string
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    fields: HashMap<String, String>,
    kind: ConnectionStringKind,
}

/// Parse a raw connection string and validate its key layout
///
/// # Errors
///
/// Returns [`StorageError::MalformedConnectionString`] if:
/// - a non-empty segment has no `=` or an empty key
/// - a key appears more than once
/// - a key is not one of the recognized connection string fields
/// - `DefaultEndpointsProtocol` is neither `http` nor `https`
/// - the key set matches none of the recognized layouts
pub fn parse(raw: &str) -> StorageResult<ConnectionString> {
    let fields = split_fields(raw)?;

    let mut unknown: Vec<&str> = fields
        .keys()
        .map(String::as_str)
        .filter(|key| !is_known_field(key))
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        return Err(StorageError::malformed(format!(
            "unrecognized field(s): {}",
            unknown.join(", ")
        )));
    }

    if let Some(protocol) = fields.get("DefaultEndpointsProtocol") {
        if protocol != "http" && protocol != "https" {
            return Err(StorageError::malformed(format!(
                "invalid DefaultEndpointsProtocol: {}",
                protocol
            )));
        }
    }

    let kind = classify(&fields).ok_or_else(|| {
        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        StorageError::malformed(format!(
            "unrecognized key layout [{}]; expected {} or SharedAccessSignature or an *Endpoint key",
            keys.join(", "),
            ACCOUNT_KEY_FIELDS.join("+")
        ))
    })?;

    Ok(ConnectionString { fields, kind })
}

/// Return the `AccountName` field of a parsed connection string
///
/// # Errors
///
/// Returns [`StorageError::MissingField`] when `AccountName` is absent, which is the
/// case for SAS-only connection strings.
pub fn extract_account_name(parsed: &ConnectionString) -> StorageResult<&str> {
    parsed
        .get("AccountName")
        .ok_or_else(|| StorageError::missing_field("AccountName"))
}

fn split_fields(raw: &str) -> StorageResult<HashMap<String, String>> {
    let mut fields = HashMap::new();

    for segment in raw.trim().replace(['\n', '\r'], "").split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let (key, value) = segment.split_once('=').ok_or_else(|| {
            StorageError::malformed(format!("expected '=' in field '{}'", redact_segment(segment)))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(StorageError::malformed("field with empty key"));
        }

        if fields
            .insert(key.to_string(), value.trim().to_string())
            .is_some()
        {
            return Err(StorageError::malformed(format!("duplicate key '{}'", key)));
        }
    }

    if fields.is_empty() {
        return Err(StorageError::malformed("connection string is empty"));
    }

    Ok(fields)
}

fn is_known_field(key: &str) -> bool {
    ACCOUNT_KEY_FIELDS
        .iter()
        .chain(ENDPOINT_FIELDS.iter())
        .chain(AUXILIARY_FIELDS.iter())
        .any(|known| *known == key)
}

fn classify(fields: &HashMap<String, String>) -> Option<ConnectionStringKind> {
    if fields
        .get("UseDevelopmentStorage")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        Some(ConnectionStringKind::DevelopmentStorage)
    } else if ACCOUNT_KEY_FIELDS.iter().all(|k| fields.contains_key(*k)) {
        Some(ConnectionStringKind::AccountKey)
    } else if fields.contains_key("SharedAccessSignature") {
        Some(ConnectionStringKind::SharedAccessSignature)
    } else if ENDPOINT_FIELDS.iter().any(|k| fields.contains_key(*k)) {
        Some(ConnectionStringKind::CustomEndpoint)
    } else {
        None
    }
}

// Malformed segments may be a secret pasted without its key.
fn redact_segment(segment: &str) -> String {
    if segment.len() > 16 {
        format!("{}...", segment.chars().take(8).collect::<String>())
    } else {
        segment.to_string()
    }
}

/// Derive the account name from a `https://<account>.blob.<suffix>` endpoint
fn account_name_from_endpoint(endpoint: &str) -> Option<String> {
    let host = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"))
        .unwrap_or(endpoint);

    let (account_name, service_endpoint) = host.split_once('.')?;
    let (_service, endpoint_suffix) = service_endpoint.split_once('.')?;

    if KNOWN_ENDPOINT_SUFFIXES.contains(&endpoint_suffix.trim_end_matches('/')) {
        Some(account_name.to_string())
    } else {
        None
    }
}

impl ConnectionString {
    /// Parse and validate a raw connection string; see [`parse`]
    pub fn parse(raw: &str) -> StorageResult<Self> {
        parse(raw)
    }

    /// Layout this connection string was recognized as
    pub fn kind(&self) -> ConnectionStringKind {
        self.kind
    }

    /// Value of a field, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Whether a field is present
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false for a successfully parsed connection string
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Storage account name
    ///
    /// Uses `AccountName` when present, then the emulator default for development
    /// storage, then the account encoded in a `BlobEndpoint` on a public cloud suffix.
    pub fn account_name(&self) -> StorageResult<String> {
        if let Some(name) = self.get("AccountName") {
            return Ok(name.to_string());
        }
        if self.kind == ConnectionStringKind::DevelopmentStorage {
            return Ok(DEVELOPMENT_ACCOUNT_NAME.to_string());
        }
        self.get("BlobEndpoint")
            .and_then(account_name_from_endpoint)
            .ok_or_else(|| StorageError::missing_field("AccountName"))
    }

    /// Credential to open a client with
    ///
    /// An account key wins over a SAS token when both are present, since only the key
    /// can sign new SAS tokens.
    pub fn credential(&self) -> StorageResult<Credential> {
        if self.kind == ConnectionStringKind::DevelopmentStorage {
            return Ok(Credential::AccountKey {
                account_name: self.account_name()?,
                account_key: self
                    .get("AccountKey")
                    .unwrap_or(DEVELOPMENT_ACCOUNT_KEY)
                    .to_string(),
            });
        }

        if let Some(account_key) = self.get("AccountKey") {
            return Ok(Credential::AccountKey {
                account_name: self.account_name()?,
                account_key: account_key.to_string(),
            });
        }

        self.get("SharedAccessSignature")
            .map(|sas| Credential::SharedAccessSignature(sas.trim_start_matches('?').to_string()))
            .ok_or_else(|| StorageError::missing_field("AccountKey"))
    }

    /// Blob service endpoint, without a trailing slash
    ///
    /// Explicit `BlobEndpoint` first, then the emulator address, then
    /// `{protocol}://{account}.blob.{suffix}` built from the account-key fields.
    pub fn blob_endpoint(&self) -> Option<String> {
        if let Some(endpoint) = self.get("BlobEndpoint") {
            return Some(endpoint.trim_end_matches('/').to_string());
        }

        if self.kind == ConnectionStringKind::DevelopmentStorage {
            let proxy = self
                .get("DevelopmentStorageProxyUri")
                .unwrap_or(DEVELOPMENT_BLOB_URI)
                .trim_end_matches('/');
            let account = self.get("AccountName").unwrap_or(DEVELOPMENT_ACCOUNT_NAME);
            return Some(format!("{}/{}", proxy, account));
        }

        let account = self.get("AccountName")?;
        let suffix = self.get("EndpointSuffix")?;
        let protocol = self.get("DefaultEndpointsProtocol").unwrap_or("https");
        Some(format!("{}://{}.blob.{}", protocol, account, suffix))
    }
}

impl FromStr for ConnectionString {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.fields.keys().collect();
        keys.sort();

        let mut map = f.debug_map();
        for key in keys {
            if SECRET_FIELDS.contains(&key.as_str()) {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, &self.fields[key]);
            }
        }
        map.finish()
    }
}
