//! Path-addressed Vault backend protocol.
//!
//! Everything that talks to Vault goes through the [`VaultBackend`] trait: five
//! verbs over a slash-delimited path namespace, each returning the raw response
//! payload or a typed [`Error`](crate::errors::Error).
//!
//! # Implementations
//!
//! - [`HttpBackend`]: authenticated HTTPS requests against a real Vault server
//! - [`MemoryBackend`]: in-memory fake with directory-style `LIST` emulation,
//!   for tests
//!
//! # Example
//!
//! ```rust,ignore
//! use vault_client::backend::{MemoryBackend, VaultBackend};
//!
//! let backend = MemoryBackend::new();
//! backend.put("secret/app/db", Some(br#"{"password":"hunter2"}"#)).await?;
//!
//! let response = backend.read("secret/app/db").await?;
//! assert_eq!(response.data.unwrap()["password"], "hunter2");
//!
//! let keys = backend.list_keys("secret/app").await?;
//! assert_eq!(keys, vec!["db".to_string()]);
//! ```

pub mod http;
pub mod memory;

pub use http::{HttpBackend, HttpBackendConfig};
pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::{Error, Result};

/// Request verbs understood by Vault.
///
/// `LIST` is not a standard HTTP method; Vault accepts it as a custom token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    List,
    Delete,
    Post,
    Put,
}

impl Method {
    /// Wire representation of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::List => "LIST",
            Self::Delete => "DELETE",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }

    /// Whether requests with this verb carry a JSON body.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The standard Vault response envelope.
///
/// `data` is kept as a generic JSON value; callers decode it into a typed
/// structure at the point of use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultResponse {
    #[serde(default)]
    pub auth: Option<Value>,

    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub lease_duration: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub lease_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub renewable: bool,
}

impl VaultResponse {
    /// Decode an envelope from raw response bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
struct ListData {
    keys: Vec<String>,
}

/// Parse an optional request body into a generic JSON value.
///
/// `None` means the request has no body. Anything that is not a JSON document
/// fails with [`Error::Decode`], so no request is built from it.
pub fn parse_request_body(body: Option<&[u8]>) -> Result<Option<Value>> {
    match body {
        Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
        None => Ok(None),
    }
}

/// Uniform verb dispatch over a Vault path namespace.
///
/// Implementations are `Send + Sync` so a backend can be shared between
/// concurrent, independent operations. Each call is a single request/response
/// round trip; nothing is retried.
#[async_trait]
pub trait VaultBackend: Send + Sync + fmt::Debug {
    /// Read the resource at `path`.
    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// List the children of the collection at `path`.
    async fn list(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete the resource at `path`. The payload is conventionally empty.
    async fn delete(&self, path: &str) -> Result<Vec<u8>>;

    /// Send `body` (a JSON document) to `path` with `POST`.
    async fn post(&self, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>>;

    /// Send `body` (a JSON document) to `path` with `PUT`.
    async fn put(&self, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>>;

    /// GET `path` and decode the response envelope.
    async fn read(&self, path: &str) -> Result<VaultResponse> {
        let bytes = self.get(path).await?;
        VaultResponse::from_slice(&bytes)
    }

    /// LIST `path` and return the `data.keys` entries.
    ///
    /// Sub-collections keep their trailing `/`.
    async fn list_keys(&self, path: &str) -> Result<Vec<String>> {
        let bytes = self.list(path).await?;
        let response = VaultResponse::from_slice(&bytes)?;
        let data = response.data.unwrap_or(Value::Null);
        let list: ListData = serde_json::from_value(data)?;
        Ok(list.keys)
    }

    /// Whether `path` exists. A 404 is `false`; any other error propagates.
    async fn exists(&self, path: &str) -> Result<bool> {
        match self.get(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Strip a single trailing slash from a request path.
pub(crate) fn normalize_path(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}
